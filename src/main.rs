/*
 * Copyright 2025 Michael Krolikowski
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

mod cluster;
mod image;
mod log;
mod scan;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use cluster::KubeCluster;
use scan::Scan;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[clap(default_value = "config.yaml")]
    config_file: String,
    /// Only look in this namespace
    #[clap(long, env = "NAMESPACE")]
    namespace: Option<String>,
    /// Kubeconfig to use when not running inside a cluster
    #[clap(long)]
    kubeconfig: Option<PathBuf>,
    /// Enable debug logging
    #[clap(long)]
    debug: bool,
    /// Print findings as JSON to stdout
    #[clap(long)]
    json: bool,
    /// Print a completion script for the given shell and exit
    #[clap(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let settings = Settings::read(&self.config_file)?;
        Ok(Settings {
            namespace: self.namespace.clone().or(settings.namespace),
            kubeconfig: self.kubeconfig.clone().or(settings.kubeconfig),
            ..settings
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(shell) = cli.completions {
        generate(
            shell,
            &mut Cli::command(),
            env!("CARGO_PKG_NAME"),
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    log::init(cli.debug)?;
    let settings = cli.settings()?;
    let cluster = KubeCluster::connect(settings.kubeconfig.as_deref())
        .await
        .context("Unable to get Kubernetes client")?;
    let findings = Scan::new(settings, cluster).scan().await?;
    scan::report(&findings);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::Cli;
    use clap::{CommandFactory, Parser};
    use clap_complete::{Shell, generate};

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let cli = Cli::parse_from([
            "k8s-version-checker",
            "does-not-exist.yaml",
            "--namespace",
            "apps",
            "--kubeconfig",
            "/etc/kube/config",
        ]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.namespace.as_deref(), Some("apps"));
        assert_eq!(
            settings.kubeconfig.as_deref(),
            Some(std::path::Path::new("/etc/kube/config"))
        );
    }

    #[test]
    fn completions() {
        let mut buffer = Vec::new();
        generate(Shell::Bash, &mut Cli::command(), "k8s-version-checker", &mut buffer);
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("--kubeconfig"));
    }
}
