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

use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Ignore {
    pub namespace: String,
    #[serde(alias = "deployment")]
    pub name: String,
}

impl Ignore {
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    #[serde(default = "Vec::new")]
    pub ignore: Vec<Ignore>,
}

impl Settings {
    pub fn read(filename: &str) -> Result<Settings> {
        let config = Config::builder()
            .add_source(
                File::with_name(filename)
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(Environment::with_prefix("KVC"))
            .build()?;
        let settings = config.try_deserialize()?;
        Ok(settings)
    }

    pub fn is_ignored(&self, namespace: &str, name: &str) -> bool {
        self.ignore.iter().any(|i| i.matches(namespace, name))
    }
}
