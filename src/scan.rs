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

use crate::{
    cluster::Cluster,
    image::{ImageDefinition, ImageReference, parse_version},
    settings::Settings,
};
use anyhow::Result;
use k8s_openapi::{
    Metadata,
    api::{
        apps::v1::{DaemonSet, Deployment, StatefulSet},
        batch::v1::CronJob,
        core::v1::{Pod, PodSpec},
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use log::{debug, info, warn};
use serde::Serialize;

pub const IGNORE_ANNOTATION: &str = "growse.com/k8s-version-checker-ignore";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub container: String,
    pub image: String,
    pub reference: ImageReference,
    pub tag: Option<String>,
    pub digest: Option<String>,
    pub version: Option<String>,
    pub versioned: bool,
}

impl Finding {
    fn new(kind: &str, namespace: &str, name: &str, container: &str, image: &str) -> Finding {
        let definition = ImageDefinition::parse(image);
        Finding {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            container: container.to_string(),
            image: image.to_string(),
            reference: definition.reference(),
            version: definition
                .tag
                .as_deref()
                .and_then(parse_version)
                .map(|v| v.to_string()),
            versioned: definition.tag_is_versioned(),
            tag: definition.tag,
            digest: definition.digest,
        }
    }

    /// Neither a versioned tag nor a digest keeps the image from changing.
    pub fn is_floating(&self) -> bool {
        !self.versioned && self.digest.is_none()
    }
}

/// Workloads carrying a pod template.
pub trait PodTemplate {
    fn pod_spec(&self) -> Option<&PodSpec>;
}

impl PodTemplate for Deployment {
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodTemplate for DaemonSet {
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodTemplate for StatefulSet {
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref().and_then(|s| s.template.spec.as_ref())
    }
}

impl PodTemplate for CronJob {
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec
            .as_ref()
            .and_then(|s| s.job_template.spec.as_ref())
            .and_then(|s| s.template.spec.as_ref())
    }
}

impl PodTemplate for Pod {
    fn pod_spec(&self) -> Option<&PodSpec> {
        self.spec.as_ref()
    }
}

pub trait WorkloadInfo {
    fn kind(&self) -> &'static str;
    fn namespace(&self) -> Option<String>;
    fn name(&self) -> Option<String>;
    fn is_top_level(&self) -> bool;
    fn is_annotated_ignore(&self) -> bool;
    fn images(&self) -> Vec<(String, String)>;
}

impl<W> WorkloadInfo for W
where
    W: Metadata<Ty = ObjectMeta> + PodTemplate,
{
    fn kind(&self) -> &'static str {
        <W as k8s_openapi::Resource>::KIND
    }

    fn namespace(&self) -> Option<String> {
        self.metadata().namespace.clone()
    }

    fn name(&self) -> Option<String> {
        self.metadata().name.clone()
    }

    fn is_top_level(&self) -> bool {
        self.metadata()
            .owner_references
            .as_ref()
            .is_none_or(|owners| owners.is_empty())
    }

    /// Any non-empty value ignores the workload.
    fn is_annotated_ignore(&self) -> bool {
        self.metadata()
            .annotations
            .as_ref()
            .and_then(|a| a.get(IGNORE_ANNOTATION))
            .is_some_and(|v| !v.is_empty())
    }

    fn images(&self) -> Vec<(String, String)> {
        let Some(pod_spec) = self.pod_spec() else {
            return Vec::new();
        };
        pod_spec
            .init_containers
            .iter()
            .flatten()
            .chain(pod_spec.containers.iter())
            .filter_map(|c| {
                c.image
                    .as_ref()
                    .map(|image| (c.name.clone(), image.clone()))
            })
            .collect()
    }
}

pub struct Scan<C: Cluster> {
    settings: Settings,
    cluster: C,
}

impl<C: Cluster> Scan<C> {
    pub fn new(settings: Settings, cluster: C) -> Scan<C> {
        Scan { settings, cluster }
    }

    fn considered<W: WorkloadInfo>(&self, namespace: &str, name: &str, workload: &W) -> bool {
        let kind = workload.kind();
        if !workload.is_top_level() {
            debug!("Skipping {kind} {namespace}/{name}: owned by another resource.");
            false
        } else if workload.is_annotated_ignore() || self.settings.is_ignored(namespace, name) {
            info!("Ignoring {kind} {namespace}/{name}.");
            false
        } else {
            true
        }
    }

    fn collect<W: WorkloadInfo>(&self, workloads: &[W], findings: &mut Vec<Finding>) {
        for workload in workloads {
            let (Some(namespace), Some(name)) = (workload.namespace(), workload.name()) else {
                continue;
            };
            if !self.considered(&namespace, &name, workload) {
                continue;
            }
            let kind = workload.kind();
            let images = workload.images();
            info!(
                "Considering {kind} {namespace}/{name} ({} containers).",
                images.len()
            );
            for (container, image) in images {
                findings.push(Finding::new(kind, &namespace, &name, &container, &image));
            }
        }
    }

    pub async fn scan(&self) -> Result<Vec<Finding>> {
        let namespace = self.settings.namespace.as_deref();
        let mut findings = Vec::new();
        self.collect(&self.cluster.deployments(namespace).await?, &mut findings);
        self.collect(&self.cluster.daemon_sets(namespace).await?, &mut findings);
        self.collect(&self.cluster.stateful_sets(namespace).await?, &mut findings);
        self.collect(&self.cluster.pods(namespace).await?, &mut findings);
        self.collect(&self.cluster.cron_jobs(namespace).await?, &mut findings);
        Ok(findings)
    }
}

pub fn report(findings: &[Finding]) {
    for f in findings {
        let workload = format!(
            "{} {}/{} container {}",
            f.kind, f.namespace, f.name, f.container
        );
        match (&f.tag, &f.digest) {
            (Some(tag), _) if f.versioned => info!(
                "{workload} runs {} at version {}.",
                f.reference,
                f.version.as_deref().unwrap_or(tag)
            ),
            (_, Some(digest)) => info!("{workload} runs {} pinned to {digest}.", f.reference),
            (tag, None) => warn!(
                "{workload} runs {} with floating tag {}.",
                f.reference,
                tag.as_deref().unwrap_or("latest")
            ),
        }
    }
    let versioned = findings.iter().filter(|f| f.versioned).count();
    let floating = findings.iter().filter(|f| f.is_floating()).count();
    info!(
        "Checked {} containers: {versioned} versioned, {} pinned by digest, {floating} floating.",
        findings.len(),
        findings.len() - versioned - floating
    );
}
