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

use std::{fmt::Debug, path::Path};

use anyhow::{Context, Result};
use k8s_openapi::{
    NamespaceResourceScope,
    api::{
        apps::v1::{DaemonSet, Deployment, StatefulSet},
        batch::v1::CronJob,
        core::v1::Pod,
    },
};
use kube::{
    Api, Client, Config, Resource,
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
};
use log::{debug, info};
use serde::de::DeserializeOwned;

/// Access to the workloads of a cluster. Every lister covers one namespace,
/// or all namespaces for `None`.
pub trait Cluster {
    async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>>;
    async fn daemon_sets(&self, namespace: Option<&str>) -> Result<Vec<DaemonSet>>;
    async fn stateful_sets(&self, namespace: Option<&str>) -> Result<Vec<StatefulSet>>;
    async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>>;
    async fn cron_jobs(&self, namespace: Option<&str>) -> Result<Vec<CronJob>>;
}

pub struct KubeCluster {
    client: Client,
}

async fn kubeconfig(path: Option<&Path>) -> Result<Config> {
    let options = KubeConfigOptions::default();
    let config = match path {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Cannot read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None => Config::from_kubeconfig(&options).await?,
    };
    Ok(config)
}

impl KubeCluster {
    /// Prefers the service account of the pod it is running in and falls back
    /// to a kubeconfig file.
    pub async fn connect(kubeconfig_path: Option<&Path>) -> Result<KubeCluster> {
        let config = match Config::incluster() {
            Ok(config) => {
                info!("Using in-cluster configuration");
                config
            }
            Err(e) => {
                debug!("No in-cluster configuration: {e}");
                kubeconfig(kubeconfig_path).await?
            }
        };
        let client = Client::try_from(config)?;
        Ok(KubeCluster { client })
    }

    async fn list<K>(&self, namespace: Option<&str>) -> Result<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
        K::DynamicType: Default,
    {
        let api: Api<K> = match namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let objects = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Cannot list {}", K::plural(&Default::default())))?;
        Ok(objects.items)
    }
}

impl Cluster for KubeCluster {
    async fn deployments(&self, namespace: Option<&str>) -> Result<Vec<Deployment>> {
        self.list(namespace).await
    }

    async fn daemon_sets(&self, namespace: Option<&str>) -> Result<Vec<DaemonSet>> {
        self.list(namespace).await
    }

    async fn stateful_sets(&self, namespace: Option<&str>) -> Result<Vec<StatefulSet>> {
        self.list(namespace).await
    }

    async fn pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        self.list(namespace).await
    }

    async fn cron_jobs(&self, namespace: Option<&str>) -> Result<Vec<CronJob>> {
        self.list(namespace).await
    }
}
