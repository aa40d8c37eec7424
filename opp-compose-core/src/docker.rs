//! Docker Engine API client.
//!
//! Thin blocking facade over `bollard`. The tool performs one logical
//! action per invocation, synchronously, so instead of making the whole
//! crate async the client owns a current-thread tokio runtime and blocks
//! on each call.

use std::collections::HashMap;

use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, HostConfig};
use bollard::Docker;
use futures_util::stream::StreamExt;

use crate::error::Result;
use crate::runtime::{ContainerRecord, ContainerRuntime, ContainerSpec};

/// Client for a local Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
    rt: tokio::runtime::Runtime,
}

impl DockerRuntime {
    /// Connect to the local daemon using the standard environment
    /// (unix socket, or `DOCKER_HOST` when set).
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { docker, rt })
    }
}

fn record_from_inspect(inspect: ContainerInspectResponse) -> ContainerRecord {
    let state = inspect.state.unwrap_or_default();
    ContainerRecord {
        id: inspect.id.unwrap_or_default(),
        // the daemon reports names with a leading slash
        name: inspect
            .name
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string(),
        status: state.status.map(|s| s.to_string()).unwrap_or_default(),
        exit_code: state.exit_code.unwrap_or(0),
        error: state.error.unwrap_or_default(),
        started_at: state.started_at.unwrap_or_default(),
        finished_at: state.finished_at.unwrap_or_default(),
    }
}

impl ContainerRuntime for DockerRuntime {
    fn list_labeled(&self, label_filters: &[String]) -> Result<Vec<ContainerRecord>> {
        self.rt.block_on(async {
            let mut filters = HashMap::new();
            filters.insert("label".to_string(), label_filters.to_vec());
            let summaries = self
                .docker
                .list_containers(Some(ListContainersOptions::<String> {
                    all: true,
                    filters,
                    ..Default::default()
                }))
                .await?;

            // the listing endpoint doesn't carry exit codes or timestamps,
            // inspect each hit for the full state
            let mut records = Vec::with_capacity(summaries.len());
            for summary in summaries {
                let id = summary.id.unwrap_or_default();
                let inspect = self
                    .docker
                    .inspect_container(&id, None::<InspectContainerOptions>)
                    .await?;
                records.push(record_from_inspect(inspect));
            }
            Ok(records)
        })
    }

    fn create(&self, spec: &ContainerSpec) -> Result<ContainerRecord> {
        self.rt.block_on(async {
            let options = CreateContainerOptions {
                name: spec.name.clone(),
                platform: None,
            };
            let config = Config {
                image: Some(spec.image.clone()),
                cmd: spec.cmd.clone(),
                env: Some(
                    spec.env
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect(),
                ),
                user: if spec.user.is_empty() {
                    None
                } else {
                    Some(spec.user.clone())
                },
                labels: Some(spec.labels.clone()),
                host_config: Some(HostConfig {
                    binds: Some(spec.binds.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let created = self.docker.create_container(Some(options), config).await?;
            self.docker
                .start_container(&created.id, None::<StartContainerOptions<String>>)
                .await?;
            let inspect = self
                .docker
                .inspect_container(&created.id, None::<InspectContainerOptions>)
                .await?;
            Ok(record_from_inspect(inspect))
        })
    }

    fn stop(&self, id: &str, timeout: i64) -> Result<()> {
        self.rt.block_on(async {
            self.docker
                .stop_container(id, Some(StopContainerOptions { t: timeout }))
                .await?;
            Ok(())
        })
    }

    fn remove(&self, id: &str, volumes: bool, force: bool) -> Result<()> {
        self.rt.block_on(async {
            self.docker
                .remove_container(
                    id,
                    Some(RemoveContainerOptions {
                        v: volumes,
                        force,
                        ..Default::default()
                    }),
                )
                .await?;
            Ok(())
        })
    }

    fn pull(&self, image: &str) -> Result<String> {
        self.rt.block_on(async {
            let options = CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            };
            let mut progress = self.docker.create_image(Some(options), None, None);
            while let Some(update) = progress.next().await {
                let update = update?;
                if let Some(status) = update.status {
                    debug!("pull: {}", status);
                }
            }
            Ok(image.to_string())
        })
    }
}
