//! Container runtime abstraction.
//!
//! [`ContainerRuntime`] is the seam between fleet logic and the Docker
//! Engine API. The fleet manager only ever needs five primitives:
//! label-scoped listing, detached creation, stop, remove and image pull.
//! The production implementation lives in [`crate::docker`]; tests swap
//! in an in-memory runtime.

use std::collections::HashMap;

use crate::error::Result;

/// Label attached to every container this tool creates.
pub const APP_LABEL_KEY: &str = "app";
pub const APP_LABEL_VALUE: &str = "opp_compose";
/// Label carrying the simulation configuration name; all fleet queries
/// filter on it.
pub const SIM_CONFIG_LABEL_KEY: &str = "sim-config";

/// Full description of one container to create. Built fresh per run and
/// handed to the runtime; never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    /// Environment variables injected into the container.
    pub env: HashMap<String, String>,
    /// Bind mounts in `host_path:container_path` form.
    pub binds: Vec<String>,
    /// Command override; `None` runs the image default.
    pub cmd: Option<Vec<String>>,
    /// User id inside the container; empty means image default.
    pub user: String,
    pub labels: HashMap<String, String>,
}

/// The slice of container state this tool consumes. The container itself
/// is owned by the daemon; records are discovered via listing and only
/// ever asked for transitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    /// Lifecycle status as reported by the daemon
    /// (`created`, `running`, `exited`, ...).
    pub status: String,
    pub exit_code: i64,
    /// Error string from the daemon, empty when none.
    pub error: String,
    /// Raw `StartedAt` timestamp string as reported by the daemon.
    pub started_at: String,
    /// Raw `FinishedAt` timestamp string as reported by the daemon.
    pub finished_at: String,
}

impl ContainerRecord {
    /// Container id truncated to 12 characters, the usual display form.
    pub fn short_id(&self) -> &str {
        if self.id.len() > 12 {
            &self.id[..12]
        } else {
            &self.id
        }
    }
}

/// Blocking client interface to a container runtime.
pub trait ContainerRuntime {
    /// List containers in any lifecycle state matching all given
    /// `key=value` label filters.
    fn list_labeled(&self, label_filters: &[String]) -> Result<Vec<ContainerRecord>>;

    /// Create and start a container in detached mode; returns the
    /// record of the freshly started container without waiting for it.
    fn create(&self, spec: &ContainerSpec) -> Result<ContainerRecord>;

    /// Gracefully stop a container, killing it after `timeout` seconds.
    fn stop(&self, id: &str, timeout: i64) -> Result<()>;

    /// Remove a container, optionally removing anonymous volumes and
    /// optionally forcing removal of a non-stopped container.
    fn remove(&self, id: &str, volumes: bool, force: bool) -> Result<()>;

    /// Pull an image; returns the pulled image reference.
    fn pull(&self, image: &str) -> Result<String>;
}

#[test]
fn short_id_truncates_to_twelve() {
    let mut record = ContainerRecord::default();
    record.id = "0123456789abcdef0123456789abcdef".to_string();
    assert_eq!(record.short_id(), "0123456789ab");
    record.id = "abc".to_string();
    assert_eq!(record.short_id(), "abc");
}
