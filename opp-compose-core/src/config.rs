//! Effective tool configuration.
//!
//! Field names serialize in kebab-case so they line up with the command
//! line option names, both for `config-dump` output and for the YAML
//! configuration file keys.

use std::path::PathBuf;

use crate::alloc::RunRange;

/// Everything one invocation needs to know: which simulation configuration
/// to label the fleet with, the run number range, and how to wire each
/// container up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimConfig {
    /// Configuration name from the simulation ini-file. Used as the
    /// `sim-config` label value scoping every fleet operation.
    pub configuration: String,
    /// Run number of the first run to launch.
    pub first: i64,
    /// Run number of the last run to launch (inclusive).
    pub last: i64,
    /// Container image to run.
    pub image: String,
    /// Base name of the simulation containers; the run number is appended.
    pub name: String,
    /// System user id to use inside the container. Empty means image default.
    pub user: String,
    /// Name of the simulation ini-file inside the container.
    pub ini: String,
    /// Base path on the host file system for result files. One
    /// subdirectory per run is bind-mounted from here.
    pub results_path: PathBuf,
    /// Absolute path inside the container where result files are written.
    pub container_result_path: String,
}

impl SimConfig {
    pub fn range(&self) -> RunRange {
        RunRange::new(self.first, self.last)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            configuration: String::new(),
            first: 0,
            last: 0,
            image: "mobmecmeshsim".to_string(),
            name: "sim-r".to_string(),
            user: String::new(),
            ini: "omnetpp.ini".to_string(),
            results_path: PathBuf::from("/tmp/simulation"),
            container_result_path: "/usr/results".to_string(),
        }
    }
}

#[test]
fn config_dump_uses_option_names() {
    let config = SimConfig::default();
    let dumped = serde_yaml::to_string(&config).unwrap();
    assert!(dumped.contains("results-path:"));
    assert!(dumped.contains("container-result-path:"));
    assert!(dumped.contains("configuration:"));
}

#[test]
fn config_roundtrips_through_yaml() {
    let mut config = SimConfig::default();
    config.configuration = "MeshBase".to_string();
    config.last = 7;
    let dumped = serde_yaml::to_string(&config).unwrap();
    let back: SimConfig = serde_yaml::from_str(&dumped).unwrap();
    assert_eq!(back.configuration, "MeshBase");
    assert_eq!(back.range(), crate::alloc::RunRange::new(0, 7));
}
