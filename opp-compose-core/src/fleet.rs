//! Fleet lifecycle operations.
//!
//! Translates the declarative run range plus naming scheme from
//! [`SimConfig`] into create/list/stop/remove requests against a
//! [`ContainerRuntime`]. Everything fleet-wide is scoped through the
//! `sim-config` label, so operating on an empty fleet is a no-op rather
//! than an error.

use std::collections::HashMap;
use std::path::Path;

use crate::alloc::NameAllocator;
use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::runtime::{
    ContainerRecord, ContainerRuntime, ContainerSpec, APP_LABEL_KEY, APP_LABEL_VALUE,
    SIM_CONFIG_LABEL_KEY,
};

/// Environment variables injected into every simulation container.
pub const ENV_RUN_INIFILE: &str = "OPP_RUN_INIFILE";
pub const ENV_RUN_CONFIG: &str = "OPP_RUN_CONFIG";
pub const ENV_RUN_NUMBER: &str = "OPP_RUN_NUMBER";
pub const ENV_RUN_RESULT_DIR: &str = "OPP_RUN_RESULT_DIR";

/// Image and command used by [`FleetManager::test_up`].
const TEST_IMAGE: &str = "alpine";
const TEST_CMD: [&str; 3] = ["echo", "hello", "world"];

/// Manages the set of containers sharing one `sim-config` label value.
pub struct FleetManager<R: ContainerRuntime> {
    config: SimConfig,
    runtime: R,
}

impl<R: ContainerRuntime> FleetManager<R> {
    pub fn new(config: SimConfig, runtime: R) -> Self {
        Self { config, runtime }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn label_filters(&self) -> Vec<String> {
        vec![format!(
            "{}={}",
            SIM_CONFIG_LABEL_KEY, self.config.configuration
        )]
    }

    fn labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert(
            SIM_CONFIG_LABEL_KEY.to_string(),
            self.config.configuration.clone(),
        );
        labels.insert(APP_LABEL_KEY.to_string(), APP_LABEL_VALUE.to_string());
        labels
    }

    /// List the fleet's containers in any lifecycle state. Order is
    /// whatever the daemon returns. No side effects.
    pub fn list(&self) -> Result<Vec<ContainerRecord>> {
        self.runtime.list_labeled(&self.label_filters())
    }

    /// Launch one detached container per run number in the configured
    /// range.
    ///
    /// Fails before any container is created when the host results base
    /// path does not exist. A creation failure mid-range propagates;
    /// containers created up to that point keep running (no rollback).
    /// Calling this while the fleet already exists produces name
    /// collisions at the daemon; guarding against that is the caller's
    /// job (the `up` command checks `list()` first).
    pub fn run(&self) -> Result<Vec<ContainerRecord>> {
        if !self.config.results_path.exists() {
            error!("Path for results files does not exist!");
            return Err(Error::MissingResultsPath(self.config.results_path.clone()));
        }

        let allocator = NameAllocator::new(self.config.range(), &self.config.name);

        let mut created = Vec::new();
        for (number, name) in allocator {
            let result_path = self.config.results_path.join(&name);
            let mut env = HashMap::new();
            env.insert(ENV_RUN_INIFILE.to_string(), self.config.ini.clone());
            env.insert(
                ENV_RUN_CONFIG.to_string(),
                self.config.configuration.clone(),
            );
            env.insert(ENV_RUN_NUMBER.to_string(), number.to_string());
            env.insert(
                ENV_RUN_RESULT_DIR.to_string(),
                self.config.container_result_path.clone(),
            );

            let spec = ContainerSpec {
                image: self.config.image.clone(),
                name,
                env,
                binds: vec![format!(
                    "{}:{}",
                    result_path.display(),
                    self.config.container_result_path
                )],
                cmd: None,
                user: self.config.user.clone(),
                labels: self.labels(),
            };

            debug!("creating container {} (run {})", spec.name, number);
            created.push(self.runtime.create(&spec)?);
        }
        Ok(created)
    }

    /// Gracefully stop every container in the fleet, killing each after
    /// `timeout` seconds. Returns the number of containers listed.
    pub fn stop(&self, timeout: i64) -> Result<usize> {
        let containers = self.list()?;
        let cnt = containers.len();
        for container in &containers {
            self.runtime.stop(&container.id, timeout)?;
        }
        Ok(cnt)
    }

    /// Remove every container in the fleet. Returns the number of
    /// containers listed.
    pub fn remove(&self, volumes: bool, force: bool) -> Result<usize> {
        let containers = self.list()?;
        let cnt = containers.len();
        for container in &containers {
            self.runtime.remove(&container.id, volumes, force)?;
        }
        Ok(cnt)
    }

    /// Pull the configured image. Pure passthrough to the daemon.
    pub fn image_pull(&self) -> Result<String> {
        self.runtime.pull(&self.config.image)
    }

    /// Launch throwaway `alpine` containers over the configured range,
    /// carrying the fleet labels. Smoke test for the runtime hookup
    /// without the simulation image.
    pub fn test_up(&self) -> Result<Vec<ContainerRecord>> {
        let allocator = NameAllocator::new(self.config.range(), &self.config.name);
        let mut created = Vec::new();
        for (_, name) in allocator {
            let spec = ContainerSpec {
                image: TEST_IMAGE.to_string(),
                name,
                env: HashMap::new(),
                binds: Vec::new(),
                cmd: Some(TEST_CMD.iter().map(|s| s.to_string()).collect()),
                user: String::new(),
                labels: self.labels(),
            };
            created.push(self.runtime.create(&spec)?);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;

    use super::*;

    /// In-memory runtime recording every call it receives.
    #[derive(Default)]
    struct MockRuntime {
        containers: RefCell<Vec<ContainerRecord>>,
        created_specs: RefCell<Vec<ContainerSpec>>,
        list_filters: RefCell<Vec<Vec<String>>>,
        stopped: RefCell<Vec<String>>,
        removed: RefCell<Vec<String>>,
    }

    impl ContainerRuntime for MockRuntime {
        fn list_labeled(&self, label_filters: &[String]) -> Result<Vec<ContainerRecord>> {
            self.list_filters.borrow_mut().push(label_filters.to_vec());
            Ok(self.containers.borrow().clone())
        }

        fn create(&self, spec: &ContainerSpec) -> Result<ContainerRecord> {
            self.created_specs.borrow_mut().push(spec.clone());
            let record = ContainerRecord {
                id: format!("id-{}", spec.name),
                name: spec.name.clone(),
                status: "running".to_string(),
                ..Default::default()
            };
            Ok(record)
        }

        fn stop(&self, id: &str, _timeout: i64) -> Result<()> {
            self.stopped.borrow_mut().push(id.to_string());
            Ok(())
        }

        fn remove(&self, id: &str, _volumes: bool, _force: bool) -> Result<()> {
            self.removed.borrow_mut().push(id.to_string());
            Ok(())
        }

        fn pull(&self, image: &str) -> Result<String> {
            Ok(image.to_string())
        }
    }

    fn test_config(results_path: &Path) -> SimConfig {
        let mut config = SimConfig::default();
        config.configuration = "MeshBase".to_string();
        config.first = 0;
        config.last = 2;
        config.results_path = results_path.to_path_buf();
        config
    }

    fn existing_results_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("opp-compose-fleet-{}", tag));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn run_creates_one_container_per_index() {
        let dir = existing_results_dir("run");
        let fleet = FleetManager::new(test_config(&dir), MockRuntime::default());
        let created = fleet.run().unwrap();
        assert_eq!(created.len(), 3);

        let specs = fleet.runtime.created_specs.borrow();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["sim-r0", "sim-r1", "sim-r2"]);
        for (i, spec) in specs.iter().enumerate() {
            assert_eq!(spec.labels.get("sim-config").unwrap(), "MeshBase");
            assert_eq!(spec.labels.get("app").unwrap(), "opp_compose");
            assert_eq!(spec.env.get(ENV_RUN_NUMBER).unwrap(), &i.to_string());
            assert_eq!(spec.env.get(ENV_RUN_CONFIG).unwrap(), "MeshBase");
            assert_eq!(spec.env.get(ENV_RUN_INIFILE).unwrap(), "omnetpp.ini");
            assert_eq!(
                spec.binds,
                vec![format!("{}/sim-r{}:/usr/results", dir.display(), i)]
            );
        }
    }

    #[test]
    fn run_fails_before_creating_when_results_path_missing() {
        let config = test_config(Path::new("/nonexistent/opp-compose-results"));
        let fleet = FleetManager::new(config, MockRuntime::default());
        match fleet.run() {
            Err(Error::MissingResultsPath(_)) => (),
            other => panic!("expected MissingResultsPath, got {:?}", other.map(|_| ())),
        }
        assert!(fleet.runtime.created_specs.borrow().is_empty());
    }

    #[test]
    fn stop_and_remove_on_empty_fleet_count_zero() {
        let dir = existing_results_dir("empty");
        let fleet = FleetManager::new(test_config(&dir), MockRuntime::default());
        assert_eq!(fleet.stop(10).unwrap(), 0);
        assert_eq!(fleet.remove(false, false).unwrap(), 0);
        assert!(fleet.runtime.stopped.borrow().is_empty());
        assert!(fleet.runtime.removed.borrow().is_empty());
        // only the two listing queries reached the runtime
        assert_eq!(fleet.runtime.list_filters.borrow().len(), 2);
    }

    #[test]
    fn list_scopes_by_sim_config_label() {
        let dir = existing_results_dir("list");
        let fleet = FleetManager::new(test_config(&dir), MockRuntime::default());
        fleet.list().unwrap();
        let filters = fleet.runtime.list_filters.borrow();
        assert_eq!(filters[0], vec!["sim-config=MeshBase".to_string()]);
    }

    #[test]
    fn stop_and_remove_walk_every_listed_container() {
        let dir = existing_results_dir("walk");
        let runtime = MockRuntime::default();
        for i in 0..3 {
            runtime.containers.borrow_mut().push(ContainerRecord {
                id: format!("id-{}", i),
                name: format!("sim-r{}", i),
                status: "running".to_string(),
                ..Default::default()
            });
        }
        let fleet = FleetManager::new(test_config(&dir), runtime);
        assert_eq!(fleet.stop(10).unwrap(), 3);
        assert_eq!(fleet.remove(true, true).unwrap(), 3);
        assert_eq!(fleet.runtime.stopped.borrow().len(), 3);
        assert_eq!(fleet.runtime.removed.borrow().len(), 3);
    }

    #[test]
    fn test_up_uses_throwaway_image_with_fleet_labels() {
        let dir = existing_results_dir("testup");
        let fleet = FleetManager::new(test_config(&dir), MockRuntime::default());
        let created = fleet.test_up().unwrap();
        assert_eq!(created.len(), 3);
        let specs = fleet.runtime.created_specs.borrow();
        assert_eq!(specs[0].image, "alpine");
        assert_eq!(
            specs[0].cmd.as_ref().unwrap(),
            &vec!["echo".to_string(), "hello".to_string(), "world".to_string()]
        );
        assert_eq!(specs[0].labels.get("sim-config").unwrap(), "MeshBase");
        assert!(specs[0].binds.is_empty());
    }
}
