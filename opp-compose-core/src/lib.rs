//! This library implements the fleet logic behind `opp-compose`.
//!
//! A "fleet" is the set of containers running one simulation campaign: one
//! container per run number in a configured inclusive range, each with its
//! own result directory bind-mounted from the host. All fleet-wide
//! operations are built on a single primitive, a label-scoped container
//! listing, which makes stop/remove naturally idempotent and safe to call
//! on an empty fleet.
//!
//! The library is a pure client of the Docker Engine API. Container
//! lifecycle semantics (graceful stop, forced removal, image pulls) are
//! delegated to the daemon; nothing is cached or retried locally.
//!
//! # Example
//!
//! ```ignore
//! use opp_compose_core::{DockerRuntime, FleetManager, SimConfig};
//!
//! let config = SimConfig::default();
//! let fleet = FleetManager::new(config, DockerRuntime::connect()?);
//! let created = fleet.run()?;
//! println!("{}", opp_compose_core::status::status(&created, true)?);
//! ```

#![allow(unused)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use alloc::{NameAllocator, RunRange};
pub use config::SimConfig;
pub use docker::DockerRuntime;
pub use error::{Error, Result};
pub use fleet::FleetManager;
pub use runtime::{ContainerRecord, ContainerRuntime, ContainerSpec};

pub mod alloc;
pub mod config;
pub mod docker;
pub mod error;
pub mod fleet;
pub mod runtime;
pub mod status;
