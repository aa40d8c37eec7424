//! Application definition.

#![allow(dead_code)]
#![allow(unused)]

extern crate simplelog;

use std::path::PathBuf;

use anyhow::{Context, Error, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use opp_compose::status;
use opp_compose::{DockerRuntime, FleetManager, SimConfig};

use crate::config;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

pub fn app<'a, 'b>() -> App<'a, 'b> {
    let app = App::new("opp-compose")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .about(
            "Launch OMNeT++ simulations as container fleets.\n\
             Commands are similar to `docker compose` commands.",
        )
        .arg(
            Arg::with_name("verbosity")
                .long("verbosity")
                .short("v")
                .takes_value(true)
                .default_value("info")
                .value_name("verb")
                .global(true)
                .help("Set the verbosity of the log output"),
        )
        .arg(
            Arg::with_name("file")
                .long("file")
                .short("f")
                .takes_value(true)
                .value_name("path")
                .default_value("simulation.yaml")
                .global(true)
                .help("Compose configuration file (.yaml)"),
        )
        .arg(
            Arg::with_name("configuration")
                .long("configuration")
                .short("c")
                .takes_value(true)
                .value_name("name")
                .global(true)
                .help("Configuration name in the simulation ini-file"),
        )
        .arg(
            Arg::with_name("first")
                .long("first")
                .takes_value(true)
                .value_name("number")
                .default_value("0")
                .global(true)
                .help("Run number of the first run to launch"),
        )
        .arg(
            Arg::with_name("last")
                .long("last")
                .takes_value(true)
                .value_name("number")
                .global(true)
                .help("Run number of the last run to launch"),
        )
        .arg(
            Arg::with_name("image")
                .long("image")
                .takes_value(true)
                .value_name("image")
                .default_value("mobmecmeshsim")
                .global(true)
                .help("Name of the container image to use"),
        )
        .arg(
            Arg::with_name("name")
                .long("name")
                .takes_value(true)
                .value_name("string")
                .default_value("sim-r")
                .global(true)
                .help("Base name of the simulation containers"),
        )
        .arg(
            Arg::with_name("user")
                .long("user")
                .takes_value(true)
                .value_name("uid")
                .default_value("")
                .global(true)
                .help("System user-id to use inside the container"),
        )
        .arg(
            Arg::with_name("ini")
                .long("ini")
                .takes_value(true)
                .value_name("file")
                .default_value("omnetpp.ini")
                .global(true)
                .help("Name of the simulation configuration ini-file"),
        )
        .arg(
            Arg::with_name("results-path")
                .long("results-path")
                .takes_value(true)
                .value_name("path")
                .default_value("/tmp/simulation")
                .global(true)
                .help(
                    "Base path on the host file system where to store simulation \
                     result files. A folder for each run is created",
                ),
        )
        .arg(
            Arg::with_name("container-result-path")
                .long("container-result-path")
                .takes_value(true)
                .value_name("path")
                .default_value("/usr/results")
                .global(true)
                .help(
                    "Absolute path on the container file system where to store \
                     simulation result files (right side of the bind mount)",
                ),
        )
        // status subcommand
        .subcommand(
            SubCommand::with_name("ps")
                .display_order(10)
                .about("Show the status of the simulation fleet"),
        )
        // lifecycle subcommands
        .subcommand(
            SubCommand::with_name("up")
                .display_order(20)
                .about("Create one detached container per run in the configured range"),
        )
        .subcommand(
            SubCommand::with_name("down")
                .display_order(21)
                .about("Stop and remove the simulation fleet")
                .arg(timeout_arg()),
        )
        .subcommand(
            SubCommand::with_name("stop")
                .display_order(22)
                .about("Gracefully stop the simulation fleet")
                .arg(timeout_arg()),
        )
        .subcommand(
            SubCommand::with_name("rm")
                .alias("remove")
                .display_order(23)
                .about("Remove the fleet's containers")
                .arg(
                    Arg::with_name("volumes")
                        .long("volumes")
                        .help("Also remove anonymous volumes"),
                )
                .arg(
                    Arg::with_name("force")
                        .long("force")
                        .help("Force removal of containers that are not stopped"),
                ),
        )
        // image subcommand
        .subcommand(
            SubCommand::with_name("pull")
                .alias("image-pull")
                .display_order(30)
                .about("Pull the configured simulation image"),
        )
        // diagnostics
        .subcommand(
            SubCommand::with_name("config-dump")
                .display_order(40)
                .about("Print the effective configuration as YAML"),
        )
        .subcommand(
            SubCommand::with_name("testup")
                .display_order(41)
                .about("Launch throwaway alpine containers over the configured range"),
        );

    app
}

fn timeout_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("timeout")
        .long("timeout")
        .short("t")
        .takes_value(true)
        .value_name("seconds")
        .default_value("10")
        .help("Seconds to wait for a graceful stop before killing")
}

pub fn app_matches() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    setup_log_verbosity(&matches);
    match matches.subcommand() {
        ("ps", Some(m)) => start_ps(m),
        ("up", Some(m)) => start_up(m),
        ("down", Some(m)) => start_down(m),
        ("stop", Some(m)) => start_stop(m),
        ("rm", Some(m)) => start_rm(m),
        ("pull", Some(m)) => start_pull(m),
        ("config-dump", Some(m)) => start_config_dump(m),
        ("testup", Some(m)) => start_testup(m),
        _ => Ok(()),
    }
}

/// Resolve the effective configuration and run the pre-flight checks
/// shared by all subcommands.
fn resolve_config(matches: &ArgMatches) -> Result<SimConfig> {
    let config = config::resolve(matches)?;
    // every container runs compute-bound simulation work concurrently
    if config.last - config.first > num_cpus::get() as i64 {
        warn!("Not enough CPU cores available to run all simulations!");
    }
    Ok(config)
}

fn open_fleet(config: SimConfig) -> Result<FleetManager<DockerRuntime>> {
    let runtime = DockerRuntime::connect().context("failed connecting to the docker daemon")?;
    Ok(FleetManager::new(config, runtime))
}

fn start_ps(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let items = fleet.list()?;
    println!(
        "Simulation Container Overview:\n{}",
        status::status(&items, true)?
    );
    Ok(())
}

fn start_up(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let existing = fleet.list()?;
    if existing.is_empty() {
        let created = fleet.run()?;
        println!(
            "Created {} simulation container(s):\n{}",
            created.len(),
            status::status(&created, true)?
        );
    } else {
        warn!(
            "Simulation container(s) are already running. Nothing was changed.\n\
             Existing container(s):\n{}",
            status::status(&existing, true)?
        );
    }
    Ok(())
}

fn start_down(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let cnt_stopped = fleet.stop(parse_timeout(matches)?)?;
    info!("Stopped {} container(s).", cnt_stopped);
    let cnt_removed = fleet.remove(false, false)?;
    info!("Removed {} container(s).", cnt_removed);
    Ok(())
}

fn start_stop(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let cnt = fleet.stop(parse_timeout(matches)?)?;
    info!("Stopped {} container(s).", cnt);
    Ok(())
}

fn start_rm(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let cnt = fleet.remove(matches.is_present("volumes"), matches.is_present("force"))?;
    info!("Removed {} container(s).", cnt);
    Ok(())
}

fn start_pull(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    let image = fleet.image_pull()?;
    info!("Pulled image {}.", image);
    Ok(())
}

fn start_config_dump(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn start_testup(matches: &ArgMatches) -> Result<()> {
    let fleet = open_fleet(resolve_config(matches)?)?;
    for record in fleet.test_up()? {
        println!("{:#?}", record);
    }
    Ok(())
}

fn parse_timeout(matches: &ArgMatches) -> Result<i64> {
    matches
        .value_of("timeout")
        .unwrap_or("10")
        .parse::<i64>()
        .context("failed parsing stop timeout (seconds)")
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{Config, LevelFilter, TermLogger};
    let level_filter = match matches.value_of("verbosity") {
        Some(s) => match s {
            "0" | "none" => LevelFilter::Off,
            "1" | "err" | "error" | "min" => LevelFilter::Error,
            "2" | "warn" | "warning" => LevelFilter::Warn,
            "3" | "info" | "default" => LevelFilter::Info,
            "4" | "debug" => LevelFilter::Debug,
            "5" | "trace" | "max" | "all" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        },
        _ => LevelFilter::Info,
    };
    let mut config_builder = simplelog::ConfigBuilder::new();
    let logger_conf = config_builder
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed);
}
