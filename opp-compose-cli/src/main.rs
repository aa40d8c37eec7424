//! Command line program for launching OMNeT++ simulations as container
//! fleets.

#![allow(unused)]

#[macro_use]
extern crate log;

extern crate anyhow;
extern crate clap;
extern crate colored;

extern crate opp_compose_core as opp_compose;

pub mod cli;
mod config;

use colored::*;

fn main() {
    // Run the program based on user input
    match cli::start(cli::app_matches()) {
        Ok(_) => (),
        Err(e) => {
            println!("{}{}", "error: ".red(), e);
            if e.root_cause().to_string() != e.to_string() {
                println!("Caused by:\n{}", e.root_cause())
            }
            std::process::exit(exit_code(&e));
        }
    }
}

/// A missing results path gets its own exit status so scripts can tell
/// "nothing was created" apart from other failures.
fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<opp_compose::Error>() {
        Some(opp_compose::Error::MissingResultsPath(_)) => 2,
        _ => 1,
    }
}
