//! Emergency vehicle routing on urban road networks.
//!
//! Ambulance-to-emergency assignments are modelled as commodities competing for the capacity of a
//! shared road network. Routes for all of them are found jointly by solving a multi-commodity flow
//! linear program, in which critical emergencies are favoured when capacity is scarce.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod commodity;
pub mod error;
pub mod extraction;
pub mod generate;
pub mod graph;
pub mod id;
pub mod input;
pub mod log;
pub mod optimisation;
pub mod parameters;
pub mod report;
pub mod routing;
pub mod settings;
pub mod solver;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This is a subfolder of the user's configuration directory (e.g. `~/.config/emroute` on Linux).
pub fn get_emroute_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_default();
    path.push("emroute");
    path
}
