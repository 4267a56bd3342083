//! Fleetroute CLI library.
//!
//! Subcommand handlers, logging setup and output formatting for the
//! `fleetroute` binary.

pub mod commands;
pub mod logging;
pub mod output;
