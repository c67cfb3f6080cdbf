//! Subcommand implementations

pub mod config;
pub mod doctor;
pub mod migrate;
pub mod serve;
