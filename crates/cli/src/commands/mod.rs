//! CLI subcommands

pub mod artifacts;
pub mod health;
pub mod predict;
