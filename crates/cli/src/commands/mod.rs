//! CLI subcommands

pub mod audit;
pub mod nodes;
pub mod remediation;
