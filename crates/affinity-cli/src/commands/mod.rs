//! CLI command implementations.

pub mod init;
pub mod generate;
pub mod show;
pub mod list;
pub mod stats;
