//! Shared building blocks for the nodetrust crates.

pub mod config;
pub mod error;
pub mod paths;
pub mod test;
