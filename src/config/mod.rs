//! Configuration module
//!
//! Grid, execution, history and storage settings loaded from a TOML file.

pub mod config;
