//! Configuration module for Sumi-Swarm
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_swarm::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("swarm.toml")).unwrap();
//! println!("Swarm will run {} workers", config.workers.count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, CachePolicy, ClientConfig, ClientMode, Config, SessionConfig, UserAgentConfig,
    WorkerConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

pub(crate) use validation::validate_seeds;
