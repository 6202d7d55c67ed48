//! Configuration module for Seo-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use seo_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("seo-sweep.toml")).unwrap();
//! println!("Reports go to: {}", config.output.directory);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config};
