//! Configuration module for Articlesa
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use articlesa::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("articlesa.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{BlacklistConfig, Config, CrawlerConfig, StoreConfig, UserAgentConfig};

pub use parser::{
    build_blacklist, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::{validate, MAX_ALLOWED_DEPTH};
