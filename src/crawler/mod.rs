//! Crawler module for building article citation graphs
//!
//! This module contains the core crawling logic, including:
//! - The per-session orchestrator loop
//! - The per-node retrieve step (store lookup, fetch, store write)
//! - Wiring an orchestrator from configuration

mod orchestrator;
mod retrieve;

pub use orchestrator::{CrawlOutcome, CrawlRequest, CrawlSession, CrawlSettings, Orchestrator};

use crate::config::{build_blacklist, Config};
use crate::fetch::HttpArticleFetcher;
use crate::store::open_store;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Builds an orchestrator backed by the live HTTP fetcher
///
/// This is the main entry point for starting crawls. It will:
/// 1. Build the host blacklist from the configured file and entries
/// 2. Build the HTTP fetcher
/// 3. Open the article store, if one is configured
///
/// A store that cannot be opened is logged and the crawl runs without one.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_dir` - Directory relative paths in the configuration are resolved against
pub fn build_orchestrator(config: &Config, config_dir: Option<&Path>) -> Result<Orchestrator> {
    let blacklist = Arc::new(build_blacklist(config, config_dir)?);
    tracing::debug!("Host blacklist has {} entries", blacklist.len());

    let fetcher = Arc::new(HttpArticleFetcher::new(config, blacklist.clone())?);
    let orchestrator = Orchestrator::new(fetcher, blacklist, CrawlSettings::from(&config.crawler));

    let Some(database_path) = &config.store.database_path else {
        return Ok(orchestrator);
    };

    let path = match config_dir {
        Some(dir) if Path::new(database_path).is_relative() => dir.join(database_path),
        _ => Path::new(database_path).to_path_buf(),
    };

    match open_store(&path) {
        Ok(store) => {
            tracing::info!("Using article store at {}", path.display());
            Ok(orchestrator.with_store(Arc::new(store)))
        }
        Err(e) => {
            tracing::warn!("Article store at {} unavailable: {}", path.display(), e);
            Ok(orchestrator)
        }
    }
}
