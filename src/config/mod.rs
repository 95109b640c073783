//! Configuration module for Bio-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bio_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Workers: {}", config.crawler.worker_count);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ClassifierConfig, Config, CrawlerConfig, DelayRange, FetchConfig, IdentityEntry, LinkConfig,
    OutputConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
