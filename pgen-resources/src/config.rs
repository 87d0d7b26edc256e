// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Allocation settings.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `PGEN_` environment variables (for example
//! `PGEN_OVERLAY_MAX_EXTRA_BLOB_SIZE=8192`).

use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pgen_track::Tracker;
use pgen_track::tracker::{EntityManager, TextTracker};
use serde::{Deserialize, Serialize};

use crate::types::{ResourceError, ResourceResult};

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "PGEN_";

/// How tile-header buffers are spread over cores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileHeaderStrategy {
    /// Every worker on a chip gets a buffer for every tile size used on
    /// that chip.
    #[default]
    ChipWide,

    /// Each core only gets the tile sizes it uses.
    PerCore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    /// Regular expression matched against entity names.
    pub regex: String,
    pub level: log::Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Largest overlay blob growth allowed beyond the minimum blob size. Used
    /// when a blob reservation does not give an explicit size.
    pub overlay_max_extra_blob_size: u32,

    pub tile_header_strategy: TileHeaderStrategy,

    pub log_level: log::Level,

    /// First matching filter wins.
    pub log_filters: Vec<LogFilter>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            overlay_max_extra_blob_size: 0,
            tile_header_strategy: TileHeaderStrategy::default(),
            log_level: log::Level::Warn,
            log_filters: Vec::new(),
        }
    }
}

impl ResourceConfig {
    /// Load the configuration, merging `conf_file` if given.
    pub fn load(conf_file: Option<&Path>) -> ResourceResult<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(ResourceConfig::default()));

        if let Some(conf_file) = conf_file {
            if conf_file.is_dir() {
                return Err(ResourceError::Config(format!(
                    "{} is not a file path",
                    conf_file.display()
                )));
            }
            if !conf_file.exists() {
                return Err(ResourceError::Config(format!(
                    "{} not found",
                    conf_file.display()
                )));
            }
            figment = figment.merge(Toml::file(conf_file));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ResourceError::Config(format!("Invalid configuration: {e}")))
    }
}

/// Create a [`Tracker`] printing to `stdout` with the configured levels.
pub fn create_tracker(config: &ResourceConfig) -> ResourceResult<Tracker> {
    let mut entity_manager = EntityManager::new(config.log_level);
    for filter in &config.log_filters {
        entity_manager
            .add_log_filter(&filter.regex, filter.level)
            .map_err(|e| {
                ResourceError::Config(format!("Invalid log filter '{}': {e}", filter.regex))
            })?;
    }

    let writer = Box::new(BufWriter::new(std::io::stdout()));
    let tracker: Tracker = Arc::new(TextTracker::new(entity_manager, writer));
    Ok(tracker)
}
