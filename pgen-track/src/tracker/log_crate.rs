// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Forwarding to the `log` facade.

use simplelog::{ConfigBuilder, SimpleLogger};

use crate::Id;
use crate::tracker::{EntityManager, Track};

/// A tracker that forwards every enabled event to the
/// [log](https://docs.rs/log) facade.
///
/// The full entity name is used as the log target so that the installed
/// logger can be configured per entity.
pub struct LogTracker {
    entity_manager: EntityManager,
}

impl LogTracker {
    /// Create a new [`LogTracker`] with an [`EntityManager`].
    pub fn new(entity_manager: EntityManager) -> Self {
        Self { entity_manager }
    }
}

impl Track for LogTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        level <= log::max_level() && self.entity_manager.is_enabled(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        let target = self
            .entity_manager
            .entity_name(id)
            .unwrap_or_else(|| id.to_string());
        log::log!(target: target.as_str(), level, "{msg}");
    }

    fn shutdown(&self) {
        log::logger().flush();
    }
}

/// Install a [`SimpleLogger`] as the global `log` backend.
///
/// Only the first call in a process can succeed.
pub fn init_simple_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let config = ConfigBuilder::new().set_time_level(log::LevelFilter::Off).build();
    SimpleLogger::init(level, config)
}
