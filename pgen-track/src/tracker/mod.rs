// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The [`Track`] interface and the trackers that implement it.

pub mod dev_null;
pub mod log_crate;
pub mod text;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

pub use dev_null::DevNullTracker;
pub use log_crate::{LogTracker, init_simple_logger};
use regex::Regex;
pub use text::TextTracker;

use crate::{Id, ROOT};

/// Receiver of the messages of a hierarchy of entities.
pub trait Track {
    /// Hand out an id that has not been used by this tracker.
    fn unique_id(&self) -> Id;

    /// Whether a message from `id` at `level` would be emitted.
    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Register the full name of a new entity.
    fn add_entity(&self, id: Id, entity_name: &str);

    /// Emit one message.
    fn log(&self, msg_by: Id, level: log::Level, msg: std::fmt::Arguments);

    /// Flush buffered output.
    fn shutdown(&self);
}

/// A tracker shared by all the entities of a hierarchy.
pub type Tracker = Arc<dyn Track + Send + Sync>;

/// A [`TextTracker`] on `stdout` emitting messages at or above `level`.
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Arc::new(TextTracker::new(EntityManager::new(level), writer))
}

/// A tracker that emits nothing.
pub fn dev_null_tracker() -> Tracker {
    Arc::new(DevNullTracker)
}

struct Registered {
    name: String,
    level: log::Level,
}

/// Resolves the level of each entity from its name and hands out ids.
///
/// Used by the [`TextTracker`] and the [`LogTracker`].
pub struct EntityManager {
    default_level: log::Level,

    /// Checked in order, first match wins.
    filters: Vec<(Regex, log::Level)>,

    entities: RwLock<HashMap<Id, Registered>>,

    next_id: AtomicU64,
}

impl EntityManager {
    /// Entities not matched by any filter use `default_level`.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            entities: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(ROOT.0 + 1),
        }
    }

    /// Set the level of every entity whose full name matches `regex_str`.
    ///
    /// Filters only apply to entities registered after they are added.
    ///
    /// ```rust
    /// use pgen_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager.add_log_filter(".*chip0.*", log::Level::Trace).unwrap();
    /// ```
    pub fn add_log_filter(&mut self, regex_str: &str, level: log::Level) -> Result<(), regex::Error> {
        self.filters.push((Regex::new(regex_str)?, level));
        Ok(())
    }

    fn log_level_for(&self, entity_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|(regex, _)| regex.is_match(entity_name))
            .map_or(self.default_level, |(_, level)| *level)
    }

    pub(crate) fn unique_id(&self) -> Id {
        Id(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn add_entity(&self, id: Id, entity_name: &str) {
        let registered = Registered {
            name: entity_name.to_string(),
            level: self.log_level_for(entity_name),
        };
        if let Ok(mut entities) = self.entities.write() {
            entities.insert(id, registered);
        }
    }

    pub(crate) fn is_enabled(&self, id: Id, level: log::Level) -> bool {
        let max_level = self
            .entities
            .read()
            .ok()
            .and_then(|entities| entities.get(&id).map(|e| e.level))
            .unwrap_or(self.default_level);
        level <= max_level
    }

    pub(crate) fn entity_name(&self, id: Id) -> Option<String> {
        self.entities
            .read()
            .ok()
            .and_then(|entities| entities.get(&id).map(|e| e.name.clone()))
    }
}
