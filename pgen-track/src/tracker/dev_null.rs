// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A tracker that emits nothing.

use crate::tracker::Track;
use crate::{Id, NO_ID};

/// Discards every message. Nothing is ever enabled, so log arguments are
/// never formatted.
pub struct DevNullTracker;

impl Track for DevNullTracker {
    fn unique_id(&self) -> Id {
        NO_ID
    }

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        false
    }

    fn add_entity(&self, _id: Id, _entity_name: &str) {}

    fn log(&self, _id: Id, _level: log::Level, _msg: std::fmt::Arguments) {}

    fn shutdown(&self) {}
}
