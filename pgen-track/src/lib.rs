// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Entity-scoped logging for the allocators.
//!
//! Every allocator owns an [`Entity`](crate::entity::Entity) whose
//! hierarchical name (for example `resources::chip0::core_1_1`) is used to
//! decide which messages are emitted. The messages themselves go to a
//! [`Tracker`]:
//!
//!   - [`TextTracker`](crate::tracker::TextTracker) writes lines to any
//!     [`Writer`].
//!   - [`LogTracker`](crate::tracker::LogTracker) hands them to the
//!     [log](https://docs.rs/log) facade.
//!   - [`DevNullTracker`](crate::tracker::DevNullTracker) drops them.

#![warn(missing_docs)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub use log;

pub mod entity;
pub mod id;
pub mod test_helpers;
pub mod tracker;

pub use id::Id;
pub use tracker::{Track, Tracker};

/// Destination of text log lines. Must be `Send` to be shared by trackers.
pub type Writer = Box<dyn std::io::Write + Send>;
type SharedWriter = Arc<Mutex<Writer>>;

/// Id that no entity is given.
pub const NO_ID: Id = Id(0);

/// Id of the first top-level entity of a tracker.
pub const ROOT: Id = Id(1);

/// Parse a level name, case-insensitively. Anything unknown is `Warn`.
#[must_use]
pub fn str_to_level(lvl: &str) -> log::Level {
    log::Level::from_str(lvl).unwrap_or(log::Level::Warn)
}

/// Emit a message for an entity at a given level.
///
/// Formatting only happens when the entity is enabled at that level.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => {{
        let entity = &$entity;
        let level = $lvl;
        if entity.tracker.is_entity_enabled(entity.id, level) {
            entity.tracker.log(entity.id, level, format_args!($($arg)+));
        }
    }};
}

/// [`log_base`] at `Trace`.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+)
    };
}

/// [`log_base`] at `Debug`.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+)
    };
}

/// [`log_base`] at `Info`.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+)
    };
}

/// [`log_base`] at `Warn`.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+)
    };
}

/// [`log_base`] at `Error`.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+)
    };
}
