// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Named nodes of the logging hierarchy.

use std::fmt;
use std::sync::Arc;

use crate::{Id, Tracker};

const SEPARATOR: &str = "::";

/// A named source of log messages.
///
/// Only the entity returned by [`toplevel`] has no parent. The full name is
/// registered with the tracker when the entity is created so that log
/// filters are resolved once.
pub struct Entity {
    /// Local name, unique among siblings.
    pub name: String,

    /// `None` only for the root.
    pub parent: Option<Arc<Entity>>,

    /// Id used to tag and filter this entity's messages.
    pub id: Id,

    /// Where messages are sent. Shared with the whole hierarchy.
    pub tracker: Tracker,

    full_name: String,
}

impl Entity {
    /// Create a child of `parent` that logs to the parent's tracker.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        let full_name = format!("{}{SEPARATOR}{name}", parent.full_name);
        let tracker = parent.tracker.clone();
        let id = tracker.unique_id();
        tracker.add_entity(id, &full_name);

        Self {
            name: name.to_string(),
            parent: Some(Arc::clone(parent)),
            id,
            tracker,
            full_name,
        }
    }

    /// Create a shared child of `self`.
    #[must_use]
    pub fn child(self: &Arc<Self>, name: &str) -> Arc<Entity> {
        Arc::new(Entity::new(self, name))
    }

    /// The names of all ancestors and this entity, joined by `::`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("full_name", &self.full_name)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Create the root of an entity hierarchy.
pub fn toplevel(tracker: &Tracker, name: &str) -> Arc<Entity> {
    let id = tracker.unique_id();
    tracker.add_entity(id, name);
    Arc::new(Entity {
        name: name.to_string(),
        parent: None,
        id,
        tracker: Arc::clone(tracker),
        full_name: name.to_string(),
    })
}
