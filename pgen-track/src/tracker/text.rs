// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Plain text output.

use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::tracker::{EntityManager, Track};
use crate::{Id, SharedWriter, Writer};

/// Writes one `"<id>:<LEVEL>: [<entity>] <message>"` line per message.
pub struct TextTracker {
    entity_manager: EntityManager,
    writer: SharedWriter,
}

impl TextTracker {
    /// Write the messages enabled by `entity_manager` to `writer`.
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

// Write errors are ignored.
impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_enabled(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
    }

    fn log(&self, id: Id, level: log::Level, msg: std::fmt::Arguments) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        let _ = match self.entity_manager.entity_name(id) {
            Some(name) => writeln!(writer, "{id}:{level}: [{name}] {msg}"),
            None => writeln!(writer, "{id}:{level}: {msg}"),
        };
    }

    fn shutdown(&self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
