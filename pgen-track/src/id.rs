// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Entity identifiers.

use std::fmt;

/// Identifies one [`Entity`](crate::entity::Entity) within a tracker.
///
/// [`NO_ID`](crate::NO_ID) and [`ROOT`](crate::ROOT) are reserved.
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
