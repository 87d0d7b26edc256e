// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::error::Error;
use std::fmt;

/// Identifier of one chip in a (possibly multi-chip) system.
pub type ChipId = u32;

/// A physical core on a specific chip.
///
/// Used as the key into every per-core map, so it is cheap to copy and
/// totally ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreLocation {
    pub chip: ChipId,
    pub x: usize,
    pub y: usize,
}

impl CoreLocation {
    #[must_use]
    pub const fn new(chip: ChipId, x: usize, y: usize) -> Self {
        Self { chip, x, y }
    }

    #[must_use]
    pub const fn with_xy(self, x: usize, y: usize) -> Self {
        Self {
            chip: self.chip,
            x,
            y,
        }
    }
}

impl fmt::Display for CoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(chip={}, x={}, y={})", self.chip, self.x, self.y)
    }
}

/// A chip-relative `x-y` coordinate as it appears in a descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreCoord {
    pub x: usize,
    pub y: usize,
}

impl CoreCoord {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn on_chip(self, chip: ChipId) -> CoreLocation {
        CoreLocation::new(chip, self.x, self.y)
    }
}

impl fmt::Display for CoreCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A descriptor or manifest could not be read or understood.
    Parse(String),

    /// A logical worker coordinate does not map to any physical worker.
    NoPhysicalCore(CoreLocation),

    /// A chip that is not part of the topology was queried.
    UnknownChip(ChipId),

    /// An index (ethernet channel, DRAM channel/subchannel) is out of range.
    OutOfRange(String),
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::Parse(msg) => write!(f, "Error: {msg}"),
            TopologyError::NoPhysicalCore(logical) => write!(
                f,
                "Error: There is no physical worker core on logical location {logical}"
            ),
            TopologyError::UnknownChip(chip) => {
                write!(f, "Error: Expecting to find SoC descriptor for chip id {chip}")
            }
            TopologyError::OutOfRange(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl Error for TopologyError {}

/// Return a [`TopologyError::Parse`] wrapped in an `Err`.
#[macro_export]
macro_rules! topology_error {
    ($($arg:tt)+) => {
        Err($crate::types::TopologyError::Parse(format!($($arg)+)))
    };
}
