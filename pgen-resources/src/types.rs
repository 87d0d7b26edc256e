// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::error::Error;
use std::fmt;

use pgen_topology::types::{CoreLocation, TopologyError};

/// Identifier of a NoC stream, unique within one core.
pub type StreamId = u32;

/// A logical kernel operand index.
pub type OperandId = u32;

/// The kinds of per-core resource reported in allocation errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoreResourceType {
    GatherMulticastStreams,
    EthernetStreams,
    GeneralPurposeStreams,
    PackerStreams,
    UnpackerStreams,
    IntermediateStreams,
    PackerMulticastStreams,
    KernelInputIndex,
    KernelOutputIndex,
    L1DataBuffersMemory,
}

impl fmt::Display for CoreResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoreResourceType::GatherMulticastStreams => "gather/multicast streams",
            CoreResourceType::EthernetStreams => "ethernet streams",
            CoreResourceType::GeneralPurposeStreams => "general purpose streams",
            CoreResourceType::PackerStreams => "packer streams",
            CoreResourceType::UnpackerStreams => "unpacker streams",
            CoreResourceType::IntermediateStreams => "intermediate streams",
            CoreResourceType::PackerMulticastStreams => "packer multicast streams",
            CoreResourceType::KernelInputIndex => "kernel input indexes",
            CoreResourceType::KernelOutputIndex => "kernel output indexes",
            CoreResourceType::L1DataBuffersMemory => "L1 data buffers memory",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A pool, counter or the L1 arena of a core is exhausted.
    OutOfResources {
        location: CoreLocation,
        resource: CoreResourceType,
        capacity: u64,
        used: u64,
        details: String,
    },

    /// An operand's stream has already been handed out on this core.
    IllegalReallocation {
        location: CoreLocation,
        resource: CoreResourceType,
        operand_id: OperandId,
    },

    /// An operand is outside the window valid for the requested role.
    InvalidOperand {
        location: CoreLocation,
        resource: CoreResourceType,
        operand_id: OperandId,
    },

    NoCoreAtLocation {
        location: CoreLocation,
    },

    /// The core type (or architecture) does not provide the resource.
    UnsupportedAllocation {
        location: CoreLocation,
        resource: CoreResourceType,
    },

    MissingTileHeaderBuffer {
        location: CoreLocation,
        tile_size: u32,
    },

    /// The overlay blob would move tile-header buffers already placed after it.
    LateOverlayBlob {
        location: CoreLocation,
    },

    NotImplemented(String),

    Config(String),

    Topology(TopologyError),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::OutOfResources {
                location,
                resource,
                capacity,
                used,
                details,
            } => {
                write!(
                    f,
                    "Error: Core {location} is out of {resource} (allocated {used} out of available {capacity})"
                )?;
                if !details.is_empty() {
                    write!(f, "\n{details}")?;
                }
                Ok(())
            }
            ResourceError::IllegalReallocation {
                location,
                resource,
                operand_id,
            } => write!(
                f,
                "Error: Core {location}: {resource} for operand {operand_id} already allocated"
            ),
            ResourceError::InvalidOperand {
                location,
                resource,
                operand_id,
            } => write!(
                f,
                "Error: Core {location}: operand {operand_id} is not valid for {resource}"
            ),
            ResourceError::NoCoreAtLocation { location } => {
                write!(f, "Error: There is no core at location {location}")
            }
            ResourceError::UnsupportedAllocation { location, resource } => {
                write!(f, "Error: Core {location} does not support {resource}")
            }
            ResourceError::MissingTileHeaderBuffer {
                location,
                tile_size,
            } => write!(
                f,
                "Error: Core {location}: tile header buffer for tile size {tile_size} is missing"
            ),
            ResourceError::LateOverlayBlob { location } => write!(
                f,
                "Error: Core {location}: extra overlay blob space requested after tile header buffers were placed behind it"
            ),
            ResourceError::NotImplemented(msg) => write!(f, "Error: {msg} is not implemented"),
            ResourceError::Config(msg) => write!(f, "Error: {msg}"),
            ResourceError::Topology(e) => e.fmt(f),
        }
    }
}

impl Error for ResourceError {}

impl From<TopologyError> for ResourceError {
    fn from(e: TopologyError) -> Self {
        ResourceError::Topology(e)
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Build an [`ResourceError::OutOfResources`] where the whole pool is used.
#[must_use]
pub fn pool_exhausted(
    location: CoreLocation,
    resource: CoreResourceType,
    capacity: u64,
) -> ResourceError {
    ResourceError::OutOfResources {
        location,
        resource,
        capacity,
        used: capacity,
        details: String::new(),
    }
}
