// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Numeric contracts shared with the firmware.

use pgen_topology::arch::DeviceArch;

use crate::types::{OperandId, StreamId};

/// An inclusive range of IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdRange {
    pub start: u32,
    pub end: u32,
}

impl IdRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.end - self.start + 1
    }

    #[must_use]
    pub const fn contains(&self, id: u32) -> bool {
        self.start <= id && id <= self.end
    }
}

/// Dedicated streams are at a fixed offset from their operand.
pub const OPERAND_STREAM_OFFSET: StreamId = 8;

#[must_use]
pub const fn operand_stream_id(operand_id: OperandId) -> StreamId {
    OPERAND_STREAM_OFFSET + operand_id
}

pub const INPUT_OPERANDS: IdRange = IdRange::new(0, 7);
pub const OUTPUT_OPERANDS: IdRange = IdRange::new(16, 23);
pub const INTERMEDIATE_OPERANDS: IdRange = IdRange::new(24, 31);

/// Output operands that may be multicast directly by the packer.
pub const PACKER_MULTICAST_OPERANDS: IdRange = IdRange::new(16, 19);

pub const MAX_KERNEL_INPUTS: u32 = 24;
pub const MAX_KERNEL_OUTPUTS: u32 = 24;

pub const TILE_HEADER_SIZE_BYTES: u64 = 16;
pub const GENERAL_MAX_NUM_TILES_PER_PHASE: u64 = 2048;
pub const TILE_HEADER_BUFFER_SIZE_BYTES: u64 =
    TILE_HEADER_SIZE_BYTES * GENERAL_MAX_NUM_TILES_PER_PHASE;

/// Bytes at the top of L1 that are never handed to data buffers.
pub const UNUSED_DATA_BUFFERS_SPACE_BYTES: u64 = 0;

/// Extra overlay blob space is reserved in whole 4 KiB pages.
pub const OVERLAY_BLOB_PAGE_MASK: u32 = !0xFFF;

/// Stream pools of a worker core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerStreamConstants {
    pub gather_multicast: IdRange,
    pub supports_packer_multicast: bool,
    pub general_purpose: IdRange,
    pub noc_num_streams: u32,
}

const WORKER_STREAMS_GEN1: WorkerStreamConstants = WorkerStreamConstants {
    gather_multicast: IdRange::new(0, 2),
    supports_packer_multicast: false,
    general_purpose: IdRange::new(40, 63),
    noc_num_streams: 64,
};

const WORKER_STREAMS_GEN2: WorkerStreamConstants = WorkerStreamConstants {
    gather_multicast: IdRange::new(0, 3),
    supports_packer_multicast: true,
    general_purpose: IdRange::new(40, 63),
    noc_num_streams: 64,
};

impl WorkerStreamConstants {
    /// Gen3 follows the gen2 stream policy.
    #[must_use]
    pub const fn for_arch(arch: DeviceArch) -> Self {
        match arch {
            DeviceArch::Gen1 => WORKER_STREAMS_GEN1,
            DeviceArch::Gen2 | DeviceArch::Gen2B | DeviceArch::Gen3 => WORKER_STREAMS_GEN2,
        }
    }
}

/// Stream pools of an ethernet core.
///
/// The general purpose pool starts after the ethernet pool, runs to the top
/// of the stream space and then wraps to the IDs between the gather/multicast
/// and ethernet pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthernetStreamConstants {
    pub gather_multicast: IdRange,
    pub ethernet: IdRange,
    pub noc_num_streams: u32,
}

pub const ETHERNET_STREAMS: EthernetStreamConstants = EthernetStreamConstants {
    gather_multicast: IdRange::new(0, 3),
    ethernet: IdRange::new(9, 11),
    noc_num_streams: 32,
};

impl EthernetStreamConstants {
    /// The part of the general purpose pool above the ethernet pool.
    #[must_use]
    pub const fn general_purpose_upper(&self) -> IdRange {
        IdRange::new(self.ethernet.end + 1, self.noc_num_streams - 1)
    }

    /// The part of the general purpose pool below the ethernet pool.
    #[must_use]
    pub const fn general_purpose_lower(&self) -> IdRange {
        IdRange::new(self.gather_multicast.end + 1, self.ethernet.start - 1)
    }

    #[must_use]
    pub const fn general_purpose_width(&self) -> u32 {
        self.general_purpose_upper().width() + self.general_purpose_lower().width()
    }
}
