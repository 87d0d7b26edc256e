// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Architecture tags and the fixed per-architecture hardware constants.

use std::fmt;

use serde::Deserialize;

/// The hardware generation of a chip.
///
/// Descriptors may name the generation either by its generic tag or by its
/// product name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum DeviceArch {
    #[serde(rename = "gen1", alias = "GRAYSKULL", alias = "grayskull")]
    Gen1,
    #[serde(rename = "gen2", alias = "WORMHOLE", alias = "wormhole")]
    Gen2,
    #[serde(rename = "gen2b", alias = "WORMHOLE_B0", alias = "wormhole_b0")]
    Gen2B,
    #[serde(rename = "gen3", alias = "BLACKHOLE", alias = "blackhole")]
    Gen3,
}

impl fmt::Display for DeviceArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceArch::Gen1 => "gen1",
            DeviceArch::Gen2 => "gen2",
            DeviceArch::Gen2B => "gen2b",
            DeviceArch::Gen3 => "gen3",
        };
        write!(f, "{name}")
    }
}

/// Layout of the parts of a core's L1 that matter to the allocators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct L1AddressMap {
    /// First byte of the data-buffer arena.
    pub data_buffer_space_base: u32,

    /// One past the last usable byte of L1.
    pub max_size: u32,

    /// Size of the overlay blob that fits in its reserved region without
    /// taking arena space.
    pub overlay_blob_size: u32,

    /// Address reserved for the first tile-header buffer.
    pub predefined_tile_header_buffer_address: u32,
}

const WORKER_L1_GEN1: L1AddressMap = L1AddressMap {
    data_buffer_space_base: 0x3_3000,
    max_size: 1024 * 1024,
    overlay_blob_size: 64 * 1024 - 128,
    predefined_tile_header_buffer_address: 0x1_B000,
};

const WORKER_L1_GEN2: L1AddressMap = L1AddressMap {
    data_buffer_space_base: 0x3_3000,
    max_size: 1_499_136,
    overlay_blob_size: 64 * 1024 - 128,
    predefined_tile_header_buffer_address: 0x1_B000,
};

const WORKER_L1_GEN3: L1AddressMap = L1AddressMap {
    data_buffer_space_base: 0x3_3000,
    max_size: 1536 * 1024,
    overlay_blob_size: 64 * 1024 - 128,
    predefined_tile_header_buffer_address: 0x1_B000,
};

const ETHERNET_L1: L1AddressMap = L1AddressMap {
    data_buffer_space_base: 0x2_5000,
    max_size: 256 * 1024,
    overlay_blob_size: 32 * 1024 - 128,
    predefined_tile_header_buffer_address: 0x2_0000,
};

/// Number of bits used to identify a node (x or y) in a NoC address.
pub const NOC_ADDR_NODE_ID_BITS: u32 = 6;

impl DeviceArch {
    /// Number of bits of a NoC address used for the core-local offset.
    #[must_use]
    pub const fn noc_addr_local_bits(self) -> u32 {
        match self {
            DeviceArch::Gen1 => 32,
            DeviceArch::Gen2 | DeviceArch::Gen2B | DeviceArch::Gen3 => 36,
        }
    }

    /// Whether the NoC supports coordinate translation for harvested chips.
    #[must_use]
    pub const fn supports_noc_translation(self) -> bool {
        !matches!(self, DeviceArch::Gen1)
    }

    /// Whether host reads over PCIe need the ATU offset applied.
    #[must_use]
    pub const fn needs_pcie_host_address_offset(self) -> bool {
        matches!(self, DeviceArch::Gen2 | DeviceArch::Gen2B)
    }

    #[must_use]
    pub const fn worker_l1(self) -> L1AddressMap {
        match self {
            DeviceArch::Gen1 => WORKER_L1_GEN1,
            DeviceArch::Gen2 | DeviceArch::Gen2B => WORKER_L1_GEN2,
            DeviceArch::Gen3 => WORKER_L1_GEN3,
        }
    }

    #[must_use]
    pub const fn ethernet_l1(self) -> L1AddressMap {
        ETHERNET_L1
    }

    /// Pack a core coordinate and a local address into one NoC address.
    #[must_use]
    pub const fn noc_xy_address(self, x: usize, y: usize, addr: u64) -> u64 {
        let node = ((y as u64) << NOC_ADDR_NODE_ID_BITS) | x as u64;
        (node << self.noc_addr_local_bits()) | addr
    }
}
