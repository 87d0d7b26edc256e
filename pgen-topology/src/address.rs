// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! NoC and PCIe address arithmetic.

use crate::Topology;
use crate::types::{ChipId, CoreCoord, CoreLocation, TopologyError};

/// PCIe core used when a descriptor does not list any.
pub const DEFAULT_PCIE_CORE: CoreCoord = CoreCoord::new(0, 3);

/// Offset into the shared PCIe aperture for device-to-host windows.
pub const PCIE_DOWNSTREAM_OFFSET: u64 = 0x8000_0000;

/// Offset into the shared PCIe aperture for host-to-device windows.
pub const PCIE_UPSTREAM_OFFSET: u64 = 0x4000_0000;

/// Row stride used to turn a core coordinate into a TLB index.
pub const TLB_INDEX_CORE_Y_MULTIPLIER: u64 = 13;

/// Extra offset the PCIe ATU requires for host reads on gen2 parts.
pub const PCIE_HOST_NOC_ADDRESS_OFFSET: u64 = 0x8_0000_0000;

impl Topology {
    /// NoC address of `dram_buf_addr` within a DRAM bank.
    pub fn dram_buffer_noc_address(
        &self,
        dram_buf_addr: u64,
        chip_id: ChipId,
        channel: usize,
        subchannel: usize,
    ) -> Result<u64, TopologyError> {
        let dram = &self.descriptor(chip_id)?.dram;
        let core = dram
            .get(channel)
            .and_then(|subchannels| subchannels.get(subchannel))
            .ok_or_else(|| {
                TopologyError::OutOfRange(format!(
                    "No DRAM core for channel {channel}, subchannel {subchannel} on chip {chip_id}"
                ))
            })?;

        Ok(self.device_arch().noc_xy_address(core.x, core.y, dram_buf_addr))
    }

    /// The PCIe core used for all PCIe traffic of a chip.
    pub fn first_pcie_core(&self, chip_id: ChipId) -> Result<CoreLocation, TopologyError> {
        let pcie = &self.descriptor(chip_id)?.pcie;
        Ok(pcie.first().unwrap_or(&DEFAULT_PCIE_CORE).on_chip(chip_id))
    }

    pub fn buffer_noc_address_through_pcie(
        &self,
        pcie_buf_addr: u64,
        chip_id: ChipId,
    ) -> Result<u64, TopologyError> {
        let pcie_core = self.first_pcie_core(chip_id)?;
        Ok(self
            .device_arch()
            .noc_xy_address(pcie_core.x, pcie_core.y, pcie_buf_addr))
    }

    /// Like [`Topology::buffer_noc_address_through_pcie`] but for buffers in
    /// host memory, which on gen2 parts sit behind an extra ATU offset.
    pub fn host_noc_address_through_pcie(
        &self,
        host_pcie_buf_addr: u64,
        chip_id: ChipId,
    ) -> Result<u64, TopologyError> {
        let mut host_noc_address = self.buffer_noc_address_through_pcie(host_pcie_buf_addr, chip_id)?;
        if self.device_arch().needs_pcie_host_address_offset() {
            host_noc_address += PCIE_HOST_NOC_ADDRESS_OFFSET;
        }
        Ok(host_noc_address)
    }

    /// Strip the core coordinates from a DRAM NoC address.
    #[must_use]
    pub fn local_dram_buffer_noc_address(&self, dram_buf_noc_addr: u64) -> u64 {
        dram_buf_noc_addr & ((1u64 << self.device_arch().noc_addr_local_bits()) - 1)
    }

    /// Address of a core's L1 buffer as seen through the host PCIe aperture.
    #[must_use]
    pub fn local_pcie_buffer_address(
        &self,
        l1_buffer_address: u64,
        worker: &CoreLocation,
        is_pcie_downstream: bool,
    ) -> u64 {
        let window = if is_pcie_downstream {
            PCIE_DOWNSTREAM_OFFSET
        } else {
            PCIE_UPSTREAM_OFFSET
        };

        let tlb_index = worker.y as u64 * TLB_INDEX_CORE_Y_MULTIPLIER + worker.x as u64;
        let l1_window_size = u64::from(self.device_arch().worker_l1().max_size).next_power_of_two();

        l1_buffer_address + window + tlb_index * l1_window_size
    }
}
