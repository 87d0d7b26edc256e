// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! One place to allocate every per-core resource of a system.
//!
//! The manager owns an allocator for each worker and ethernet core of each
//! chip and routes every request, addressed by core location, to it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pgen_topology::Topology;
use pgen_topology::types::{ChipId, CoreLocation};
use pgen_track::entity::{Entity, toplevel};
use pgen_track::{Tracker, debug, info};

use crate::config::ResourceConfig;
use crate::constants::OVERLAY_BLOB_PAGE_MASK;
use crate::core_resources::CoreResources;
use crate::ethernet::EthernetCoreResources;
use crate::l1::L1Buffer;
use crate::types::{CoreResourceType, OperandId, ResourceError, ResourceResult, StreamId};
use crate::worker::WorkerCoreResources;

/// Distinct message (tile) sizes required on each core.
pub type CoreSizes = BTreeMap<CoreLocation, BTreeSet<u32>>;

pub struct ResourceManager {
    pub entity: Arc<Entity>,
    topology: Topology,
    config: ResourceConfig,
    worker_cores: BTreeMap<CoreLocation, WorkerCoreResources>,
    ethernet_cores: BTreeMap<CoreLocation, EthernetCoreResources>,
}

impl ResourceManager {
    pub fn new(
        topology: Topology,
        config: ResourceConfig,
        tracker: &Tracker,
    ) -> ResourceResult<Self> {
        let entity = toplevel(tracker, "resources");
        let arch = topology.device_arch();

        let mut worker_cores = BTreeMap::new();
        let mut ethernet_cores = BTreeMap::new();
        for chip_id in topology.chip_ids() {
            let chip_entity = entity.child(&format!("chip{chip_id}"));

            let worker_l1_size = topology.worker_l1_size(chip_id)?;
            for location in topology.worker_cores(chip_id)? {
                worker_cores.insert(
                    location,
                    WorkerCoreResources::new(&chip_entity, location, arch, worker_l1_size),
                );
            }

            let ethernet_l1_size = topology.ethernet_l1_size(chip_id)?;
            for location in topology.ethernet_cores(chip_id)? {
                ethernet_cores.insert(
                    location,
                    EthernetCoreResources::new(&chip_entity, location, arch, ethernet_l1_size),
                );
            }
        }

        info!(entity ; "{} worker and {} ethernet cores on {} {} chips",
            worker_cores.len(), ethernet_cores.len(), topology.chip_ids().len(), arch);

        Ok(Self {
            entity,
            topology,
            config,
            worker_cores,
            ethernet_cores,
        })
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    #[must_use]
    pub fn is_worker_core(&self, location: &CoreLocation) -> bool {
        self.worker_cores.contains_key(location)
    }

    #[must_use]
    pub fn is_ethernet_core(&self, location: &CoreLocation) -> bool {
        self.ethernet_cores.contains_key(location)
    }

    #[must_use]
    pub fn worker_core_resources(&self) -> &BTreeMap<CoreLocation, WorkerCoreResources> {
        &self.worker_cores
    }

    #[must_use]
    pub fn ethernet_core_resources(&self) -> &BTreeMap<CoreLocation, EthernetCoreResources> {
        &self.ethernet_cores
    }

    /// The allocator of any core, workers first.
    pub fn core_resources(&self, location: &CoreLocation) -> ResourceResult<&dyn CoreResources> {
        if let Some(worker) = self.worker_cores.get(location) {
            return Ok(worker);
        }
        match self.ethernet_cores.get(location) {
            Some(ethernet) => Ok(ethernet),
            None => Err(ResourceError::NoCoreAtLocation {
                location: *location,
            }),
        }
    }

    fn core_resources_mut(
        &mut self,
        location: &CoreLocation,
    ) -> ResourceResult<&mut dyn CoreResources> {
        if let Some(worker) = self.worker_cores.get_mut(location) {
            return Ok(worker);
        }
        match self.ethernet_cores.get_mut(location) {
            Some(ethernet) => Ok(ethernet),
            None => Err(ResourceError::NoCoreAtLocation {
                location: *location,
            }),
        }
    }

    fn worker_mut(
        &mut self,
        location: &CoreLocation,
        resource: CoreResourceType,
    ) -> ResourceResult<&mut WorkerCoreResources> {
        if self.ethernet_cores.contains_key(location) {
            return Err(ResourceError::UnsupportedAllocation {
                location: *location,
                resource,
            });
        }
        self.worker_cores
            .get_mut(location)
            .ok_or(ResourceError::NoCoreAtLocation {
                location: *location,
            })
    }

    fn ethernet_mut(
        &mut self,
        location: &CoreLocation,
        resource: CoreResourceType,
    ) -> ResourceResult<&mut EthernetCoreResources> {
        if self.worker_cores.contains_key(location) {
            return Err(ResourceError::UnsupportedAllocation {
                location: *location,
                resource,
            });
        }
        self.ethernet_cores
            .get_mut(location)
            .ok_or(ResourceError::NoCoreAtLocation {
                location: *location,
            })
    }

    /// Ethernet cores have no operand-to-stream mapping, so their packers use
    /// the general purpose pool.
    pub fn allocate_packer_stream(
        &mut self,
        location: &CoreLocation,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        if let Some(ethernet) = self.ethernet_cores.get_mut(location) {
            return ethernet.allocate_general_purpose_stream();
        }
        self.worker_mut(location, CoreResourceType::PackerStreams)?
            .allocate_packer_stream(operand_id)
    }

    pub fn allocate_unpacker_stream(
        &mut self,
        location: &CoreLocation,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        self.worker_mut(location, CoreResourceType::UnpackerStreams)?
            .allocate_unpacker_stream(operand_id)
    }

    pub fn allocate_intermediate_stream(
        &mut self,
        location: &CoreLocation,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        self.worker_mut(location, CoreResourceType::IntermediateStreams)?
            .allocate_intermediate_stream(operand_id)
    }

    pub fn allocate_packer_multicast_stream(
        &mut self,
        location: &CoreLocation,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        self.worker_mut(location, CoreResourceType::PackerMulticastStreams)?
            .allocate_packer_multicast_stream(operand_id)
    }

    pub fn allocate_gather_stream(&mut self, location: &CoreLocation) -> ResourceResult<StreamId> {
        self.core_resources_mut(location)?.allocate_gather_stream()
    }

    pub fn allocate_multicast_stream(
        &mut self,
        location: &CoreLocation,
    ) -> ResourceResult<StreamId> {
        self.core_resources_mut(location)?.allocate_multicast_stream()
    }

    pub fn allocate_general_purpose_stream(
        &mut self,
        location: &CoreLocation,
    ) -> ResourceResult<StreamId> {
        self.core_resources_mut(location)?
            .allocate_general_purpose_stream()
    }

    pub fn allocate_ethernet_stream(&mut self, location: &CoreLocation) -> ResourceResult<StreamId> {
        self.ethernet_mut(location, CoreResourceType::EthernetStreams)?
            .allocate_ethernet_stream()
    }

    pub fn allocate_kernel_input(&mut self, location: &CoreLocation) -> ResourceResult<u32> {
        self.core_resources_mut(location)?.allocate_kernel_input()
    }

    pub fn allocate_kernel_output(&mut self, location: &CoreLocation) -> ResourceResult<u32> {
        self.core_resources_mut(location)?.allocate_kernel_output()
    }

    pub fn allocate_l1_data_buffer(
        &mut self,
        location: &CoreLocation,
        size: u64,
    ) -> ResourceResult<u64> {
        self.core_resources_mut(location)?
            .allocate_l1_data_buffer(size)
    }

    /// Returns `None` for an empty buffer.
    pub fn allocate_l1_stream_buffer(
        &mut self,
        location: &CoreLocation,
        stream_id: StreamId,
        size: u64,
    ) -> ResourceResult<Option<u64>> {
        self.core_resources_mut(location)?
            .allocate_l1_stream_buffer(stream_id, size)
    }

    pub fn allocate_l1_ncrisc_fallback_buffer(
        &mut self,
        location: &CoreLocation,
        size: u64,
    ) -> ResourceResult<Option<u64>> {
        self.core_resources_mut(location)?
            .allocate_l1_ncrisc_fallback_buffer(size)
    }

    pub fn check_if_out_of_l1_data_buffers_memory(
        &self,
        location: &CoreLocation,
    ) -> ResourceResult<()> {
        self.core_resources(location)?
            .check_if_out_of_l1_data_buffers_memory()
    }

    pub fn get_multicast_streams_count(&self, location: &CoreLocation) -> ResourceResult<u32> {
        Ok(self.core_resources(location)?.get_multicast_streams_count())
    }

    /// Reserve room for extra tile headers on every core.
    ///
    /// Every worker on a chip gets one slot per distinct size used by any
    /// worker of that chip (less the one at the predefined address), so that
    /// all workers of a chip share one layout. Ethernet cores only get room
    /// for their own sizes.
    pub fn allocate_l1_extra_tile_headers_space(
        &mut self,
        core_to_msg_sizes: &CoreSizes,
    ) -> ResourceResult<()> {
        let chip_sizes = self.worker_sizes_per_chip(core_to_msg_sizes)?;

        for (location, worker) in &mut self.worker_cores {
            let num_sizes = chip_sizes.get(&location.chip).map_or(0, BTreeSet::len);
            worker.allocate_l1_extra_tile_headers_space(num_sizes.saturating_sub(1) as u64)?;
        }

        for (location, ethernet) in &mut self.ethernet_cores {
            let num_sizes = core_to_msg_sizes.get(location).map_or(0, BTreeSet::len);
            ethernet.allocate_l1_extra_tile_headers_space(num_sizes.saturating_sub(1) as u64)?;
        }
        Ok(())
    }

    /// Union of the sizes used by the worker cores of each chip.
    ///
    /// Fails if a location in `core_sizes` is neither a worker nor an
    /// ethernet core.
    pub(crate) fn worker_sizes_per_chip(
        &self,
        core_sizes: &CoreSizes,
    ) -> ResourceResult<BTreeMap<ChipId, BTreeSet<u32>>> {
        let mut chip_sizes: BTreeMap<ChipId, BTreeSet<u32>> = BTreeMap::new();
        for (location, sizes) in core_sizes {
            if self.is_worker_core(location) {
                chip_sizes
                    .entry(location.chip)
                    .or_default()
                    .extend(sizes.iter().copied());
            } else if !self.is_ethernet_core(location) {
                return Err(ResourceError::NoCoreAtLocation {
                    location: *location,
                });
            }
        }
        Ok(chip_sizes)
    }

    /// Reserve the part of an overlay blob that does not fit in the space
    /// set aside for it, rounded down to whole 4 KiB pages.
    ///
    /// A `blob_size` of zero means the largest blob the configuration allows.
    /// Returns the extra bytes reserved on the core, which is the earlier
    /// reservation if the core already has one.
    pub fn allocate_l1_extra_overlay_blob_space(
        &mut self,
        location: &CoreLocation,
        blob_size: u32,
    ) -> ResourceResult<u32> {
        let arch = self.topology.device_arch();
        let min_blob_size = if self.is_ethernet_core(location) {
            arch.ethernet_l1().overlay_blob_size
        } else {
            arch.worker_l1().overlay_blob_size
        };

        let blob_size = if blob_size == 0 {
            min_blob_size
                .checked_add(self.config.overlay_max_extra_blob_size)
                .ok_or_else(|| {
                    ResourceError::Config(format!(
                        "overlay_max_extra_blob_size {} is too large",
                        self.config.overlay_max_extra_blob_size
                    ))
                })?
        } else {
            blob_size
        };

        let core = self.core_resources_mut(location)?;
        if blob_size <= min_blob_size {
            return Ok(0);
        }

        let extra_blob_size = (blob_size - min_blob_size) & OVERLAY_BLOB_PAGE_MASK;
        let reserved = core.allocate_l1_extra_overlay_blob_space(u64::from(extra_blob_size))?;
        Ok(u32::try_from(reserved).unwrap_or(extra_blob_size))
    }

    pub fn allocate_l1_tile_header_buffer(
        &mut self,
        location: &CoreLocation,
        tile_size: u32,
    ) -> ResourceResult<u64> {
        self.core_resources_mut(location)?
            .allocate_l1_tile_header_buffer(tile_size)
    }

    pub fn tile_header_buffer_address(
        &self,
        location: &CoreLocation,
        tile_size: u32,
    ) -> ResourceResult<u64> {
        self.core_resources(location)?
            .tile_header_buffer_address(tile_size)
    }

    pub fn allocated_stream_ids(
        &self,
        location: &CoreLocation,
    ) -> ResourceResult<&BTreeSet<StreamId>> {
        Ok(self.core_resources(location)?.allocated_stream_ids())
    }

    pub fn l1_buffers(&self, location: &CoreLocation) -> ResourceResult<&[L1Buffer]> {
        Ok(self.core_resources(location)?.l1_buffers())
    }

    /// Check the L1 budget of every core.
    pub fn check_all_l1_budgets(&self) -> ResourceResult<()> {
        for worker in self.worker_cores.values() {
            worker.check_if_out_of_l1_data_buffers_memory()?;
        }
        for ethernet in self.ethernet_cores.values() {
            ethernet.check_if_out_of_l1_data_buffers_memory()?;
        }
        debug!(self.entity ; "all L1 budgets are within limits");
        Ok(())
    }
}
