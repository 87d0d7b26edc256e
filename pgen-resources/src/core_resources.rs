// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The allocator contract shared by every kind of core.
//!
//! Implementations supply the pool policies (how the next gather/multicast
//! and general purpose stream is chosen) and expose their
//! [`CoreResourcesState`]. Everything else is provided by the trait.

use std::collections::BTreeSet;
use std::sync::Arc;

use pgen_topology::arch::L1AddressMap;
use pgen_topology::types::CoreLocation;
use pgen_track::entity::Entity;
use pgen_track::{debug, error, trace};

use crate::constants::{MAX_KERNEL_INPUTS, MAX_KERNEL_OUTPUTS, operand_stream_id};
use crate::l1::{L1Arena, L1Buffer};
use crate::types::{
    CoreResourceType, OperandId, ResourceError, ResourceResult, StreamId, pool_exhausted,
};

/// State common to all core allocators.
pub struct CoreResourcesState {
    pub entity: Entity,
    location: CoreLocation,
    allocated_stream_ids: BTreeSet<StreamId>,
    pub(crate) general_purpose_cursor: StreamId,
    kernel_inputs: u32,
    kernel_outputs: u32,
    l1: L1Arena,
}

impl CoreResourcesState {
    pub fn new(
        parent: &Arc<Entity>,
        location: CoreLocation,
        first_general_purpose_stream: StreamId,
        address_map: &L1AddressMap,
        l1_size: u64,
    ) -> Self {
        let entity = Entity::new(parent, &format!("core_{}_{}", location.x, location.y));
        Self {
            entity,
            location,
            allocated_stream_ids: BTreeSet::new(),
            general_purpose_cursor: first_general_purpose_stream,
            kernel_inputs: 0,
            kernel_outputs: 0,
            l1: L1Arena::new(location, address_map, l1_size),
        }
    }

    #[must_use]
    pub fn location(&self) -> CoreLocation {
        self.location
    }

    #[must_use]
    pub fn is_stream_allocated(&self, stream_id: StreamId) -> bool {
        self.allocated_stream_ids.contains(&stream_id)
    }

    /// Log `err` against this core and return it.
    pub(crate) fn fail<T>(&self, err: ResourceError) -> ResourceResult<T> {
        error!(self.entity ; "{}", err);
        Err(err)
    }

    pub(crate) fn add_stream(&mut self, stream_id: StreamId, role: &str) {
        self.allocated_stream_ids.insert(stream_id);
        debug!(self.entity ; "allocated {} stream {}", role, stream_id);
    }

    /// Claim the stream dedicated to `operand_id`.
    pub(crate) fn allocate_operand_stream(
        &mut self,
        operand_id: OperandId,
        is_valid_operand: bool,
        resource: CoreResourceType,
    ) -> ResourceResult<StreamId> {
        if !is_valid_operand {
            return self.fail(ResourceError::InvalidOperand {
                location: self.location,
                resource,
                operand_id,
            });
        }
        self.claim_stream(operand_stream_id(operand_id), operand_id, resource)
    }

    /// Claim a specific stream, rejecting it if it is already taken.
    pub(crate) fn claim_stream(
        &mut self,
        stream_id: StreamId,
        operand_id: OperandId,
        resource: CoreResourceType,
    ) -> ResourceResult<StreamId> {
        if self.is_stream_allocated(stream_id) {
            return self.fail(ResourceError::IllegalReallocation {
                location: self.location,
                resource,
                operand_id,
            });
        }
        self.allocated_stream_ids.insert(stream_id);
        debug!(self.entity ; "allocated {} {} for operand {}", resource, stream_id, operand_id);
        Ok(stream_id)
    }

    pub(crate) fn exhausted<T>(
        &self,
        resource: CoreResourceType,
        capacity: u32,
    ) -> ResourceResult<T> {
        self.fail(pool_exhausted(self.location, resource, u64::from(capacity)))
    }

    fn log_l1_result<T>(&self, result: ResourceResult<T>) -> ResourceResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => self.fail(err),
        }
    }
}

pub trait CoreResources {
    fn state(&self) -> &CoreResourcesState;

    fn state_mut(&mut self) -> &mut CoreResourcesState;

    /// Pick the next free stream of the gather/multicast pool.
    fn next_gather_multicast_stream(&mut self) -> ResourceResult<StreamId>;

    /// Pick the next free stream of the general purpose pool.
    fn next_general_purpose_stream(&mut self) -> ResourceResult<StreamId>;

    /// The width of the gather/multicast pool.
    fn get_multicast_streams_count(&self) -> u32;

    fn location(&self) -> CoreLocation {
        self.state().location()
    }

    fn allocate_gather_stream(&mut self) -> ResourceResult<StreamId> {
        let stream_id = self.next_gather_multicast_stream()?;
        self.state_mut().add_stream(stream_id, "gather");
        Ok(stream_id)
    }

    fn allocate_multicast_stream(&mut self) -> ResourceResult<StreamId> {
        let stream_id = self.next_gather_multicast_stream()?;
        self.state_mut().add_stream(stream_id, "multicast");
        Ok(stream_id)
    }

    fn allocate_general_purpose_stream(&mut self) -> ResourceResult<StreamId> {
        let stream_id = self.next_general_purpose_stream()?;
        self.state_mut().add_stream(stream_id, "general purpose");
        Ok(stream_id)
    }

    fn allocate_kernel_input(&mut self) -> ResourceResult<u32> {
        let state = self.state_mut();
        if state.kernel_inputs >= MAX_KERNEL_INPUTS {
            return state.exhausted(CoreResourceType::KernelInputIndex, MAX_KERNEL_INPUTS);
        }
        let index = state.kernel_inputs;
        state.kernel_inputs += 1;
        trace!(state.entity ; "allocated kernel input {}", index);
        Ok(index)
    }

    fn allocate_kernel_output(&mut self) -> ResourceResult<u32> {
        let state = self.state_mut();
        if state.kernel_outputs >= MAX_KERNEL_OUTPUTS {
            return state.exhausted(CoreResourceType::KernelOutputIndex, MAX_KERNEL_OUTPUTS);
        }
        let index = state.kernel_outputs;
        state.kernel_outputs += 1;
        trace!(state.entity ; "allocated kernel output {}", index);
        Ok(index)
    }

    /// Allocate `size` bytes from the top of the L1 arena and return the
    /// buffer address.
    fn allocate_l1_data_buffer(&mut self, size: u64) -> ResourceResult<u64> {
        let state = self.state_mut();
        let result = state.l1.allocate_data_buffer(size);
        let address = state.log_l1_result(result)?;
        trace!(state.entity ; "allocated {} bytes of L1 at 0x{:x}", size, address);
        Ok(address)
    }

    fn allocate_l1_stream_buffer(
        &mut self,
        stream_id: StreamId,
        size: u64,
    ) -> ResourceResult<Option<u64>> {
        let state = self.state_mut();
        let result = state.l1.allocate_stream_buffer(stream_id, size);
        state.log_l1_result(result)
    }

    fn allocate_l1_ncrisc_fallback_buffer(&mut self, size: u64) -> ResourceResult<Option<u64>> {
        let state = self.state_mut();
        let result = state.l1.allocate_ncrisc_fallback_buffer(size);
        state.log_l1_result(result)
    }

    fn allocate_l1_extra_tile_headers_space(&mut self, count: u64) -> ResourceResult<()> {
        let state = self.state_mut();
        let result = state.l1.allocate_extra_tile_headers_space(count);
        state.log_l1_result(result)?;
        if count > 0 {
            debug!(state.entity ; "reserved space for {} extra tile headers", count);
        }
        Ok(())
    }

    /// Reserve extra overlay blob space and return the bytes reserved on this
    /// core, which is the earlier reservation if one exists.
    fn allocate_l1_extra_overlay_blob_space(&mut self, size: u64) -> ResourceResult<u64> {
        let state = self.state_mut();
        let already_reserved = state.l1.extra_overlay_blob_size();
        let result = state.l1.reserve_extra_overlay_blob(size);
        let reserved = state.log_l1_result(result)?;
        if already_reserved > 0 {
            debug!(state.entity ; "extra overlay blob space already reserved ({} bytes)", reserved);
        } else if reserved > 0 {
            debug!(state.entity ; "reserved {} bytes of extra overlay blob space", reserved);
        }
        Ok(reserved)
    }

    fn allocate_l1_tile_header_buffer(&mut self, tile_size: u32) -> ResourceResult<u64> {
        let state = self.state_mut();
        let result = state.l1.allocate_tile_header_buffer(tile_size);
        let address = state.log_l1_result(result)?;
        trace!(state.entity ; "tile header buffer for tile size {} at 0x{:x}", tile_size, address);
        Ok(address)
    }

    fn tile_header_buffer_address(&self, tile_size: u32) -> ResourceResult<u64> {
        self.state().l1.tile_header_buffer_address(tile_size)
    }

    fn check_if_out_of_l1_data_buffers_memory(&self) -> ResourceResult<()> {
        let state = self.state();
        state.log_l1_result(state.l1.check_budget())
    }

    fn allocated_stream_ids(&self) -> &BTreeSet<StreamId> {
        &self.state().allocated_stream_ids
    }

    fn l1(&self) -> &L1Arena {
        &self.state().l1
    }

    fn l1_buffers(&self) -> &[L1Buffer] {
        self.state().l1.buffers()
    }

    fn l1_allocation_info(&self) -> String {
        self.state().l1.allocation_info()
    }
}
