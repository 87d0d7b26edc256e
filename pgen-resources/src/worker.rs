// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;

use pgen_topology::arch::DeviceArch;
use pgen_topology::types::CoreLocation;
use pgen_track::entity::Entity;

use crate::constants::{
    INPUT_OPERANDS, INTERMEDIATE_OPERANDS, OUTPUT_OPERANDS, PACKER_MULTICAST_OPERANDS,
    WorkerStreamConstants,
};
use crate::core_resources::{CoreResources, CoreResourcesState};
use crate::types::{CoreResourceType, OperandId, ResourceError, ResourceResult, StreamId};

/// Allocator for a worker (compute) core.
///
/// Packer, unpacker and intermediate streams are fixed by operand. The
/// gather/multicast pool is shared with packer multicast, which takes IDs
/// from the top of the pool.
pub struct WorkerCoreResources {
    state: CoreResourcesState,
    constants: WorkerStreamConstants,
    gather_multicast_cursor: StreamId,
}

impl WorkerCoreResources {
    pub fn new(parent: &Arc<Entity>, location: CoreLocation, arch: DeviceArch, l1_size: u64) -> Self {
        let constants = WorkerStreamConstants::for_arch(arch);
        Self {
            state: CoreResourcesState::new(
                parent,
                location,
                constants.general_purpose.start,
                &arch.worker_l1(),
                l1_size,
            ),
            constants,
            gather_multicast_cursor: constants.gather_multicast.start,
        }
    }

    #[must_use]
    pub fn constants(&self) -> &WorkerStreamConstants {
        &self.constants
    }

    pub fn allocate_packer_stream(&mut self, operand_id: OperandId) -> ResourceResult<StreamId> {
        self.state.allocate_operand_stream(
            operand_id,
            OUTPUT_OPERANDS.contains(operand_id),
            CoreResourceType::PackerStreams,
        )
    }

    /// Input and intermediate operands are both read by the unpacker.
    pub fn allocate_unpacker_stream(&mut self, operand_id: OperandId) -> ResourceResult<StreamId> {
        self.state.allocate_operand_stream(
            operand_id,
            INPUT_OPERANDS.contains(operand_id) || INTERMEDIATE_OPERANDS.contains(operand_id),
            CoreResourceType::UnpackerStreams,
        )
    }

    pub fn allocate_intermediate_stream(
        &mut self,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        self.state.allocate_operand_stream(
            operand_id,
            INTERMEDIATE_OPERANDS.contains(operand_id),
            CoreResourceType::IntermediateStreams,
        )
    }

    /// Operand 16 maps to the top of the gather/multicast pool, 17 to the
    /// one below and so on.
    pub fn allocate_packer_multicast_stream(
        &mut self,
        operand_id: OperandId,
    ) -> ResourceResult<StreamId> {
        let resource = CoreResourceType::PackerMulticastStreams;
        if !self.constants.supports_packer_multicast {
            return self.state.fail(ResourceError::UnsupportedAllocation {
                location: self.state.location(),
                resource,
            });
        }
        if !PACKER_MULTICAST_OPERANDS.contains(operand_id) {
            return self.state.fail(ResourceError::InvalidOperand {
                location: self.state.location(),
                resource,
                operand_id,
            });
        }

        let stream_id =
            self.constants.gather_multicast.end - (operand_id - PACKER_MULTICAST_OPERANDS.start);
        self.state.claim_stream(stream_id, operand_id, resource)
    }
}

impl CoreResources for WorkerCoreResources {
    fn state(&self) -> &CoreResourcesState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreResourcesState {
        &mut self.state
    }

    /// Skips IDs already claimed by packer multicast.
    fn next_gather_multicast_stream(&mut self) -> ResourceResult<StreamId> {
        let pool = self.constants.gather_multicast;
        while self.gather_multicast_cursor <= pool.end {
            let stream_id = self.gather_multicast_cursor;
            self.gather_multicast_cursor += 1;
            if !self.state.is_stream_allocated(stream_id) {
                return Ok(stream_id);
            }
        }
        self.state
            .exhausted(CoreResourceType::GatherMulticastStreams, pool.width())
    }

    fn next_general_purpose_stream(&mut self) -> ResourceResult<StreamId> {
        let pool = self.constants.general_purpose;
        let stream_id = self.state.general_purpose_cursor;
        if stream_id > pool.end {
            return self
                .state
                .exhausted(CoreResourceType::GeneralPurposeStreams, pool.width());
        }
        self.state.general_purpose_cursor += 1;
        Ok(stream_id)
    }

    fn get_multicast_streams_count(&self) -> u32 {
        self.constants.gather_multicast.width()
    }
}
