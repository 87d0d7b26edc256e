// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::sync::Arc;

use pgen_topology::arch::DeviceArch;
use pgen_topology::types::CoreLocation;
use pgen_track::debug;
use pgen_track::entity::Entity;

use crate::constants::{ETHERNET_STREAMS, EthernetStreamConstants};
use crate::core_resources::{CoreResources, CoreResourcesState};
use crate::types::{CoreResourceType, ResourceResult, StreamId};

/// Allocator for an ethernet (chip-to-chip) core.
pub struct EthernetCoreResources {
    state: CoreResourcesState,
    constants: EthernetStreamConstants,
    gather_multicast_cursor: StreamId,
    ethernet_cursor: StreamId,
}

impl EthernetCoreResources {
    pub fn new(parent: &Arc<Entity>, location: CoreLocation, arch: DeviceArch, l1_size: u64) -> Self {
        let constants = ETHERNET_STREAMS;
        Self {
            state: CoreResourcesState::new(
                parent,
                location,
                constants.general_purpose_upper().start,
                &arch.ethernet_l1(),
                l1_size,
            ),
            constants,
            gather_multicast_cursor: constants.gather_multicast.start,
            ethernet_cursor: constants.ethernet.start,
        }
    }

    #[must_use]
    pub fn constants(&self) -> &EthernetStreamConstants {
        &self.constants
    }

    /// Use the ethernet pool, then fall back to the gather/multicast pool.
    pub fn allocate_ethernet_stream(&mut self) -> ResourceResult<StreamId> {
        let stream_id = if self.ethernet_cursor <= self.constants.ethernet.end {
            let stream_id = self.ethernet_cursor;
            self.ethernet_cursor += 1;
            stream_id
        } else if self.gather_multicast_cursor <= self.constants.gather_multicast.end {
            debug!(self.state.entity ; "ethernet pool full, using the gather/multicast pool");
            self.next_gather_multicast_stream()?
        } else {
            let capacity = self.constants.ethernet.width() + self.constants.gather_multicast.width();
            return self
                .state
                .exhausted(CoreResourceType::EthernetStreams, capacity);
        };

        self.state.add_stream(stream_id, "ethernet");
        Ok(stream_id)
    }
}

impl CoreResources for EthernetCoreResources {
    fn state(&self) -> &CoreResourcesState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreResourcesState {
        &mut self.state
    }

    fn next_gather_multicast_stream(&mut self) -> ResourceResult<StreamId> {
        let pool = self.constants.gather_multicast;
        let stream_id = self.gather_multicast_cursor;
        if stream_id > pool.end {
            return self
                .state
                .exhausted(CoreResourceType::GatherMulticastStreams, pool.width());
        }
        self.gather_multicast_cursor += 1;
        Ok(stream_id)
    }

    /// Runs above the ethernet pool first, then wraps to just above the
    /// gather/multicast pool. Reaching the ethernet pool means exhausted.
    fn next_general_purpose_stream(&mut self) -> ResourceResult<StreamId> {
        let stream_id = self.state.general_purpose_cursor;
        if stream_id == self.constants.ethernet.start {
            return self.state.exhausted(
                CoreResourceType::GeneralPurposeStreams,
                self.constants.general_purpose_width(),
            );
        }

        self.state.general_purpose_cursor =
            if stream_id == self.constants.general_purpose_upper().end {
                self.constants.general_purpose_lower().start
            } else {
                stream_id + 1
            };
        Ok(stream_id)
    }

    fn get_multicast_streams_count(&self) -> u32 {
        self.constants.gather_multicast.width()
    }
}
