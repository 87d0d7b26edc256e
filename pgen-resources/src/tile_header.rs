// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Strategies for placing tile-header buffers.
//!
//! A core needs one tile-header buffer per distinct tile size it sends or
//! receives. How the sizes are shared between cores is a policy choice,
//! selected by [`TileHeaderStrategy`].

use std::collections::BTreeSet;

use pgen_track::debug;

use crate::config::TileHeaderStrategy;
use crate::resource_manager::{CoreSizes, ResourceManager};
use crate::types::{ResourceError, ResourceResult};

pub trait TileHeaderBufferAllocator {
    /// Place the tile-header buffers of every core in `core_to_tile_sizes`.
    fn allocate(
        &self,
        manager: &mut ResourceManager,
        core_to_tile_sizes: &CoreSizes,
    ) -> ResourceResult<()>;
}

/// Every worker on a chip holds a buffer for each tile size used by any
/// worker of that chip, in ascending order of size. Ethernet cores only hold
/// their own sizes.
pub struct ChipWideTileSizes;

impl TileHeaderBufferAllocator for ChipWideTileSizes {
    fn allocate(
        &self,
        manager: &mut ResourceManager,
        core_to_tile_sizes: &CoreSizes,
    ) -> ResourceResult<()> {
        let chip_sizes = manager.worker_sizes_per_chip(core_to_tile_sizes)?;

        let workers: Vec<_> = manager.worker_core_resources().keys().copied().collect();
        for location in workers {
            let Some(sizes) = chip_sizes.get(&location.chip) else {
                continue;
            };
            for tile_size in sizes {
                manager.allocate_l1_tile_header_buffer(&location, *tile_size)?;
            }
        }

        for (location, sizes) in core_to_tile_sizes {
            if manager.is_ethernet_core(location) {
                for tile_size in sizes {
                    manager.allocate_l1_tile_header_buffer(location, *tile_size)?;
                }
            }
        }

        let num_sizes: usize = chip_sizes.values().map(BTreeSet::len).sum();
        debug!(manager.entity ; "placed tile header buffers for {} chip-wide tile sizes", num_sizes);
        Ok(())
    }
}

/// Each core only holds the sizes it uses.
pub struct PerCoreTileSizes;

impl TileHeaderBufferAllocator for PerCoreTileSizes {
    fn allocate(
        &self,
        _manager: &mut ResourceManager,
        _core_to_tile_sizes: &CoreSizes,
    ) -> ResourceResult<()> {
        Err(ResourceError::NotImplemented(
            "Per-core tile header buffer allocation".to_string(),
        ))
    }
}

#[must_use]
pub fn create_tile_header_buffer_allocator(
    strategy: TileHeaderStrategy,
) -> Box<dyn TileHeaderBufferAllocator> {
    match strategy {
        TileHeaderStrategy::ChipWide => Box::new(ChipWideTileSizes),
        TileHeaderStrategy::PerCore => Box::new(PerCoreTileSizes),
    }
}
