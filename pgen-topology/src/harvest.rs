// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Translation between harvested and unharvested core coordinates.
//!
//! Harvested chips use a translated coordinate system starting at
//! [`HARVESTED_TRANSLATION_OFFSET`]. The ethernet rows come first, followed
//! by the remaining rows in order. The DRAM column is removed from the x axis.

use crate::Topology;
use crate::types::{ChipId, CoreLocation, TopologyError};

/// Grid size that marks a descriptor as using translated coordinates.
pub const HARVESTED_GRID_SIZE: usize = 32;

pub const HARVESTED_TRANSLATION_OFFSET: usize = 16;

/// Column occupied by DRAM cores in the unharvested grid.
pub const DRAM_CORES_COLUMN: usize = 5;

pub const ETH_CORES_FIRST_ROW: usize = 0;
pub const ETH_CORES_SECOND_ROW: usize = 6;

impl Topology {
    pub fn is_harvested_chip_with_noc_translation(
        &self,
        chip_id: ChipId,
    ) -> Result<bool, TopologyError> {
        let grid = self.descriptor(chip_id)?.grid;
        let is_harvested_descriptor =
            grid.x_size == HARVESTED_GRID_SIZE && grid.y_size == HARVESTED_GRID_SIZE;
        Ok(is_harvested_descriptor && self.device_arch().supports_noc_translation())
    }

    pub fn harvested_to_unharvested(
        &self,
        harvested: CoreLocation,
    ) -> Result<CoreLocation, TopologyError> {
        if !self.is_harvested_chip_with_noc_translation(harvested.chip)? {
            return Ok(harvested);
        }

        let mut x = harvested.x.saturating_sub(HARVESTED_TRANSLATION_OFFSET);
        if x <= DRAM_CORES_COLUMN {
            x = x.saturating_sub(1);
        }

        let y = if harvested.y == HARVESTED_TRANSLATION_OFFSET {
            ETH_CORES_FIRST_ROW
        } else if harvested.y == HARVESTED_TRANSLATION_OFFSET + 1 {
            ETH_CORES_SECOND_ROW
        } else {
            let y = harvested.y.saturating_sub(HARVESTED_TRANSLATION_OFFSET);
            if y <= ETH_CORES_SECOND_ROW {
                y.saturating_sub(1)
            } else {
                y
            }
        };

        Ok(harvested.with_xy(x, y))
    }

    pub fn unharvested_to_harvested(
        &self,
        unharvested: CoreLocation,
    ) -> Result<CoreLocation, TopologyError> {
        if !self.is_harvested_chip_with_noc_translation(unharvested.chip)? {
            return Ok(unharvested);
        }

        let mut x = unharvested.x + HARVESTED_TRANSLATION_OFFSET;
        if unharvested.x < DRAM_CORES_COLUMN {
            x += 1;
        }

        let y = if unharvested.y == ETH_CORES_FIRST_ROW {
            HARVESTED_TRANSLATION_OFFSET
        } else if unharvested.y == ETH_CORES_SECOND_ROW {
            HARVESTED_TRANSLATION_OFFSET + 1
        } else if unharvested.y < ETH_CORES_SECOND_ROW {
            unharvested.y + HARVESTED_TRANSLATION_OFFSET + 1
        } else {
            unharvested.y + HARVESTED_TRANSLATION_OFFSET
        };

        Ok(unharvested.with_xy(x, y))
    }
}
