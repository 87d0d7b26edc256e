// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Nearest-DRAM-bank lookups used when laying out per-bank buffers.

use std::collections::BTreeMap;

use crate::Topology;
use crate::types::{ChipId, CoreLocation, TopologyError};

fn manhattan_distance(a: &CoreLocation, b: &CoreLocation) -> usize {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

impl Topology {
    /// Return the first-subchannel DRAM core closest to `worker`.
    ///
    /// Only DRAM cores above and to the left of the worker replace the
    /// default choice (the first channel). DRAM cores are described in
    /// unharvested coordinates, so the worker is converted first.
    pub fn nearest_dram_core(&self, worker: CoreLocation) -> Result<CoreLocation, TopologyError> {
        let dram_cores = self.dram_cores_of_first_subchannel(worker.chip)?;
        let worker_location = self.harvested_to_unharvested(worker)?;

        let Some(mut nearest) = dram_cores.first().copied() else {
            return Err(TopologyError::OutOfRange(format!(
                "Chip {} has no DRAM cores",
                worker.chip
            )));
        };

        for dram_core in &dram_cores {
            let is_upper_left = dram_core.x <= worker_location.x && dram_core.y <= worker_location.y;
            if is_upper_left
                && manhattan_distance(dram_core, &worker_location)
                    < manhattan_distance(&nearest, &worker_location)
            {
                nearest = *dram_core;
            }
        }

        Ok(nearest)
    }

    /// Group the workers of a chip by their nearest DRAM core.
    pub fn map_workers_to_dram_banks(
        &self,
        chip_id: ChipId,
    ) -> Result<BTreeMap<CoreLocation, Vec<CoreLocation>>, TopologyError> {
        let mut workers_per_bank: BTreeMap<CoreLocation, Vec<CoreLocation>> = BTreeMap::new();
        for worker in self.worker_cores(chip_id)? {
            let dram_core = self.nearest_dram_core(worker)?;
            workers_per_bank.entry(dram_core).or_default().push(worker);
        }
        Ok(workers_per_bank)
    }
}
