// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Immutable per-chip hardware facts.
//!
//! A [`Topology`] is loaded once from one or more SoC descriptors and then
//! answers questions about which cores exist on each chip, how logical worker
//! coordinates map to physical ones, how to build NoC addresses and how to
//! translate between harvested and unharvested coordinates.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::arch::DeviceArch;
use crate::descriptor::SocDescriptor;
use crate::types::{ChipId, CoreCoord, CoreLocation, TopologyError};

pub mod address;
pub mod arch;
pub mod descriptor;
pub mod dram;
pub mod harvest;
pub mod types;

/// First-line marker of a manifest file listing one descriptor per chip.
pub const MULTI_SOC_DESCRIPTORS_PREFIX: &str = "#multi_soc_descriptors";

/// One chip's descriptor plus the tables derived from it.
#[derive(Debug)]
struct ChipTopology {
    descriptor: SocDescriptor,
    logical_to_physical: HashMap<CoreCoord, CoreCoord>,
}

impl ChipTopology {
    fn new(descriptor: SocDescriptor) -> Self {
        let logical_to_physical = build_routing_map(&descriptor.functional_workers);
        Self {
            descriptor,
            logical_to_physical,
        }
    }
}

/// Logical worker coordinates are the ranks of the distinct physical x and y
/// values, so gaps (DRAM columns, ethernet rows, harvested rows) disappear.
fn build_routing_map(workers: &[CoreCoord]) -> HashMap<CoreCoord, CoreCoord> {
    let xs: Vec<usize> = workers.iter().map(|c| c.x).sorted().dedup().collect();
    let ys: Vec<usize> = workers.iter().map(|c| c.y).sorted().dedup().collect();

    let mut map = HashMap::new();
    for worker in workers {
        // Both searches succeed because the values were taken from `workers`.
        if let (Ok(lx), Ok(ly)) = (xs.binary_search(&worker.x), ys.binary_search(&worker.y)) {
            map.insert(CoreCoord::new(lx, ly), *worker);
        }
    }
    map
}

pub struct Topology {
    arch: DeviceArch,
    chips: BTreeMap<ChipId, ChipTopology>,
}

impl Topology {
    /// Load the topology for `chip_ids` from `path`.
    ///
    /// `path` is either a single descriptor shared by every chip, or a
    /// manifest whose first line contains [`MULTI_SOC_DESCRIPTORS_PREFIX`]
    /// followed by `<chip_id> <descriptor path>` lines. Relative descriptor
    /// paths in a manifest are resolved against the manifest's directory.
    pub fn from_file(path: &Path, chip_ids: &[ChipId]) -> Result<Self, TopologyError> {
        let descriptor_paths = descriptor_paths(path, chip_ids)?;

        let mut parsed: HashMap<PathBuf, SocDescriptor> = HashMap::new();
        let mut descriptors = BTreeMap::new();
        for (chip_id, descriptor_path) in descriptor_paths {
            if !parsed.contains_key(&descriptor_path) {
                let descriptor = read_descriptor(&descriptor_path)?;
                parsed.insert(descriptor_path.clone(), descriptor);
            }
            if let Some(descriptor) = parsed.get(&descriptor_path) {
                descriptors.insert(chip_id, descriptor.clone());
            }
        }

        Topology::build(descriptors)
    }

    /// Build a topology where every chip in `chip_ids` uses `descriptor`.
    pub fn from_string(descriptor: &str, chip_ids: &[ChipId]) -> Result<Self, TopologyError> {
        let descriptor = SocDescriptor::from_string(descriptor)
            .map_err(|e| TopologyError::Parse(format!("serde_yaml::from_str failed: {e}")))?;
        let descriptors = chip_ids
            .iter()
            .map(|chip_id| (*chip_id, descriptor.clone()))
            .collect();
        Topology::build(descriptors)
    }

    pub fn from_descriptors(
        descriptors: BTreeMap<ChipId, SocDescriptor>,
    ) -> Result<Self, TopologyError> {
        Topology::build(descriptors)
    }

    fn build(descriptors: BTreeMap<ChipId, SocDescriptor>) -> Result<Self, TopologyError> {
        let Some(first) = descriptors.values().next() else {
            return topology_error!("No SoC descriptor paths found");
        };
        let arch = first.arch_name;

        if let Some((chip_id, other)) = descriptors.iter().find(|(_, d)| d.arch_name != arch) {
            return topology_error!(
                "All chips must share one architecture: chip {chip_id} is {} but expected {arch}",
                other.arch_name
            );
        }

        let chips = descriptors
            .into_iter()
            .map(|(chip_id, descriptor)| (chip_id, ChipTopology::new(descriptor)))
            .collect();

        log::debug!("Loaded topology of {arch} chips");
        Ok(Self { arch, chips })
    }

    fn chip(&self, chip_id: ChipId) -> Result<&ChipTopology, TopologyError> {
        self.chips
            .get(&chip_id)
            .ok_or(TopologyError::UnknownChip(chip_id))
    }

    pub(crate) fn descriptor(&self, chip_id: ChipId) -> Result<&SocDescriptor, TopologyError> {
        Ok(&self.chip(chip_id)?.descriptor)
    }

    /// The architecture shared by all chips.
    #[must_use]
    pub fn device_arch(&self) -> DeviceArch {
        self.arch
    }

    /// All chip ids, in ascending order.
    #[must_use]
    pub fn chip_ids(&self) -> Vec<ChipId> {
        self.chips.keys().copied().collect()
    }

    pub fn worker_cores(&self, chip_id: ChipId) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.functional_workers))
    }

    pub fn ethernet_cores(&self, chip_id: ChipId) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.eth))
    }

    pub fn pcie_cores(&self, chip_id: ChipId) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.pcie))
    }

    pub fn arc_cores(&self, chip_id: ChipId) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.arc))
    }

    pub fn router_only_cores(&self, chip_id: ChipId) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.router_only))
    }

    pub fn harvested_worker_cores(
        &self,
        chip_id: ChipId,
    ) -> Result<Vec<CoreLocation>, TopologyError> {
        Ok(on_chip(chip_id, &self.descriptor(chip_id)?.harvested_workers))
    }

    /// DRAM cores grouped by channel, then subchannel.
    pub fn dram_cores(&self, chip_id: ChipId) -> Result<Vec<Vec<CoreLocation>>, TopologyError> {
        Ok(self
            .descriptor(chip_id)?
            .dram
            .iter()
            .map(|channel| on_chip(chip_id, channel))
            .collect())
    }

    pub fn dram_cores_of_first_subchannel(
        &self,
        chip_id: ChipId,
    ) -> Result<Vec<CoreLocation>, TopologyError> {
        let mut first_subchannels = Vec::new();
        for (channel, subchannels) in self.descriptor(chip_id)?.dram.iter().enumerate() {
            match subchannels.first() {
                Some(core) => first_subchannels.push(core.on_chip(chip_id)),
                None => {
                    return Err(TopologyError::OutOfRange(format!(
                        "DRAM channel {channel} on chip {chip_id} has no subchannels"
                    )));
                }
            }
        }
        Ok(first_subchannels)
    }

    pub fn ethernet_channel_core(
        &self,
        chip_id: ChipId,
        ethernet_channel: usize,
    ) -> Result<CoreLocation, TopologyError> {
        let eth = &self.descriptor(chip_id)?.eth;
        match eth.get(ethernet_channel) {
            Some(core) => Ok(core.on_chip(chip_id)),
            None => Err(TopologyError::OutOfRange(format!(
                "Ethernet channel {ethernet_channel} out of bounds (chip {chip_id} has {})",
                eth.len()
            ))),
        }
    }

    pub fn is_worker_core(&self, location: &CoreLocation) -> bool {
        self.descriptor(location.chip).is_ok_and(|d| {
            d.functional_workers
                .contains(&CoreCoord::new(location.x, location.y))
        })
    }

    pub fn is_ethernet_core(&self, location: &CoreLocation) -> bool {
        self.descriptor(location.chip)
            .is_ok_and(|d| d.eth.contains(&CoreCoord::new(location.x, location.y)))
    }

    /// Map a logical worker coordinate to the physical worker it names.
    pub fn logical_to_physical_worker_coords(
        &self,
        logical: CoreLocation,
    ) -> Result<CoreLocation, TopologyError> {
        let chip = self.chip(logical.chip)?;
        match chip
            .logical_to_physical
            .get(&CoreCoord::new(logical.x, logical.y))
        {
            Some(physical) => Ok(physical.on_chip(logical.chip)),
            None => Err(TopologyError::NoPhysicalCore(logical)),
        }
    }

    /// Inverse of [`Topology::logical_to_physical_worker_coords`].
    pub fn physical_to_logical_worker_coords(
        &self,
        physical: CoreLocation,
    ) -> Result<CoreLocation, TopologyError> {
        let chip = self.chip(physical.chip)?;
        let target = CoreCoord::new(physical.x, physical.y);
        chip.logical_to_physical
            .iter()
            .find(|(_, p)| **p == target)
            .map(|(logical, _)| logical.on_chip(physical.chip))
            .ok_or(TopologyError::NoPhysicalCore(physical))
    }

    #[must_use]
    pub fn grid_size(&self, chip_id: ChipId) -> Option<(usize, usize)> {
        self.descriptor(chip_id)
            .ok()
            .map(|d| (d.grid.x_size, d.grid.y_size))
    }

    /// Worker L1 size from the descriptor, falling back to the architecture.
    pub fn worker_l1_size(&self, chip_id: ChipId) -> Result<u64, TopologyError> {
        let descriptor = self.descriptor(chip_id)?;
        Ok(descriptor
            .worker_l1_size
            .unwrap_or(u64::from(self.arch.worker_l1().max_size)))
    }

    /// Ethernet L1 size from the descriptor, falling back to the architecture.
    pub fn ethernet_l1_size(&self, chip_id: ChipId) -> Result<u64, TopologyError> {
        let descriptor = self.descriptor(chip_id)?;
        Ok(descriptor
            .eth_l1_size
            .unwrap_or(u64::from(self.arch.ethernet_l1().max_size)))
    }

    pub fn dram_bank_size(&self, chip_id: ChipId) -> Result<Option<u64>, TopologyError> {
        Ok(self.descriptor(chip_id)?.dram_bank_size)
    }
}

impl Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Topology ({}):", self.arch)?;
        for (chip_id, chip) in &self.chips {
            let d = &chip.descriptor;
            writeln!(
                f,
                "  chip {chip_id}: {}x{} grid, {} workers, {} ethernet, {} DRAM channels, {} PCIe",
                d.grid.x_size,
                d.grid.y_size,
                d.functional_workers.len(),
                d.eth.len(),
                d.dram.len(),
                d.pcie.len()
            )?;
        }
        Ok(())
    }
}

fn on_chip(chip_id: ChipId, coords: &[CoreCoord]) -> Vec<CoreLocation> {
    coords.iter().map(|c| c.on_chip(chip_id)).collect()
}

fn read_descriptor(path: &Path) -> Result<SocDescriptor, TopologyError> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| TopologyError::Parse(format!("Unable to read {}: {e}", path.display())))?;
    SocDescriptor::from_string(&s).map_err(|e| {
        TopologyError::Parse(format!(
            "serde_yaml::from_str failed for {}: {e}",
            path.display()
        ))
    })
}

/// Work out which descriptor file describes each chip.
fn descriptor_paths(
    path: &Path,
    chip_ids: &[ChipId],
) -> Result<BTreeMap<ChipId, PathBuf>, TopologyError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| TopologyError::Parse(format!("Unable to read {}: {e}", path.display())))?;

    let mut lines = contents.lines();
    let first_line = lines.next().unwrap_or_default();

    let mut paths = BTreeMap::new();
    if first_line.contains(MULTI_SOC_DESCRIPTORS_PREFIX) {
        let base_dir = path.parent().unwrap_or(Path::new(""));
        for line in lines {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 2 {
                continue;
            }
            let chip_id: ChipId = parts[0].parse().map_err(|e| {
                TopologyError::Parse(format!(
                    "Invalid chip id '{}' in {}: {e}",
                    parts[0],
                    path.display()
                ))
            })?;
            let descriptor_path = Path::new(parts[1]);
            let descriptor_path = if descriptor_path.is_relative() {
                base_dir.join(descriptor_path)
            } else {
                descriptor_path.to_path_buf()
            };
            paths.insert(chip_id, descriptor_path);
        }

        if let Some(missing) = chip_ids.iter().find(|id| !paths.contains_key(id)) {
            return topology_error!(
                "Expecting multi SoC descriptor chips to match requested chip ids: chip {missing} missing from {}",
                path.display()
            );
        }
    } else {
        for chip_id in chip_ids {
            paths.insert(*chip_id, path.to_path_buf());
        }
    }

    if paths.is_empty() {
        return topology_error!("No SoC descriptor paths found");
    }

    Ok(paths)
}
