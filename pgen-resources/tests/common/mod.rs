// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

#![allow(dead_code)]

use pgen_resources::config::ResourceConfig;
use pgen_resources::resource_manager::ResourceManager;
use pgen_topology::Topology;
use pgen_topology::types::CoreLocation;
use pgen_track::Tracker;
use pgen_track::tracker::dev_null_tracker;

pub const GEN1: &str = "
grid: {x_size: 3, y_size: 3}
arch_name: GRAYSKULL
functional_workers: [1-1, 2-1, 1-2]
dram: [[0-0]]
";

pub const GEN2B: &str = "
grid: {x_size: 3, y_size: 3}
arch_name: WORMHOLE_B0
functional_workers: [1-1, 2-1, 1-2]
eth: [1-0, 2-0]
dram: [[0-0, 0-1]]
";

pub const GEN3: &str = "
grid: {x_size: 3, y_size: 3}
arch_name: BLACKHOLE
functional_workers: [1-1, 2-1]
eth: [1-0]
dram: [[0-0]]
";

pub const WORKER: CoreLocation = CoreLocation::new(0, 1, 1);
pub const OTHER_WORKER: CoreLocation = CoreLocation::new(0, 2, 1);
pub const ETHERNET: CoreLocation = CoreLocation::new(0, 1, 0);
pub const OTHER_ETHERNET: CoreLocation = CoreLocation::new(0, 2, 0);

pub fn manager_with(descriptor: &str, config: ResourceConfig, tracker: &Tracker) -> ResourceManager {
    let topology = Topology::from_string(descriptor, &[0, 1]).unwrap();
    ResourceManager::new(topology, config, tracker).unwrap()
}

pub fn manager(descriptor: &str) -> ResourceManager {
    manager_with(descriptor, ResourceConfig::default(), &dev_null_tracker())
}
