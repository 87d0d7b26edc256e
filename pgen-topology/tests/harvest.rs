// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::path::{Path, PathBuf};

use pgen_topology::Topology;
use pgen_topology::types::CoreLocation;

fn descriptor_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("descriptors")
        .join(name)
}

fn harvested() -> Topology {
    Topology::from_file(&descriptor_path("wormhole_b0_harvested.yaml"), &[0]).unwrap()
}

#[test]
fn harvested_detection() {
    assert!(harvested().is_harvested_chip_with_noc_translation(0).unwrap());

    let topology = Topology::from_file(&descriptor_path("wormhole_b0.yaml"), &[0]).unwrap();
    assert!(!topology.is_harvested_chip_with_noc_translation(0).unwrap());

    // A 32x32 grid alone is not enough: gen1 has no translation table.
    let topology =
        Topology::from_string("grid: {x_size: 32, y_size: 32}\narch_name: GRAYSKULL\n", &[0]).unwrap();
    assert!(!topology.is_harvested_chip_with_noc_translation(0).unwrap());
}

#[test]
fn harvested_workers_round_trip() {
    let topology = harvested();
    for worker in topology.worker_cores(0).unwrap() {
        let unharvested = topology.harvested_to_unharvested(worker).unwrap();
        assert!(unharvested.x != 0 && unharvested.x != 5 && unharvested.x <= 9);
        assert!(unharvested.y != 0 && unharvested.y != 6 && unharvested.y <= 11);
        assert_eq!(topology.unharvested_to_harvested(unharvested).unwrap(), worker);
    }
}

#[test]
fn ethernet_rows_move_to_the_top() {
    let topology = harvested();
    for core in topology.ethernet_cores(0).unwrap() {
        let unharvested = topology.harvested_to_unharvested(core).unwrap();
        assert!(unharvested.y == 0 || unharvested.y == 6);
        assert_eq!(topology.unharvested_to_harvested(unharvested).unwrap(), core);
    }

    assert_eq!(
        topology
            .unharvested_to_harvested(CoreLocation::new(0, 9, 6))
            .unwrap(),
        CoreLocation::new(0, 25, 17)
    );
}

#[test]
fn unharvested_grid_round_trip() {
    let topology = harvested();
    for x in (0..10).filter(|x| *x != 5) {
        for y in 0..12 {
            let location = CoreLocation::new(0, x, y);
            let harvested = topology.unharvested_to_harvested(location).unwrap();
            assert!(harvested.x >= 16 && harvested.y >= 16);
            assert_eq!(topology.harvested_to_unharvested(harvested).unwrap(), location);
        }
    }
}

#[test]
fn specific_translations() {
    let topology = harvested();
    let harvest = |x, y| {
        topology
            .unharvested_to_harvested(CoreLocation::new(0, x, y))
            .unwrap()
    };
    assert_eq!(harvest(1, 1), CoreLocation::new(0, 18, 18));
    assert_eq!(harvest(4, 5), CoreLocation::new(0, 21, 22));
    assert_eq!(harvest(6, 7), CoreLocation::new(0, 22, 23));
    assert_eq!(harvest(9, 11), CoreLocation::new(0, 25, 27));
    assert_eq!(harvest(3, 0), CoreLocation::new(0, 20, 16));
}

#[test]
fn identity_when_not_harvested() {
    let topology = Topology::from_file(&descriptor_path("wormhole_b0.yaml"), &[0]).unwrap();
    for x in 0..10 {
        for y in 0..12 {
            let location = CoreLocation::new(0, x, y);
            assert_eq!(topology.unharvested_to_harvested(location).unwrap(), location);
            assert_eq!(topology.harvested_to_unharvested(location).unwrap(), location);
        }
    }
}
