// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::path::{Path, PathBuf};

use pgen_topology::Topology;
use pgen_topology::address::DEFAULT_PCIE_CORE;
use pgen_topology::types::{CoreLocation, TopologyError};

fn descriptor_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("descriptors")
        .join(name)
}

fn wormhole() -> Topology {
    Topology::from_file(&descriptor_path("wormhole_b0.yaml"), &[0]).unwrap()
}

fn grayskull() -> Topology {
    Topology::from_file(&descriptor_path("grayskull.yaml"), &[0]).unwrap()
}

#[test]
fn dram_buffer_noc_address() {
    let topology = wormhole();

    // Channel 0 subchannel 0 is core 0-0, so only the local address remains.
    assert_eq!(topology.dram_buffer_noc_address(0x100, 0, 0, 0).unwrap(), 0x100);
    // Core 5-2
    assert_eq!(
        topology.dram_buffer_noc_address(0x40, 0, 3, 0).unwrap(),
        0x850_0000_0040
    );
    // Core 0-6
    assert_eq!(
        topology.dram_buffer_noc_address(0x200, 0, 1, 1).unwrap(),
        0x1800_0000_0200
    );
}

#[test]
fn dram_buffer_noc_address_out_of_range() {
    let topology = wormhole();
    assert!(matches!(
        topology.dram_buffer_noc_address(0, 0, 6, 0),
        Err(TopologyError::OutOfRange(_))
    ));
    assert!(matches!(
        topology.dram_buffer_noc_address(0, 0, 0, 3),
        Err(TopologyError::OutOfRange(_))
    ));
}

#[test]
fn local_dram_buffer_noc_address() {
    let topology = wormhole();
    let noc_address = topology.dram_buffer_noc_address(0x40, 0, 3, 0).unwrap();
    assert_eq!(topology.local_dram_buffer_noc_address(noc_address), 0x40);

    let topology = grayskull();
    let noc_address = topology.dram_buffer_noc_address(0x1234, 0, 7, 0).unwrap();
    assert_eq!(topology.local_dram_buffer_noc_address(noc_address), 0x1234);
}

#[test]
fn pcie_addresses_gen2() {
    let topology = wormhole();
    assert_eq!(
        topology.first_pcie_core(0).unwrap(),
        CoreLocation::new(0, 0, 3)
    );
    assert_eq!(
        topology.buffer_noc_address_through_pcie(0x1000, 0).unwrap(),
        0xC00_0000_1000
    );
    // Host buffers need the ATU offset on this generation.
    assert_eq!(
        topology.host_noc_address_through_pcie(0x1000, 0).unwrap(),
        0xC08_0000_1000
    );
}

#[test]
fn pcie_addresses_gen1() {
    let topology = grayskull();
    assert_eq!(
        topology.buffer_noc_address_through_pcie(0x1000, 0).unwrap(),
        0x100_0000_1000
    );
    assert_eq!(
        topology.host_noc_address_through_pcie(0x1000, 0).unwrap(),
        0x100_0000_1000
    );
}

#[test]
fn pcie_addresses_gen3_have_no_host_offset() {
    let topology =
        Topology::from_string("grid: {x_size: 4, y_size: 4}\narch_name: BLACKHOLE\npcie: [2-0]\n", &[0])
            .unwrap();
    let device = topology.buffer_noc_address_through_pcie(0x10, 0).unwrap();
    assert_eq!(device, (2 << 36) | 0x10);
    assert_eq!(topology.host_noc_address_through_pcie(0x10, 0).unwrap(), device);
}

#[test]
fn default_pcie_core() {
    let topology = Topology::from_file(&descriptor_path("wormhole_b0_harvested.yaml"), &[0]).unwrap();
    assert_eq!(
        topology.first_pcie_core(0).unwrap(),
        DEFAULT_PCIE_CORE.on_chip(0)
    );
    assert_eq!(
        topology.buffer_noc_address_through_pcie(0, 0).unwrap(),
        0xC00_0000_0000
    );
}

#[test]
fn local_pcie_buffer_address() {
    let core = CoreLocation::new(0, 1, 1);

    let topology = wormhole();
    assert_eq!(topology.local_pcie_buffer_address(0x1234, &core, true), 0x81C0_1234);
    assert_eq!(topology.local_pcie_buffer_address(0x1234, &core, false), 0x41C0_1234);

    let topology = grayskull();
    assert_eq!(topology.local_pcie_buffer_address(0x1234, &core, true), 0x80E0_1234);
}
