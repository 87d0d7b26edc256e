// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::{ETHERNET, GEN2B, OTHER_ETHERNET, OTHER_WORKER, WORKER, manager, manager_with};
use pgen_resources::config::{ResourceConfig, TileHeaderStrategy};
use pgen_resources::constants::TILE_HEADER_BUFFER_SIZE_BYTES;
use pgen_resources::core_resources::CoreResources;
use itertools::Itertools;
use pgen_resources::l1::{L1Buffer, L1BufferKind};
use pgen_resources::resource_manager::{CoreSizes, ResourceManager};
use pgen_resources::tile_header::create_tile_header_buffer_allocator;
use pgen_resources::types::{CoreResourceType, ResourceError};
use pgen_resources::worker::WorkerCoreResources;
use pgen_topology::arch::DeviceArch;
use pgen_topology::types::CoreLocation;
use pgen_track::entity::toplevel;
use pgen_track::tracker::dev_null_tracker;

const WORKER_START: u64 = 0x3_3000;
const WORKER_END: u64 = 1_499_136;
const ETHERNET_START: u64 = 0x2_5000;
const ETHERNET_END: u64 = 256 * 1024;

const WORKER_MIN_BLOB: u32 = 64 * 1024 - 128;
const ETHERNET_MIN_BLOB: u32 = 32 * 1024 - 128;

fn sizes(entries: &[(CoreLocation, &[u32])]) -> CoreSizes {
    entries
        .iter()
        .map(|(location, sizes)| (*location, sizes.iter().copied().collect::<BTreeSet<u32>>()))
        .collect::<BTreeMap<_, _>>()
}

fn assert_disjoint(buffers: &[L1Buffer]) {
    let buffers: Vec<&L1Buffer> = buffers.iter().sorted_by_key(|b| b.address).collect();
    for pair in buffers.windows(2) {
        assert!(
            pair[0].address + pair[0].size <= pair[1].address,
            "{} overlaps {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn data_buffers_grow_down() {
    let mut manager = manager(GEN2B);
    assert_eq!(
        manager.allocate_l1_data_buffer(&WORKER, 0x1000).unwrap(),
        WORKER_END - 0x1000
    );
    assert_eq!(
        manager.allocate_l1_stream_buffer(&WORKER, 40, 0x800).unwrap(),
        Some(WORKER_END - 0x1800)
    );
    assert_eq!(
        manager.allocate_l1_ncrisc_fallback_buffer(&ETHERNET, 0x100).unwrap(),
        Some(ETHERNET_END - 0x100)
    );

    let buffers = manager.l1_buffers(&WORKER).unwrap();
    assert_eq!(buffers.len(), 2);
    assert_eq!(buffers[1].kind, L1BufferKind::Stream { stream_id: 40 });
    assert_eq!(buffers[1].size, 0x800);

    let l1 = manager.core_resources(&WORKER).unwrap().l1();
    assert_eq!(l1.start(), WORKER_START);
    assert_eq!(l1.high_watermark(), WORKER_END - 0x1800);
    manager.check_if_out_of_l1_data_buffers_memory(&WORKER).unwrap();
}

#[test]
fn empty_buffers_are_not_placed() {
    let mut manager = manager(GEN2B);
    assert_eq!(manager.allocate_l1_stream_buffer(&WORKER, 8, 0).unwrap(), None);
    assert_eq!(manager.allocate_l1_ncrisc_fallback_buffer(&WORKER, 0).unwrap(), None);
    assert!(manager.l1_buffers(&WORKER).unwrap().is_empty());
}

#[test]
fn blob_tightens_the_budget() {
    let top = toplevel(&dev_null_tracker(), "top");
    let mut core = WorkerCoreResources::new(&top, WORKER, DeviceArch::Gen2B, WORKER_END);
    let capacity = WORKER_END - WORKER_START;

    assert_eq!(
        core.allocate_l1_data_buffer(capacity - 1).unwrap(),
        WORKER_START + 1
    );
    assert_eq!(core.allocate_l1_extra_overlay_blob_space(1).unwrap(), 1);

    match core.allocate_l1_data_buffer(1) {
        Err(ResourceError::OutOfResources {
            location,
            resource,
            capacity: available,
            used,
            details,
        }) => {
            assert_eq!(location, WORKER);
            assert_eq!(resource, CoreResourceType::L1DataBuffersMemory);
            assert_eq!(available, capacity);
            assert_eq!(used, capacity + 1);
            assert!(details.starts_with("Allocated data buffers:\n"));
            assert!(details.contains("extra overlay blob"));
            assert!(details.contains("data buffer"));
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
#[should_panic(expected = "resource: L1DataBuffersMemory")]
fn data_buffer_larger_than_l1() {
    let mut manager = manager(GEN2B);
    manager
        .allocate_l1_data_buffer(&ETHERNET, ETHERNET_END - ETHERNET_START + 1)
        .unwrap();
}

#[test]
fn overlay_blob_rounded_to_pages() {
    let mut manager = manager(GEN2B);
    assert_eq!(
        manager.allocate_l1_extra_overlay_blob_space(&WORKER, 0).unwrap(),
        0
    );
    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB)
            .unwrap(),
        0
    );
    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB + 5000)
            .unwrap(),
        0x1000
    );

    // The first reservation is kept
    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB + 0x3000)
            .unwrap(),
        0x1000
    );
    let l1 = manager.core_resources(&WORKER).unwrap().l1();
    assert_eq!(l1.extra_overlay_blob_size(), 0x1000);
    assert_eq!(l1.used(), 0x1000);

    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&ETHERNET, ETHERNET_MIN_BLOB + 0x1800)
            .unwrap(),
        0x1000
    );
}

#[test]
fn overlay_blob_default_size_from_config() {
    let config = ResourceConfig {
        overlay_max_extra_blob_size: 0x2000,
        ..ResourceConfig::default()
    };
    let mut manager = manager_with(GEN2B, config, &dev_null_tracker());
    assert_eq!(
        manager.allocate_l1_extra_overlay_blob_space(&WORKER, 0).unwrap(),
        0x2000
    );
    assert_eq!(
        manager.allocate_l1_extra_overlay_blob_space(&ETHERNET, 0).unwrap(),
        0x2000
    );
}

#[test]
#[should_panic(expected = "NoCoreAtLocation")]
fn overlay_blob_on_missing_core() {
    let mut manager = manager(GEN2B);
    manager
        .allocate_l1_extra_overlay_blob_space(&CoreLocation::new(0, 0, 2), 0)
        .unwrap();
}

#[test]
fn overlay_blob_default_size_overflow() {
    let config = ResourceConfig {
        overlay_max_extra_blob_size: u32::MAX,
        ..ResourceConfig::default()
    };
    let mut manager = manager_with(GEN2B, config, &dev_null_tracker());
    match manager.allocate_l1_extra_overlay_blob_space(&WORKER, 0) {
        Err(ResourceError::Config(msg)) => assert!(msg.contains("overlay_max_extra_blob_size")),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(
        manager.core_resources(&WORKER).unwrap().l1().extra_overlay_blob_size(),
        0
    );
}

#[test]
fn overlay_blob_after_low_tile_header_buffer() {
    let mut manager = manager(GEN2B);
    manager.allocate_l1_tile_header_buffer(&WORKER, 64).unwrap();
    manager.allocate_l1_tile_header_buffer(&WORKER, 128).unwrap();

    assert_eq!(
        manager.allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB + 0x1000),
        Err(ResourceError::LateOverlayBlob { location: WORKER })
    );
    assert_disjoint(manager.l1_buffers(&WORKER).unwrap());

    // Only the predefined address is in use on the other worker
    manager.allocate_l1_tile_header_buffer(&OTHER_WORKER, 64).unwrap();
    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&OTHER_WORKER, WORKER_MIN_BLOB + 0x1000)
            .unwrap(),
        0x1000
    );
    assert_eq!(
        manager.allocate_l1_tile_header_buffer(&OTHER_WORKER, 128).unwrap(),
        WORKER_START + 0x1000
    );
    assert_disjoint(manager.l1_buffers(&OTHER_WORKER).unwrap());
}

#[test]
fn extra_tile_header_space_follows_blob() {
    let mut manager = manager(GEN2B);
    manager
        .allocate_l1_extra_tile_headers_space(&sizes(&[(WORKER, &[1024, 2048])]))
        .unwrap();
    manager
        .allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB + 0x1000)
        .unwrap();

    let buffers = manager.l1_buffers(&WORKER).unwrap();
    assert_disjoint(buffers);
    let reserved = buffers
        .iter()
        .find(|b| b.kind == L1BufferKind::ExtraTileHeaders { count: 1 })
        .unwrap();
    assert_eq!(reserved.address, WORKER_START + 0x1000);
    assert_eq!(
        manager.core_resources(&WORKER).unwrap().l1().low_watermark(),
        reserved.address + reserved.size
    );
    manager.check_all_l1_budgets().unwrap();
}

#[test]
fn tile_sizes_for_missing_core() {
    let mut manager = manager(GEN2B);
    let dram = CoreLocation::new(0, 0, 0);
    let core_sizes = sizes(&[(WORKER, &[1024]), (dram, &[2048])]);
    assert_eq!(
        manager.allocate_l1_extra_tile_headers_space(&core_sizes),
        Err(ResourceError::NoCoreAtLocation { location: dram })
    );

    let allocator = create_tile_header_buffer_allocator(TileHeaderStrategy::ChipWide);
    assert_eq!(
        allocator.allocate(&mut manager, &core_sizes),
        Err(ResourceError::NoCoreAtLocation { location: dram })
    );
}

#[test]
fn extra_tile_headers_per_chip_union() {
    let mut manager = manager(GEN2B);
    let core_sizes = sizes(&[
        (WORKER, &[1024, 2048]),
        (OTHER_WORKER, &[4096]),
        (ETHERNET, &[1024, 2048]),
        (CoreLocation::new(1, 1, 1), &[2048]),
    ]);
    manager
        .allocate_l1_extra_tile_headers_space(&core_sizes)
        .unwrap();

    let low_watermark = |manager: &ResourceManager, location: CoreLocation| {
        manager.core_resources(&location).unwrap().l1().low_watermark()
    };

    // Chip 0 workers use three sizes between them
    for location in [WORKER, OTHER_WORKER, CoreLocation::new(0, 1, 2)] {
        assert_eq!(
            low_watermark(&manager, location),
            WORKER_START + 2 * TILE_HEADER_BUFFER_SIZE_BYTES
        );
    }

    // Chip 1 workers only use one size
    assert_eq!(
        low_watermark(&manager, CoreLocation::new(1, 2, 1)),
        WORKER_START
    );

    assert_eq!(
        low_watermark(&manager, ETHERNET),
        ETHERNET_START + TILE_HEADER_BUFFER_SIZE_BYTES
    );
    assert_eq!(low_watermark(&manager, OTHER_ETHERNET), ETHERNET_START);
    manager.check_all_l1_budgets().unwrap();
}

#[test]
#[should_panic(expected = "resource: L1DataBuffersMemory")]
fn extra_tile_headers_overflow_ethernet_l1() {
    let mut manager = manager(GEN2B);
    // Four extra 32 KiB headers do not fit in the ethernet arena
    let core_sizes = sizes(&[(ETHERNET, &[32, 64, 128, 256, 512])]);
    manager
        .allocate_l1_extra_tile_headers_space(&core_sizes)
        .unwrap();
}

#[test]
fn chip_wide_tile_header_buffers() {
    let mut manager = manager(GEN2B);
    let core_sizes = sizes(&[
        (WORKER, &[2048, 1024]),
        (OTHER_WORKER, &[4096]),
        (ETHERNET, &[2048]),
        (OTHER_ETHERNET, &[4096, 1024]),
    ]);
    manager
        .allocate_l1_extra_tile_headers_space(&core_sizes)
        .unwrap();
    assert_eq!(
        manager
            .allocate_l1_extra_overlay_blob_space(&WORKER, WORKER_MIN_BLOB + 0x1000)
            .unwrap(),
        0x1000
    );

    let allocator = create_tile_header_buffer_allocator(manager.config().tile_header_strategy);
    allocator.allocate(&mut manager, &core_sizes).unwrap();

    // Every chip 0 worker holds all three sizes, the smallest at the
    // predefined address
    for (location, blob) in [(OTHER_WORKER, 0), (CoreLocation::new(0, 1, 2), 0), (WORKER, 0x1000)] {
        assert_eq!(
            manager.tile_header_buffer_address(&location, 1024).unwrap(),
            0x1_B000
        );
        assert_eq!(
            manager.tile_header_buffer_address(&location, 2048).unwrap(),
            WORKER_START + blob
        );
        assert_eq!(
            manager.tile_header_buffer_address(&location, 4096).unwrap(),
            WORKER_START + blob + TILE_HEADER_BUFFER_SIZE_BYTES
        );
    }

    // The headers fit in the reserved space, which starts after the blob
    assert_eq!(
        manager.core_resources(&WORKER).unwrap().l1().low_watermark(),
        WORKER_START + 0x1000 + 2 * TILE_HEADER_BUFFER_SIZE_BYTES
    );
    assert_eq!(
        manager
            .core_resources(&OTHER_WORKER)
            .unwrap()
            .l1()
            .low_watermark(),
        WORKER_START + 2 * TILE_HEADER_BUFFER_SIZE_BYTES
    );
    assert_disjoint(manager.l1_buffers(&WORKER).unwrap());

    // Ethernet cores only hold their own sizes
    assert_eq!(
        manager.tile_header_buffer_address(&ETHERNET, 2048).unwrap(),
        0x2_0000
    );
    assert_eq!(
        manager.tile_header_buffer_address(&ETHERNET, 1024),
        Err(ResourceError::MissingTileHeaderBuffer {
            location: ETHERNET,
            tile_size: 1024,
        })
    );
    assert_eq!(
        manager
            .tile_header_buffer_address(&OTHER_ETHERNET, 4096)
            .unwrap(),
        ETHERNET_START
    );

    // Chip 1 had no sizes
    assert!(
        manager
            .tile_header_buffer_address(&CoreLocation::new(1, 1, 1), 1024)
            .is_err()
    );
    manager.check_all_l1_budgets().unwrap();
}

#[test]
fn tile_header_buffers_grow_low_region() {
    let mut manager = manager(GEN2B);
    assert_eq!(
        manager.allocate_l1_tile_header_buffer(&WORKER, 64).unwrap(),
        0x1_B000
    );
    assert_eq!(
        manager.allocate_l1_tile_header_buffer(&WORKER, 128).unwrap(),
        WORKER_START
    );
    assert_eq!(
        manager.allocate_l1_tile_header_buffer(&WORKER, 64).unwrap(),
        0x1_B000
    );
    assert_eq!(
        manager.core_resources(&WORKER).unwrap().l1().low_watermark(),
        WORKER_START + TILE_HEADER_BUFFER_SIZE_BYTES
    );
}

#[test]
#[should_panic(expected = "Per-core tile header buffer allocation")]
fn per_core_strategy_not_implemented() {
    let mut manager = manager(GEN2B);
    let allocator = create_tile_header_buffer_allocator(TileHeaderStrategy::PerCore);
    allocator
        .allocate(&mut manager, &sizes(&[(WORKER, &[1024])]))
        .unwrap();
}
