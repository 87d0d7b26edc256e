// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Allocation of the finite per-core hardware resources of a system.
//!
//! Every worker and ethernet core has:
//!
//!  - NoC streams, split into pools (gather/multicast, general purpose,
//!    ethernet) and streams dedicated to kernel operands.
//!  - kernel input and output slots.
//!  - an L1 data-buffer arena, filled from both ends.
//!
//! The [`ResourceManager`](resource_manager::ResourceManager) owns one
//! allocator per core and is the entry point for all requests. Every request
//! either succeeds or fails with a [`ResourceError`](types::ResourceError)
//! that ends the allocation pass.
//!
//! # Example
//!
//! ```
//! use pgen_resources::config::ResourceConfig;
//! use pgen_resources::resource_manager::ResourceManager;
//! use pgen_topology::Topology;
//! use pgen_topology::types::CoreLocation;
//! use pgen_track::tracker::dev_null_tracker;
//!
//! let topology = Topology::from_string(
//!     "grid: {x_size: 2, y_size: 2}\narch_name: gen2b\nfunctional_workers: [1-1]\n",
//!     &[0],
//! )
//! .unwrap();
//! let mut manager =
//!     ResourceManager::new(topology, ResourceConfig::default(), &dev_null_tracker()).unwrap();
//!
//! let core = CoreLocation::new(0, 1, 1);
//! assert_eq!(manager.allocate_packer_stream(&core, 16).unwrap(), 24);
//! assert_eq!(manager.allocate_gather_stream(&core).unwrap(), 0);
//! ```

pub mod config;
pub mod constants;
pub mod core_resources;
pub mod ethernet;
pub mod l1;
pub mod resource_manager;
pub mod tile_header;
pub mod types;
pub mod worker;
