// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The per-core L1 data-buffer arena.
//!
//! The arena covers `[start, end)` and is filled from both ends:
//!
//!  - data, stream and NCRISC fallback buffers grow down from `end`
//!    (the high watermark).
//!  - extra tile-header space and every tile-header buffer after the first
//!    grow up from `start` (the low watermark).
//!
//! The extra overlay blob sits at `start` and pushes the low region up. It
//! must be reserved before any tile-header buffer is placed in the low
//! region. Reservation and validation are separate steps so that callers can
//! reserve several regions and check once.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use pgen_topology::arch::L1AddressMap;
use pgen_topology::types::CoreLocation;

use crate::constants::{TILE_HEADER_BUFFER_SIZE_BYTES, UNUSED_DATA_BUFFERS_SPACE_BYTES};
use crate::types::{CoreResourceType, ResourceError, ResourceResult, StreamId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum L1BufferKind {
    ExtraOverlayBlob,
    ExtraTileHeaders { count: u64 },
    TileHeader { tile_size: u32 },
    Stream { stream_id: StreamId },
    NcriscFallback,
    Data,
}

impl fmt::Display for L1BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            L1BufferKind::ExtraOverlayBlob => write!(f, "extra overlay blob"),
            L1BufferKind::ExtraTileHeaders { count } => {
                write!(f, "space for {count} extra tile headers")
            }
            L1BufferKind::TileHeader { tile_size } => {
                write!(f, "tile header buffer (tile size {tile_size})")
            }
            L1BufferKind::Stream { stream_id } => write!(f, "stream {stream_id} buffer"),
            L1BufferKind::NcriscFallback => write!(f, "NCRISC fallback buffer"),
            L1BufferKind::Data => write!(f, "data buffer"),
        }
    }
}

/// A placed region of L1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct L1Buffer {
    pub kind: L1BufferKind,
    pub address: u64,
    pub size: u64,
}

impl fmt::Display for L1Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[0x{:06x} - 0x{:06x}) {} bytes: {}",
            self.address,
            self.address + self.size,
            self.size,
            self.kind
        )
    }
}

pub struct L1Arena {
    location: CoreLocation,
    start: u64,
    end: u64,
    predefined_tile_header_buffer_address: u64,

    /// Bytes taken from `end` downwards.
    high_bytes: u64,

    /// Bytes reserved from `start` upwards, excluding the overlay blob.
    low_bytes: u64,

    /// Bytes of the low region occupied by tile-header buffers.
    low_placed_bytes: u64,

    extra_overlay_blob: u64,

    tile_header_buffers: BTreeMap<u32, u64>,
    buffers: Vec<L1Buffer>,
}

impl L1Arena {
    /// Create the arena for a core described by `address_map`, with an L1 of
    /// `l1_size` bytes.
    #[must_use]
    pub fn new(location: CoreLocation, address_map: &L1AddressMap, l1_size: u64) -> Self {
        let start = u64::from(address_map.data_buffer_space_base);
        let end = l1_size.saturating_sub(UNUSED_DATA_BUFFERS_SPACE_BYTES).max(start);
        Self {
            location,
            start,
            end,
            predefined_tile_header_buffer_address: u64::from(
                address_map.predefined_tile_header_buffer_address,
            ),
            high_bytes: 0,
            low_bytes: 0,
            low_placed_bytes: 0,
            extra_overlay_blob: 0,
            tile_header_buffers: BTreeMap::new(),
            buffers: Vec::new(),
        }
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[must_use]
    pub fn available(&self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    pub fn used(&self) -> u64 {
        self.high_bytes + self.low_bytes + self.extra_overlay_blob
    }

    #[must_use]
    pub fn high_watermark(&self) -> u64 {
        self.end.saturating_sub(self.high_bytes)
    }

    #[must_use]
    pub fn low_watermark(&self) -> u64 {
        self.start + self.extra_overlay_blob + self.low_bytes
    }

    #[must_use]
    pub fn extra_overlay_blob_size(&self) -> u64 {
        self.extra_overlay_blob
    }

    #[must_use]
    pub fn buffers(&self) -> &[L1Buffer] {
        &self.buffers
    }

    /// Move the high watermark down by `size` and return it.
    pub fn allocate_data_buffer(&mut self, size: u64) -> ResourceResult<u64> {
        self.allocate_from_end(L1BufferKind::Data, size)
    }

    pub fn allocate_stream_buffer(
        &mut self,
        stream_id: StreamId,
        size: u64,
    ) -> ResourceResult<Option<u64>> {
        if size == 0 {
            return Ok(None);
        }
        self.allocate_from_end(L1BufferKind::Stream { stream_id }, size)
            .map(Some)
    }

    pub fn allocate_ncrisc_fallback_buffer(&mut self, size: u64) -> ResourceResult<Option<u64>> {
        if size == 0 {
            return Ok(None);
        }
        self.allocate_from_end(L1BufferKind::NcriscFallback, size)
            .map(Some)
    }

    fn allocate_from_end(&mut self, kind: L1BufferKind, size: u64) -> ResourceResult<u64> {
        self.high_bytes += size;
        self.check_budget()?;

        let address = self.high_watermark();
        if size > 0 {
            self.buffers.push(L1Buffer {
                kind,
                address,
                size,
            });
        }
        Ok(address)
    }

    /// Reserve room for `count` more tile-header buffers at the low end.
    pub fn allocate_extra_tile_headers_space(&mut self, count: u64) -> ResourceResult<()> {
        if count == 0 {
            return Ok(());
        }

        let size = count * TILE_HEADER_BUFFER_SIZE_BYTES;
        let address = self.start + self.extra_overlay_blob + self.low_bytes;
        self.low_bytes += size;
        self.check_budget()?;

        self.buffers.push(L1Buffer {
            kind: L1BufferKind::ExtraTileHeaders { count },
            address,
            size,
        });
        Ok(())
    }

    /// Reserve `size` bytes for the extra overlay blob.
    ///
    /// Only the first non-zero reservation is kept; later calls return it.
    /// Reserved tile-header space moves up past the blob. Fails once a
    /// tile-header buffer sits in the low region. This does not check the
    /// budget.
    pub fn reserve_extra_overlay_blob(&mut self, size: u64) -> ResourceResult<u64> {
        if self.extra_overlay_blob > 0 || size == 0 {
            return Ok(self.extra_overlay_blob);
        }
        if self.low_placed_bytes > 0 {
            return Err(ResourceError::LateOverlayBlob {
                location: self.location,
            });
        }

        for buffer in &mut self.buffers {
            if let L1BufferKind::ExtraTileHeaders { .. } = buffer.kind {
                buffer.address += size;
            }
        }

        self.extra_overlay_blob = size;
        self.buffers.push(L1Buffer {
            kind: L1BufferKind::ExtraOverlayBlob,
            address: self.start,
            size,
        });
        Ok(size)
    }

    /// Return the tile-header buffer for `tile_size`, placing it if needed.
    ///
    /// The first buffer goes to the predefined address. The rest use the
    /// low region, which grows when the reserved extra space is full.
    pub fn allocate_tile_header_buffer(&mut self, tile_size: u32) -> ResourceResult<u64> {
        if let Some(address) = self.tile_header_buffers.get(&tile_size) {
            return Ok(*address);
        }

        let address = if self.tile_header_buffers.is_empty() {
            self.predefined_tile_header_buffer_address
        } else {
            let address = self.start + self.extra_overlay_blob + self.low_placed_bytes;
            self.low_placed_bytes += TILE_HEADER_BUFFER_SIZE_BYTES;
            if self.low_placed_bytes > self.low_bytes {
                self.low_bytes = self.low_placed_bytes;
                self.check_budget()?;
            }
            address
        };

        self.tile_header_buffers.insert(tile_size, address);
        self.buffers.push(L1Buffer {
            kind: L1BufferKind::TileHeader { tile_size },
            address,
            size: TILE_HEADER_BUFFER_SIZE_BYTES,
        });
        Ok(address)
    }

    pub fn tile_header_buffer_address(&self, tile_size: u32) -> ResourceResult<u64> {
        self.tile_header_buffers
            .get(&tile_size)
            .copied()
            .ok_or(ResourceError::MissingTileHeaderBuffer {
                location: self.location,
                tile_size,
            })
    }

    /// Fail if the two ends of the arena have crossed.
    pub fn check_budget(&self) -> ResourceResult<()> {
        if self.used() > self.available() {
            return Err(ResourceError::OutOfResources {
                location: self.location,
                resource: CoreResourceType::L1DataBuffersMemory,
                capacity: self.available(),
                used: self.used(),
                details: format!("Allocated data buffers:\n{}", self.allocation_info()),
            });
        }
        Ok(())
    }

    /// One line per placed buffer, in address order.
    #[must_use]
    pub fn allocation_info(&self) -> String {
        self.buffers
            .iter()
            .sorted_by_key(|b| (b.address, b.size))
            .map(|b| format!("{b}\n"))
            .collect()
    }
}
