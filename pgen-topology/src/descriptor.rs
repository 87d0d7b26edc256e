// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The on-disk description of one chip.

use std::sync::LazyLock;

use byte_unit::Byte;
use regex::Regex;
use serde::{Deserialize, de};
use serde_yaml::Value;

use crate::arch::DeviceArch;
use crate::types::CoreCoord;

static CORE_COORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*-\s*(\d+)\s*$").unwrap());

impl<'de> Deserialize<'de> for CoreCoord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let value: Value = Deserialize::deserialize(deserializer)?;
        let Some(s) = value.as_str() else {
            return Err(de::Error::custom(format!(
                "'{value:?}': Unsupported core coordinate (should be an 'x-y' string)"
            )));
        };

        let Some(caps) = CORE_COORD_RE.captures(s) else {
            return Err(de::Error::custom(format!(
                "Unable to parse '{s}' as an 'x-y' core coordinate"
            )));
        };

        let x = caps[1]
            .parse()
            .map_err(|e| de::Error::custom(format!("Bad x in '{s}': {e}")))?;
        let y = caps[2]
            .parse()
            .map_err(|e| de::Error::custom(format!("Bad y in '{s}': {e}")))?;
        Ok(CoreCoord::new(x, y))
    }
}

/// Parse a memory size written as `0x16e000`, `0x0016_e000` or with units
/// (`1464KiB`, `1MiB`).
pub fn parse_memory_size(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16)
            .map_err(|e| format!("Unable to parse memory size '{s}' as hex: {e}")),
        None => Byte::parse_str(trimmed, false)
            .map(|bytes| bytes.as_u64())
            .map_err(|e| format!("Unable to parse memory size '{s}': {e}")),
    }
}

/// Descriptor sizes are either plain integers or strings accepted by
/// [`parse_memory_size`].
fn memory_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("Memory size {n} is not a byte count"))),
        Value::String(s) => parse_memory_size(s).map(Some).map_err(de::Error::custom),
        _ => Err(de::Error::custom(format!(
            "'{value:?}': memory sizes are integers or strings"
        ))),
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GridSize {
    pub x_size: usize,
    pub y_size: usize,
}

/// The cores and memories of one chip.
///
/// DRAM cores are always given in unharvested coordinates. On a harvested
/// chip all other cores are given in translated coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct SocDescriptor {
    pub grid: GridSize,

    pub arch_name: DeviceArch,

    #[serde(default)]
    pub functional_workers: Vec<CoreCoord>,

    #[serde(default)]
    pub harvested_workers: Vec<CoreCoord>,

    #[serde(default)]
    pub eth: Vec<CoreCoord>,

    #[serde(default)]
    pub pcie: Vec<CoreCoord>,

    #[serde(default)]
    pub arc: Vec<CoreCoord>,

    #[serde(default)]
    pub router_only: Vec<CoreCoord>,

    /// Channels, each a list of subchannel cores.
    #[serde(default)]
    pub dram: Vec<Vec<CoreCoord>>,

    #[serde(default, deserialize_with = "memory_size")]
    pub worker_l1_size: Option<u64>,

    #[serde(default, deserialize_with = "memory_size")]
    pub eth_l1_size: Option<u64>,

    #[serde(default, deserialize_with = "memory_size")]
    pub dram_bank_size: Option<u64>,
}

impl SocDescriptor {
    pub fn from_string(descriptor: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_descriptor() {
        let desc = SocDescriptor::from_string(
            "
grid: {x_size: 3, y_size: 3}
arch_name: WORMHOLE_B0
functional_workers: [1-1, 2-1]
dram: [[0-0, 0-1], [0-2]]
worker_l1_size: 1464KiB
eth_l1_size: 0x4_0000
",
        )
        .unwrap();

        assert_eq!(desc.arch_name, DeviceArch::Gen2B);
        assert_eq!(desc.grid.x_size, 3);
        assert_eq!(
            desc.functional_workers,
            vec![CoreCoord::new(1, 1), CoreCoord::new(2, 1)]
        );
        assert_eq!(desc.dram.len(), 2);
        assert_eq!(desc.dram[0][1], CoreCoord::new(0, 1));
        assert_eq!(desc.worker_l1_size, Some(1_499_136));
        assert_eq!(desc.eth_l1_size, Some(262_144));
        assert_eq!(desc.dram_bank_size, None);
        assert!(desc.eth.is_empty());
    }

    #[test]
    fn memory_sizes() {
        assert_eq!(parse_memory_size("0x0016_E000"), Ok(0x16_e000));
        assert_eq!(parse_memory_size("1MiB"), Ok(1024 * 1024));
        assert!(parse_memory_size("lots").is_err());
    }

    #[test]
    fn generic_arch_names() {
        let desc = SocDescriptor::from_string("grid: {x_size: 1, y_size: 1}\narch_name: gen3\n").unwrap();
        assert_eq!(desc.arch_name, DeviceArch::Gen3);
    }

    #[test]
    fn bad_core_coordinate() {
        let err = SocDescriptor::from_string(
            "grid: {x_size: 1, y_size: 1}\narch_name: gen1\nfunctional_workers: [1_1]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("'x-y'"));
    }
}
