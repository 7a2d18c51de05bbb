//! Thermal, power, GPU and board sub-aggregates.

use serde::{Deserialize, Serialize};

use crate::units::ByteSize;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TemperatureSensor {
    pub label: String,
    /// Degrees Celsius; `None` when the input file is missing or unparsable.
    pub temperature: Option<f64>,
}

/// Charging state reported by `power_supply/*/status`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BatteryStatus {
    Charging,
    Discharging,
    Full,
    /// Any other kernel string ("Not charging", "Unknown", ...).
    Unknown,
}

impl BatteryStatus {
    pub fn from_kernel(status: &str) -> Self {
        match status.trim() {
            "Charging" => BatteryStatus::Charging,
            "Discharging" => BatteryStatus::Discharging,
            "Full" => BatteryStatus::Full,
            _ => BatteryStatus::Unknown,
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Battery {
    /// 0-100, `None` when unparsable or out of range.
    pub capacity: Option<u8>,
    pub status: BatteryStatus,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Backlight {
    pub brightness: u32,
    pub max_brightness: u32,
}

impl Backlight {
    /// Brightness as a percentage of the maximum.
    pub fn percentage(&self) -> Option<f32> {
        (self.max_brightness > 0)
            .then(|| self.brightness as f32 * 100.0 / self.max_brightness as f32)
    }
}

/// Fields of the amdgpu `gpu_metrics` binary block.
///
/// Temperatures are in centi-degrees Celsius, clocks in MHz, power in watts.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GpuMetrics {
    pub temperature_edge: u16,
    pub temperature_hotspot: u16,
    pub temperature_mem: u16,
    pub temperature_vrgfx: u16,
    pub temperature_vrsoc: u16,
    pub temperature_vrmem: u16,
    pub average_socket_power: u16,
    pub average_gfxclk_frequency: u16,
    pub average_socclk_frequency: u16,
    pub average_uclk_frequency: u16,
    pub current_gfxclk: u16,
    pub current_socclk: u16,
    pub throttle_status: u32,
    pub current_fan_speed: u16,
    pub pcie_link_width: u16,
    pub pcie_link_speed: u16,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Gpu {
    /// DRM node the values were read from, e.g. `card0`.
    pub card: String,
    pub usage: Option<f32>,
    pub vram_size: Option<ByteSize>,
    pub vram_usage: Option<f32>,
    pub metrics: Option<GpuMetrics>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClockSource {
    pub current: Option<String>,
    pub available: Vec<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Bios {
    pub vendor: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Motherboard {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub bios: Bios,
}
