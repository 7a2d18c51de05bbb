//! The root aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Backlight, Battery, ClockSource, Cpu, Gpu, Motherboard, Network, NvmeDevice, StorageDevice,
    TemperatureSensor,
};
use crate::units::ByteSize;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Ram {
    pub size: ByteSize,
    /// Percentage in use: `100 - available * 100 / total`.
    pub usage: Option<f32>,
}

/// One point-in-time observation of the host.
///
/// Every sub-aggregate is collected independently; `None` means it was not
/// present or could not be read on this host.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HostSnapshot {
    pub observed_at: DateTime<Utc>,
    pub cpu: Option<Cpu>,
    pub ram: Option<Ram>,
    pub network: Option<Network>,
    pub temperature_sensors: Option<Vec<TemperatureSensor>>,
    pub storage_devices: Option<Vec<StorageDevice>>,
    pub nvme_devices: Option<Vec<NvmeDevice>>,
    pub gpu: Option<Gpu>,
    pub battery: Option<Battery>,
    pub backlight: Option<Backlight>,
    pub motherboard: Option<Motherboard>,
    pub clock_source: Option<ClockSource>,
}
