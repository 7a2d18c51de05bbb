//! Storage sub-aggregates.
//!
//! Devices and partitions are tied together by device name only.

use serde::{Deserialize, Serialize};

use crate::units::ByteSize;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StoragePartition {
    /// Device node, e.g. `/dev/sda1`.
    pub device: String,
    pub mount_point: Option<String>,
    pub filesystem: Option<String>,
    pub size: ByteSize,
    /// Offset of the partition from the start of its disk.
    pub start_point: ByteSize,
}

/// A SATA/SCSI/virtio disk.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StorageDevice {
    pub device: String,
    pub model: Option<String>,
    pub size: ByteSize,
    pub partitions: Vec<StoragePartition>,
}

/// An NVMe controller and its first namespace.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct NvmeDevice {
    /// Namespace device node, e.g. `/dev/nvme0n1`; the controller node when no
    /// namespace is listed.
    pub device: String,
    pub model: Option<String>,
    pub pcie_address: Option<String>,
    /// Current PCIe link speed in GT/s.
    pub link_speed_gts: Option<f64>,
    pub pcie_lanes: Option<u32>,
    pub size: ByteSize,
    pub partitions: Vec<StoragePartition>,
}
