//! Block storage: whole disks under `/sys/class/block` and NVMe controllers
//! under `/sys/class/nvme`, joined with `/proc/partitions` and `/proc/mounts`
//! by device short name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::procfs::parser::{MountEntry, PartitionEntry};
use crate::collector::source::SourceReader;
use crate::collector::traits::FileSystem;
use crate::model::{NvmeDevice, StorageDevice, StoragePartition};
use crate::units::ByteSize;

/// True when `name` is a partition of `disk`: `sda1` of `sda`, `nvme0n1p2` of
/// `nvme0n1`.
pub fn is_partition_of(disk: &str, name: &str) -> bool {
    let Some(rest) = name.strip_prefix(disk) else {
        return false;
    };
    let number = rest.strip_prefix('p').unwrap_or(rest);
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// True when `name` is a namespace of controller `ctrl`: `nvme0n1` of `nvme0`.
fn is_namespace_of(ctrl: &str, name: &str) -> bool {
    name.strip_prefix(ctrl)
        .and_then(|rest| rest.strip_prefix('n'))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// First field of `8.0 GT/s PCIe`.
fn parse_link_speed(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

pub struct BlockCollector<'a, F: FileSystem> {
    reader: &'a SourceReader<F>,
    sys_path: PathBuf,
}

impl<'a, F: FileSystem> BlockCollector<'a, F> {
    pub fn new(reader: &'a SourceReader<F>, sys_path: impl AsRef<Path>) -> Self {
        Self {
            reader,
            sys_path: sys_path.as_ref().to_path_buf(),
        }
    }

    fn block_dir(&self) -> PathBuf {
        self.sys_path.join("class/block")
    }

    fn partition(
        &self,
        name: &str,
        size: ByteSize,
        mounts: &HashMap<String, MountEntry>,
    ) -> StoragePartition {
        let mount = mounts.get(name);
        StoragePartition {
            device: format!("/dev/{name}"),
            mount_point: mount.map(|m| m.mount_point.clone()),
            filesystem: mount.map(|m| m.filesystem.clone()),
            size,
            start_point: self
                .reader
                .read_parsed(self.block_dir().join(name).join("start"))
                .map(ByteSize::from_sectors)
                .unwrap_or_default(),
        }
    }

    /// Whole disks backed by hardware, excluding NVMe namespaces.
    ///
    /// A whole disk has a `device` link and no `partition` attribute, which
    /// leaves out loop, ram, zram and device-mapper nodes.
    pub fn storage_devices(
        &self,
        mounts: &HashMap<String, MountEntry>,
    ) -> Option<Vec<StorageDevice>> {
        let block = self.block_dir();
        if !self.reader.exists(&block) {
            debug!("block class not present");
            return None;
        }

        let entries = self.reader.list_paths(&block);
        let is_partition = |path: &Path| self.reader.exists(path.join("partition"));

        let devices = entries
            .iter()
            .filter(|(name, path)| {
                !name.starts_with("nvme")
                    && !is_partition(path.as_path())
                    && self.reader.exists(path.join("device"))
            })
            .map(|(disk, path)| {
                let partitions = entries
                    .iter()
                    .filter(|(name, path)| {
                        is_partition_of(disk, name) && is_partition(path.as_path())
                    })
                    .map(|(name, path)| {
                        let size = self
                            .reader
                            .read_parsed(path.join("size"))
                            .map(ByteSize::from_sectors)
                            .unwrap_or_default();
                        self.partition(name, size, mounts)
                    })
                    .collect();

                StorageDevice {
                    device: format!("/dev/{disk}"),
                    model: self.reader.read_trimmed(path.join("device/model")),
                    size: self
                        .reader
                        .read_parsed(path.join("size"))
                        .map(ByteSize::from_sectors)
                        .unwrap_or_default(),
                    partitions,
                }
            })
            .collect();
        Some(devices)
    }

    /// NVMe controllers with their first namespace.
    ///
    /// Namespace and partition sizes come from `/proc/partitions`.
    pub fn nvme_devices(
        &self,
        partitions: &[PartitionEntry],
        mounts: &HashMap<String, MountEntry>,
    ) -> Option<Vec<NvmeDevice>> {
        let nvme = self.sys_path.join("class/nvme");
        if !self.reader.exists(&nvme) {
            debug!("nvme class not present");
            return None;
        }

        let devices = self
            .reader
            .list_paths(&nvme)
            .into_iter()
            .map(|(ctrl, path)| {
                let namespace = partitions.iter().find(|p| is_namespace_of(&ctrl, &p.name));

                let (device, size, parts): (String, ByteSize, Vec<StoragePartition>) = match namespace {
                    Some(ns) => (
                        format!("/dev/{}", ns.name),
                        ByteSize::from_kib(ns.blocks),
                        partitions
                            .iter()
                            .filter(|p| is_partition_of(&ns.name, &p.name))
                            .map(|p| self.partition(&p.name, ByteSize::from_kib(p.blocks), mounts))
                            .collect(),
                    ),
                    None => (format!("/dev/{ctrl}"), ByteSize::default(), Vec::new()),
                };

                NvmeDevice {
                    device,
                    model: self.reader.read_trimmed(path.join("model")),
                    pcie_address: self.reader.read_trimmed(path.join("address")),
                    link_speed_gts: self
                        .reader
                        .read_trimmed(path.join("device/current_link_speed"))
                        .and_then(|s| parse_link_speed(&s)),
                    pcie_lanes: self.reader.read_parsed(path.join("device/current_link_width")),
                    size,
                    partitions: parts,
                }
            })
            .collect();
        Some(devices)
    }
}
