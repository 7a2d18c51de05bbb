//! Typed snapshot model.
//!
//! These structures are plain data: collectors build them once per snapshot
//! and nothing mutates them afterwards. All of them serialize with kebab-case
//! keys so an external printer can emit them as-is.

mod cpu;
mod hardware;
mod network;
mod snapshot;
mod storage;

pub use cpu::{
    ByteOrder, Cpu, CpuFrequency, CpuInfo, CpuUsage, ProcessorFrequency, ProcessorUsage,
    SchedulerPolicy,
};
pub use hardware::{
    Backlight, Battery, BatteryStatus, Bios, ClockSource, Gpu, GpuMetrics, Motherboard,
    TemperatureSensor,
};
pub use network::{Network, NetworkRate, NetworkRoute, RouteType};
pub use snapshot::{HostSnapshot, Ram};
pub use storage::{NvmeDevice, StorageDevice, StoragePartition};
