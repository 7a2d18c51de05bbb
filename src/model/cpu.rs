//! CPU sub-aggregate.

use serde::{Deserialize, Serialize};

use crate::units::Frequency;

/// Utilisation of one logical CPU (or the average) over a sampling window.
///
/// All values are percentages of the window. `total` is `100 - idle`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ProcessorUsage {
    pub total: f32,
    pub user: f32,
    pub nice: f32,
    pub system: f32,
    pub idle: f32,
    pub iowait: f32,
    pub interrupt: f32,
    pub soft_interrupt: f32,
    /// Time taken by the hypervisor for other guests.
    pub steal: f32,
}

/// Average usage plus one entry per logical CPU, in kernel order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CpuUsage {
    pub average: ProcessorUsage,
    pub processors: Vec<ProcessorUsage>,
}

/// Instantaneous frequency of one processor record in `/proc/cpuinfo`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ProcessorFrequency {
    pub processor: Option<u32>,
    pub frequency: Frequency,
}

/// Current frequencies: the per-processor readings and their arithmetic mean.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CpuFrequency {
    pub average: Frequency,
    pub processors: Vec<ProcessorFrequency>,
}

/// One cpufreq policy (frequency domain).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerPolicy {
    /// Directory name, e.g. `policy0`.
    pub name: String,
    pub scaling_governor: Option<String>,
    pub scaling_driver: Option<String>,
    pub minimum_scaling: Option<Frequency>,
    pub maximum_scaling: Option<Frequency>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the machine this crate was compiled for.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }
}

/// Static processor description.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CpuInfo {
    pub model_name: Option<String>,
    /// Physical cores: highest `topology/core_id` plus one.
    pub cores: usize,
    /// Logical processors listed in `/proc/cpuinfo`.
    pub threads: usize,
    pub dies: usize,
    /// Union of available governors over all policies, first-seen order.
    pub governors: Vec<String>,
    pub max_frequency: Option<Frequency>,
    pub clock_boost: Option<bool>,
    /// Pointer width, e.g. `64 bit`.
    pub architecture: String,
    pub byte_order: ByteOrder,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Cpu {
    pub info: CpuInfo,
    pub usage: Option<CpuUsage>,
    pub frequency: Option<CpuFrequency>,
    pub scheduler_policies: Vec<SchedulerPolicy>,
}
