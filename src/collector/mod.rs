//! Host snapshot collector for Linux.
//!
//! This module reads the kernel pseudo-filesystems `/proc` and `/sys`,
//! decodes their text, hex and binary formats and assembles one
//! `HostSnapshot`, with support for mocking for testing without Linux.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Collector                             │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────┐  │
//! │  │  SystemCollector │ │ HardwareCollector│ │  BlockCollector  │  │
//! │  │  - /proc/stat    │ │ - hwmon, drm     │ │ - class/block    │  │
//! │  │  - /proc/net/*   │ │ - power_supply   │ │ - class/nvme     │  │
//! │  │  - /proc/meminfo │ │ - backlight, dmi │ │ - partitions     │  │
//! │  └────────┬─────────┘ └────────┬─────────┘ └────────┬─────────┘  │
//! │           │    DeltaSampler    │                    │            │
//! │           └────────────────────┼────────────────────┘            │
//! │                         ┌──────▼───────┐                         │
//! │                         │ SourceReader │                         │
//! │                         └──────┬───────┘                         │
//! │                         ┌──────▼──────┐                          │
//! │                         │  FileSystem │ (trait)                  │
//! │                         └──────┬──────┘                          │
//! └────────────────────────────────┼─────────────────────────────────┘
//!                                  │
//!                  ┌───────────────┼───────────────┐
//!                  │               │               │
//!           ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!           │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!           │ (Linux)     │ │ (Testing)   │ │ (Fixtures)  │
//!           └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use hostsnap::collector::{Collector, CollectorConfig, RealFs};
//!
//! let mut collector = Collector::new(RealFs::new(), CollectorConfig::default())?;
//! let snapshot = collector.collect_snapshot();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use std::time::Duration;
//! use hostsnap::collector::{Collector, CollectorConfig, MockFs};
//!
//! let config = CollectorConfig::default()
//!     .with_cpu_sample_interval(Duration::from_millis(1))
//!     .with_network_sample_interval(Duration::from_millis(1));
//! let mut collector = Collector::new(MockFs::typical_desktop(), config).unwrap();
//! let snapshot = collector.collect_snapshot();
//! assert!(snapshot.battery.is_some());
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod procfs;
pub mod sampler;
pub mod source;
pub mod sysfs;
pub mod traits;

pub use collector::{Collector, CollectorConfig, CollectorTiming, MAX_SAMPLE_INTERVAL};
pub use mock::MockFs;
pub use sampler::{DeltaSampler, Sample};
pub use source::SourceReader;
pub use traits::{FileSystem, RealFs};
