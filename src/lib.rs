//! hostsnap - point-in-time host telemetry from Linux pseudo-filesystems.
//!
//! Provides:
//! - `collector` - filesystem abstraction, `/proc` and `/sys` parsers, rate
//!   samplers and the snapshot `Collector`
//! - `model` - serializable snapshot types
//! - `units` - byte-size and frequency value objects
//! - `error` - errors that abort a snapshot as a whole

pub mod collector;
pub mod error;
pub mod model;
pub mod units;

pub use collector::{Collector, CollectorConfig, CollectorTiming};
pub use error::SnapshotError;
pub use model::HostSnapshot;
pub use units::{ByteSize, Frequency};
