//! Collectors for `/sys` attributes.

pub mod block;
pub mod cpu;
pub mod discovery;
pub mod gpu_metrics;
pub mod hardware;

pub use block::BlockCollector;
pub use cpu::{CpuTopology, CpuTopologyCollector};
pub use discovery::{discover_backlight, discover_battery, discover_gpu_card};
pub use gpu_metrics::{MetricsLayout, decode_gpu_metrics};
pub use hardware::HardwareCollector;
