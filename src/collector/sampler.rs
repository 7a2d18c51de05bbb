//! Two-sample delta rate computation.
//!
//! A sampler reads a set of monotonically increasing kernel counters, blocks
//! the calling thread for a fixed interval, reads them again and hands back
//! both samples. The functions below turn a pair of samples into CPU
//! utilisation percentages or byte rates.
//!
//! Counter wraparound inside the window is not corrected: a counter that went
//! backwards yields a negative (or otherwise meaningless) rate.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::collector::procfs::parser::{CpuStatTable, CpuTimes, NetDevTotals};
use crate::model::{CpuUsage, NetworkRate, ProcessorUsage};

/// Default wait between the two `/proc/stat` reads.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Default wait between the two `/proc/net/dev` reads.
pub const NETWORK_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Two readings of the same source taken `interval` apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    pub before: T,
    pub after: T,
    pub interval: Duration,
}

/// Sample, wait, sample again.
#[derive(Debug, Clone, Copy)]
pub struct DeltaSampler {
    interval: Duration,
}

impl DeltaSampler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Invokes `read` twice around a sleep of the configured interval.
    ///
    /// Returns `None` if either reading is absent; there is no retry.
    pub fn sample<T, R>(&self, mut read: R) -> Option<Sample<T>>
    where
        R: FnMut() -> Option<T>,
    {
        let before = read()?;
        thread::sleep(self.interval);
        let after = read()?;
        Some(Sample {
            before,
            after,
            interval: self.interval,
        })
    }
}

/// Signed counter delta; negative when the counter went backwards.
fn delta(before: u64, after: u64) -> f64 {
    after as f64 - before as f64
}

/// Per-second rate of one counter. A zero-length window yields zero.
pub fn counter_rate(before: u64, after: u64, interval: Duration) -> f64 {
    let secs = interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    delta(before, after) / secs
}

/// Percentages for one `/proc/stat` row over a window.
///
/// Every category shares the same denominator, the delta of the row total.
/// If nothing was accounted in the window the row is reported as all zero.
pub fn processor_usage(before: &CpuTimes, after: &CpuTimes) -> ProcessorUsage {
    let total_delta = delta(before.total(), after.total());
    if total_delta == 0.0 {
        return ProcessorUsage::default();
    }

    let share = |b: u64, a: u64| (delta(b, a) * 100.0 / total_delta) as f32;
    let idle = share(before.idle, after.idle);

    ProcessorUsage {
        total: 100.0 - idle,
        user: share(before.user, after.user),
        nice: share(before.nice, after.nice),
        system: share(before.system, after.system),
        idle,
        iowait: share(before.iowait, after.iowait),
        interrupt: share(before.irq, after.irq),
        soft_interrupt: share(before.softirq, after.softirq),
        steal: share(before.steal, after.steal),
    }
}

/// CPU usage over a sampled window.
///
/// Processors are matched by their kernel id and reported in the order of the
/// first sample; a processor missing from either sample is left out. Returns
/// `None` when the aggregate row is absent.
pub fn cpu_usage(sample: &Sample<CpuStatTable>) -> Option<CpuUsage> {
    let average = processor_usage(sample.before.aggregate.as_ref()?, sample.after.aggregate.as_ref()?);

    let after_by_id: HashMap<u32, &CpuTimes> = sample
        .after
        .processors
        .iter()
        .filter_map(|t| t.cpu_id.map(|id| (id, t)))
        .collect();

    let processors = sample
        .before
        .processors
        .iter()
        .filter_map(|before| {
            let after = after_by_id.get(&before.cpu_id?)?;
            Some(processor_usage(before, after))
        })
        .collect();

    Some(CpuUsage {
        average,
        processors,
    })
}

/// Download and upload rates in bytes per second.
pub fn network_rate(sample: &Sample<NetDevTotals>) -> NetworkRate {
    NetworkRate {
        download: counter_rate(sample.before.rx_bytes, sample.after.rx_bytes, sample.interval),
        upload: counter_rate(sample.before.tx_bytes, sample.after.tx_bytes, sample.interval),
    }
}
