//! Main collector that assembles every sub-aggregate into a `HostSnapshot`.
//!
//! The two rate samplers block for their sampling windows. With
//! `parallel_sampling` they run on scoped threads while the single-shot
//! reads proceed on the calling thread.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collector::procfs::SystemCollector;
use crate::collector::procfs::parser::{CpuInfo as CpuInfoTable, CpuStatTable, NetDevTotals};
use crate::collector::procfs::system::cpu_frequency;
use crate::collector::sampler::{
    self, CPU_SAMPLE_INTERVAL, DeltaSampler, NETWORK_SAMPLE_INTERVAL, Sample,
};
use crate::collector::source::SourceReader;
use crate::collector::sysfs::{BlockCollector, CpuTopology, CpuTopologyCollector, HardwareCollector};
use crate::collector::traits::{FileSystem, RealFs};
use crate::error::SnapshotError;
use crate::model::{
    ByteOrder, Cpu, CpuInfo, HostSnapshot, Network, NetworkRoute, SchedulerPolicy,
};

/// Upper bound for either sampling window.
pub const MAX_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

/// Collector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CollectorConfig {
    /// Root of the proc filesystem.
    pub proc_path: PathBuf,
    /// Root of sysfs.
    pub sys_path: PathBuf,
    pub cpu_sample_interval: Duration,
    pub network_sample_interval: Duration,
    /// Run the CPU and network samplers concurrently.
    pub parallel_sampling: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
            cpu_sample_interval: CPU_SAMPLE_INTERVAL,
            network_sample_interval: NETWORK_SAMPLE_INTERVAL,
            parallel_sampling: true,
        }
    }
}

impl CollectorConfig {
    pub fn with_proc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proc_path = path.into();
        self
    }

    pub fn with_sys_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sys_path = path.into();
        self
    }

    pub fn with_cpu_sample_interval(mut self, interval: Duration) -> Self {
        self.cpu_sample_interval = interval;
        self
    }

    pub fn with_network_sample_interval(mut self, interval: Duration) -> Self {
        self.network_sample_interval = interval;
        self
    }

    pub fn with_parallel_sampling(mut self, parallel: bool) -> Self {
        self.parallel_sampling = parallel;
        self
    }

    /// Rejects empty roots and sampling windows above `MAX_SAMPLE_INTERVAL`.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        for (name, path) in [("proc-path", &self.proc_path), ("sys-path", &self.sys_path)] {
            if path.as_os_str().is_empty() {
                return Err(SnapshotError::Config(format!("{name} is empty")));
            }
        }
        for (name, interval) in [
            ("cpu-sample-interval", self.cpu_sample_interval),
            ("network-sample-interval", self.network_sample_interval),
        ] {
            if interval > MAX_SAMPLE_INTERVAL {
                return Err(SnapshotError::Config(format!(
                    "{name} {interval:?} exceeds {MAX_SAMPLE_INTERVAL:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Timing information for each collector phase.
///
/// Used for debugging and performance monitoring. The cpu and network phases
/// include their sampling windows.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    pub cpu: Duration,
    pub memory: Duration,
    pub network: Duration,
    pub thermal: Duration,
    /// Block devices and NVMe.
    pub storage: Duration,
    pub gpu: Duration,
    /// Battery and backlight.
    pub power: Duration,
    /// DMI and clock source.
    pub board: Duration,
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// Main collector that gathers the host snapshot.
pub struct Collector<F: FileSystem> {
    reader: SourceReader<F>,
    config: CollectorConfig,
    /// Timing information from the last collect_snapshot call.
    last_timing: Option<CollectorTiming>,
}

impl Collector<RealFs> {
    /// Collector over the live `/proc` and `/sys` with default settings.
    pub fn try_default() -> Result<Self, SnapshotError> {
        Self::new(RealFs::new(), CollectorConfig::default())
    }
}

impl<F: FileSystem> Collector<F> {
    /// Creates a new collector.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `config` - Pseudo-filesystem roots and sampling windows
    ///
    /// Fails with `UnsupportedPlatform` when either root is missing.
    pub fn new(fs: F, config: CollectorConfig) -> Result<Self, SnapshotError> {
        config.validate()?;
        for root in [&config.proc_path, &config.sys_path] {
            if !fs.exists(root) {
                return Err(SnapshotError::UnsupportedPlatform {
                    missing: root.clone(),
                });
            }
        }

        Ok(Self {
            reader: SourceReader::new(fs),
            config,
            last_timing: None,
        })
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Returns the underlying filesystem.
    pub fn fs(&self) -> &F {
        self.reader.fs()
    }

    /// Returns timing information from the last collect_snapshot call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Collects a complete host snapshot.
    ///
    /// Blocks for the longer of the two sampling windows (their sum when
    /// sampling is sequential). Never fails: each sub-aggregate that cannot
    /// be read is `None`.
    pub fn collect_snapshot(&mut self) -> HostSnapshot {
        let total_start = Instant::now();
        let observed_at = Utc::now();
        let mut timing = CollectorTiming::default();

        let system = SystemCollector::new(&self.reader, &self.config.proc_path);

        let cpu_sampler = DeltaSampler::new(self.config.cpu_sample_interval);
        let net_sampler = DeltaSampler::new(self.config.network_sample_interval);
        let sample_cpu = || timed(|| cpu_sampler.sample(|| system.read_stat()));
        let sample_net = || timed(|| net_sampler.sample(|| system.read_net_dev()));

        let (stat, net_dev, mut pending) = if self.config.parallel_sampling {
            thread::scope(|s| {
                let cpu = s.spawn(&sample_cpu);
                let net = s.spawn(&sample_net);
                let pending = self.collect_single_shot(&system, &mut timing);
                let cpu = cpu.join().unwrap_or_else(|_| {
                    warn!("cpu sampler thread panicked");
                    (None, Duration::ZERO)
                });
                let net = net.join().unwrap_or_else(|_| {
                    warn!("network sampler thread panicked");
                    (None, Duration::ZERO)
                });
                (cpu, net, pending)
            })
        } else {
            let cpu = sample_cpu();
            let net = sample_net();
            let pending = self.collect_single_shot(&system, &mut timing);
            (cpu, net, pending)
        };

        let (stat_sample, stat_elapsed) = stat;
        let (net_sample, net_elapsed) = net_dev;
        timing.cpu += stat_elapsed;
        timing.network += net_elapsed;

        let (cpu, elapsed) = timed(|| finish_cpu(&mut pending, stat_sample.as_ref()));
        timing.cpu += elapsed;
        let network = finish_network(&mut pending, net_sample.as_ref());

        let snapshot = HostSnapshot {
            observed_at,
            cpu,
            network,
            ..pending.snapshot
        };

        timing.total = total_start.elapsed();
        debug!(
            total_ms = timing.total.as_millis() as u64,
            cpu_ms = timing.cpu.as_millis() as u64,
            network_ms = timing.network.as_millis() as u64,
            "host snapshot collected"
        );
        self.last_timing = Some(timing);
        snapshot
    }

    /// Every sub-aggregate that needs no sampling window.
    ///
    /// CPU and network are filled in once the samplers finish; their static
    /// parts are carried in the returned `PendingSnapshot`.
    fn collect_single_shot(
        &self,
        system: &SystemCollector<'_, F>,
        timing: &mut CollectorTiming,
    ) -> PendingSnapshot {
        let sys_path = self.config.sys_path.as_path();
        let hardware = HardwareCollector::new(&self.reader, sys_path);
        let block = BlockCollector::new(&self.reader, sys_path);
        let topology = CpuTopologyCollector::new(&self.reader, sys_path);

        let ((cpuinfo, topology, policies), elapsed) = timed(|| {
            (
                system.read_cpuinfo(),
                topology.topology(),
                topology.scheduler_policies(),
            )
        });
        timing.cpu += elapsed;

        let (ram, elapsed) = timed(|| system.collect_ram());
        timing.memory = elapsed;

        let (routes, elapsed) = timed(|| system.collect_routes());
        timing.network += elapsed;

        let (temperature_sensors, elapsed) = timed(|| hardware.temperature_sensors());
        timing.thermal = elapsed;

        let ((storage_devices, nvme_devices), elapsed) = timed(|| {
            // One join of partitions and mounts per snapshot.
            let partitions = system.read_partitions();
            let mounts = system.read_mounts();
            (
                block.storage_devices(&mounts),
                block.nvme_devices(&partitions, &mounts),
            )
        });
        timing.storage = elapsed;

        let (gpu, elapsed) = timed(|| hardware.gpu());
        timing.gpu = elapsed;

        let ((battery, backlight), elapsed) = timed(|| (hardware.battery(), hardware.backlight()));
        timing.power = elapsed;

        let ((motherboard, clock_source), elapsed) =
            timed(|| (hardware.motherboard(), hardware.clock_source()));
        timing.board = elapsed;

        PendingSnapshot {
            snapshot: HostSnapshot {
                observed_at: Utc::now(),
                cpu: None,
                ram,
                network: None,
                temperature_sensors,
                storage_devices,
                nvme_devices,
                gpu,
                battery,
                backlight,
                motherboard,
                clock_source,
            },
            cpuinfo,
            topology,
            policies,
            routes,
        }
    }
}

/// Snapshot under construction plus the static CPU and network parts waiting
/// for their samplers.
struct PendingSnapshot {
    snapshot: HostSnapshot,
    cpuinfo: Option<CpuInfoTable>,
    topology: CpuTopology,
    policies: Vec<SchedulerPolicy>,
    routes: Option<Vec<NetworkRoute>>,
}

/// CPU sub-aggregate, present when either `/proc/cpuinfo` or a usage sample
/// is available.
fn finish_cpu(pending: &mut PendingSnapshot, stat: Option<&Sample<CpuStatTable>>) -> Option<Cpu> {
    let usage = stat.and_then(sampler::cpu_usage);
    let cpuinfo = pending.cpuinfo.take();
    if cpuinfo.is_none() && usage.is_none() {
        debug!("cpu not available");
        return None;
    }

    Some(Cpu {
        info: cpu_info(cpuinfo.as_ref(), std::mem::take(&mut pending.topology)),
        usage,
        frequency: cpuinfo.as_ref().and_then(cpu_frequency),
        scheduler_policies: std::mem::take(&mut pending.policies),
    })
}

fn cpu_info(cpuinfo: Option<&CpuInfoTable>, topology: CpuTopology) -> CpuInfo {
    CpuInfo {
        model_name: cpuinfo.and_then(|c| c.model_name.clone()),
        cores: topology.cores,
        threads: cpuinfo.map_or(0, |c| c.processors.len()),
        dies: topology.dies,
        governors: topology.governors,
        max_frequency: topology.max_frequency,
        clock_boost: topology.clock_boost,
        architecture: format!("{} bit", usize::BITS),
        byte_order: ByteOrder::native(),
    }
}

/// Network sub-aggregate, present when either the rate or any socket table
/// is available.
fn finish_network(
    pending: &mut PendingSnapshot,
    net_dev: Option<&Sample<NetDevTotals>>,
) -> Option<Network> {
    let rate = net_dev.map(sampler::network_rate);
    let routes = pending.routes.take();
    if rate.is_none() && routes.is_none() {
        debug!("network not available");
        return None;
    }
    Some(Network {
        rate,
        routes: routes.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::model::{BatteryStatus, RouteType};
    use crate::units::{ByteSize, Frequency};
    use std::path::Path;

    fn fast_config() -> CollectorConfig {
        CollectorConfig::default()
            .with_cpu_sample_interval(Duration::from_millis(5))
            .with_network_sample_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_typical_desktop_snapshot() {
        let config = CollectorConfig::default().with_cpu_sample_interval(Duration::from_millis(5));
        let mut collector = Collector::new(MockFs::typical_desktop(), config).unwrap();
        let snapshot = collector.collect_snapshot();

        let cpu = snapshot.cpu.as_ref().unwrap();
        assert_eq!(
            cpu.info.model_name.as_deref(),
            Some("AMD Ryzen 5 5600X 6-Core Processor")
        );
        assert_eq!(cpu.info.threads, 4);
        assert_eq!(cpu.info.cores, 2);
        assert_eq!(cpu.info.dies, 1);
        assert_eq!(cpu.info.governors, vec!["performance", "schedutil"]);
        assert_eq!(cpu.info.max_frequency, Some(Frequency::from_khz(4_200_000)));
        assert_eq!(cpu.info.clock_boost, Some(true));
        assert_eq!(cpu.scheduler_policies.len(), 2);

        let usage = cpu.usage.as_ref().unwrap();
        assert_eq!(usage.average.total, 25.0);
        assert_eq!(usage.processors.len(), 4);
        assert_eq!(usage.processors[0].total, 100.0);
        assert_eq!(usage.processors[1].total, 0.0);

        let frequency = cpu.frequency.as_ref().unwrap();
        assert_eq!(frequency.processors.len(), 4);
        assert_eq!(frequency.average.khz(), 2_750_000);

        assert_eq!(snapshot.ram.unwrap().usage, Some(75.0));

        let network = snapshot.network.as_ref().unwrap();
        let rate = network.rate.unwrap();
        assert_eq!(rate.download, 2000.0);
        assert_eq!(rate.upload, 400.0);
        assert_eq!(network.routes.len(), 4);
        assert_eq!(network.routes[0].local_address, "127.0.0.1");
        assert_eq!(network.routes[0].local_port, 8080);
        assert_eq!(network.routes[1].remote_port, 443);
        assert_eq!(network.routes[2].route_type, RouteType::Udp);
        assert_eq!(network.routes[2].local_port, 53);
        assert_eq!(network.routes[3].local_port, 631);
        assert_eq!(network.routes[3].route_type, RouteType::Tcp6);

        assert_eq!(snapshot.temperature_sensors.as_ref().unwrap().len(), 3);

        let storage = snapshot.storage_devices.as_ref().unwrap();
        assert_eq!(storage.len(), 2);
        assert_eq!(storage[0].device, "/dev/sda");
        assert_eq!(storage[0].partitions[0].mount_point.as_deref(), Some("/mnt/data"));
        assert_eq!(storage[1].device, "/dev/vda");

        let nvme = snapshot.nvme_devices.as_ref().unwrap();
        assert_eq!(nvme.len(), 1);
        assert_eq!(nvme[0].partitions.len(), 2);

        let gpu = snapshot.gpu.as_ref().unwrap();
        assert_eq!(gpu.card, "card0");
        assert_eq!(gpu.usage, Some(12.0));
        assert!(gpu.metrics.is_some());

        let battery = snapshot.battery.unwrap();
        assert_eq!(battery.capacity, Some(87));
        assert_eq!(battery.status, BatteryStatus::Charging);
        assert_eq!(snapshot.backlight.unwrap().max_brightness, 255);
        assert_eq!(
            snapshot.motherboard.as_ref().unwrap().bios.version.as_deref(),
            Some("F16d")
        );
        assert_eq!(
            snapshot.clock_source.as_ref().unwrap().current.as_deref(),
            Some("tsc")
        );
    }

    #[test]
    fn test_minimal_server_snapshot() {
        let mut collector = Collector::new(MockFs::minimal_server(), fast_config()).unwrap();
        let snapshot = collector.collect_snapshot();

        assert!(snapshot.gpu.is_none());
        assert!(snapshot.battery.is_none());
        assert!(snapshot.backlight.is_none());
        assert!(snapshot.nvme_devices.is_none());
        assert!(snapshot.motherboard.is_none());

        // Counters do not move: zero rates, zero busy time.
        let usage = snapshot.cpu.as_ref().unwrap().usage.as_ref().unwrap();
        assert_eq!(usage.average.total, 0.0);
        let rate = snapshot.network.as_ref().unwrap().rate.unwrap();
        assert_eq!(rate.download, 0.0);
        assert_eq!(rate.upload, 0.0);

        let storage = snapshot.storage_devices.as_ref().unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage[0].size, ByteSize::from_sectors(83886080));
        assert_eq!(storage[0].partitions[0].filesystem.as_deref(), Some("ext4"));
    }

    #[test]
    fn test_missing_power_supply_keeps_rest() {
        let mut fs = MockFs::typical_desktop();
        fs.remove("/sys/class/power_supply");
        let mut collector = Collector::new(fs, fast_config()).unwrap();
        let snapshot = collector.collect_snapshot();

        assert!(snapshot.battery.is_none());
        assert!(snapshot.cpu.is_some());
        assert!(snapshot.ram.is_some());
        assert!(snapshot.network.is_some());
        assert!(snapshot.temperature_sensors.is_some());
        assert!(snapshot.storage_devices.is_some());
        assert!(snapshot.nvme_devices.is_some());
        assert!(snapshot.gpu.is_some());
        assert!(snapshot.backlight.is_some());
        assert!(snapshot.motherboard.is_some());
        assert!(snapshot.clock_source.is_some());
    }

    #[test]
    fn test_unsupported_platform() {
        let mut fs = MockFs::minimal_server();
        fs.remove("/proc");
        match Collector::new(fs, fast_config()) {
            Err(SnapshotError::UnsupportedPlatform { missing }) => {
                assert_eq!(missing, Path::new("/proc"));
            }
            other => panic!("expected UnsupportedPlatform, got {:?}", other.err()),
        }

        let mut fs = MockFs::minimal_server();
        fs.remove("/sys");
        let err = Collector::new(fs, fast_config()).err().unwrap();
        assert!(err.to_string().contains("/sys"));
    }

    #[test]
    fn test_config_validation() {
        let config = fast_config().with_cpu_sample_interval(Duration::from_secs(60));
        assert!(matches!(
            Collector::new(MockFs::minimal_server(), config),
            Err(SnapshotError::Config(_))
        ));

        let config = fast_config().with_sys_path("");
        assert!(config.validate().is_err());
        assert!(fast_config().validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: CollectorConfig =
            serde_json::from_str(r#"{"proc-path": "/host/proc", "parallel-sampling": false}"#)
                .unwrap();
        assert_eq!(config.proc_path, PathBuf::from("/host/proc"));
        assert_eq!(config.sys_path, PathBuf::from("/sys"));
        assert_eq!(config.cpu_sample_interval, CPU_SAMPLE_INTERVAL);
        assert!(!config.parallel_sampling);
    }

    #[test]
    fn test_sequential_sampling_matches_parallel() {
        let config = fast_config()
            .with_network_sample_interval(Duration::from_micros(62_500))
            .with_parallel_sampling(false);
        let mut collector = Collector::new(MockFs::typical_desktop(), config).unwrap();
        let snapshot = collector.collect_snapshot();

        let usage = snapshot.cpu.as_ref().unwrap().usage.as_ref().unwrap();
        assert_eq!(usage.average.total, 25.0);
        // 1000 bytes received over 62.5 ms
        let rate = snapshot.network.as_ref().unwrap().rate.unwrap();
        assert_eq!(rate.download, 16_000.0);
    }

    #[test]
    fn test_each_source_read_once_outside_samplers() {
        let mut collector = Collector::new(MockFs::typical_desktop(), fast_config()).unwrap();
        collector.collect_snapshot();

        let fs = collector.fs();
        assert_eq!(fs.read_count("/proc/stat"), 2);
        assert_eq!(fs.read_count("/proc/net/dev"), 2);
        assert_eq!(fs.read_count("/proc/meminfo"), 1);
        assert_eq!(fs.read_count("/proc/cpuinfo"), 1);
        assert_eq!(fs.read_count("/proc/partitions"), 1);
        assert_eq!(fs.read_count("/proc/mounts"), 1);
        assert_eq!(fs.read_count("/sys/class/drm/card0/device/gpu_metrics"), 1);
    }

    #[test]
    fn test_last_timing() {
        let config = fast_config().with_cpu_sample_interval(Duration::from_millis(20));
        let mut collector = Collector::new(MockFs::minimal_server(), config).unwrap();
        assert!(collector.last_timing().is_none());

        collector.collect_snapshot();
        let timing = collector.last_timing().unwrap();
        assert!(timing.cpu >= Duration::from_millis(20));
        assert!(timing.total >= Duration::from_millis(20));
    }

    #[test]
    fn test_snapshot_serializes_kebab_case() {
        let mut collector = Collector::new(MockFs::typical_desktop(), fast_config()).unwrap();
        let snapshot = collector.collect_snapshot();
        let value = serde_json::to_value(&snapshot).unwrap();

        for key in [
            "observed-at",
            "temperature-sensors",
            "storage-devices",
            "nvme-devices",
            "clock-source",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value["cpu"]["usage"]["average"]["soft-interrupt"].is_number());
        assert_eq!(value["ram"]["size"], serde_json::json!(1_024_000_000u64));
        assert_eq!(value["battery"]["status"], serde_json::json!("charging"));

        let back: HostSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back.ram, snapshot.ram);
    }

    #[test]
    fn test_real_fs_partial_tree() {
        let dir = tempfile::tempdir().unwrap();
        let proc_path = dir.path().join("proc");
        let sys_path = dir.path().join("sys");
        std::fs::create_dir_all(&proc_path).unwrap();
        std::fs::create_dir_all(&sys_path).unwrap();
        std::fs::write(
            proc_path.join("meminfo"),
            "MemTotal: 1000000 kB\nMemAvailable: 250000 kB\n",
        )
        .unwrap();

        let config = CollectorConfig::default()
            .with_proc_path(&proc_path)
            .with_sys_path(&sys_path)
            .with_cpu_sample_interval(Duration::ZERO)
            .with_network_sample_interval(Duration::ZERO);
        let mut collector = Collector::new(RealFs::new(), config).unwrap();
        let snapshot = collector.collect_snapshot();

        assert_eq!(snapshot.ram.unwrap().usage, Some(75.0));
        assert!(snapshot.cpu.is_none());
        assert!(snapshot.network.is_none());
        assert!(snapshot.temperature_sensors.is_none());
        assert!(snapshot.storage_devices.is_none());
        assert!(snapshot.gpu.is_none());
        assert!(snapshot.battery.is_none());
    }
}
