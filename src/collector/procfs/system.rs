//! System collector for gathering host-wide values from `/proc/`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::procfs::net_route::ROUTE_TABLES;
use crate::collector::procfs::parser::{
    self, CpuInfo as CpuInfoTable, CpuStatTable, MountEntry, NetDevTotals, PartitionEntry,
};
use crate::collector::source::SourceReader;
use crate::collector::traits::FileSystem;
use crate::model::{CpuFrequency, NetworkRoute, ProcessorFrequency, Ram};
use crate::units::{ByteSize, Frequency};

/// Collects host-wide values from `/proc/`.
pub struct SystemCollector<'a, F: FileSystem> {
    reader: &'a SourceReader<F>,
    proc_path: PathBuf,
}

impl<'a, F: FileSystem> SystemCollector<'a, F> {
    /// Creates a new system collector.
    ///
    /// # Arguments
    /// * `reader` - Source reader over the real or mock filesystem
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(reader: &'a SourceReader<F>, proc_path: impl AsRef<Path>) -> Self {
        Self {
            reader,
            proc_path: proc_path.as_ref().to_path_buf(),
        }
    }

    /// Reads the CPU rows of `/proc/stat`.
    ///
    /// Returns `None` when the file is absent or has no aggregate row.
    pub fn read_stat(&self) -> Option<CpuStatTable> {
        let content = self.reader.read_string(self.proc_path.join("stat"))?;
        let table = parser::parse_stat_cpus(&content);
        if table.aggregate.is_none() {
            debug!("no aggregate cpu row in stat");
            return None;
        }
        Some(table)
    }

    /// Reads host-wide byte counters from `/proc/net/dev`.
    pub fn read_net_dev(&self) -> Option<NetDevTotals> {
        let content = self.reader.read_string(self.proc_path.join("net/dev"))?;
        let totals = parser::parse_net_dev(&content);
        debug!(interfaces = totals.interfaces, "summed net/dev counters");
        Some(totals)
    }

    /// Parses `/proc/cpuinfo`.
    pub fn read_cpuinfo(&self) -> Option<CpuInfoTable> {
        let content = self.reader.read_string(self.proc_path.join("cpuinfo"))?;
        Some(parser::parse_cpuinfo(&content))
    }

    pub fn read_partitions(&self) -> Vec<PartitionEntry> {
        self.reader
            .read_string(self.proc_path.join("partitions"))
            .map(|c| parser::parse_partitions(&c))
            .unwrap_or_default()
    }

    pub fn read_mounts(&self) -> HashMap<String, MountEntry> {
        self.reader
            .read_string(self.proc_path.join("mounts"))
            .map(|c| parser::parse_mounts(&c))
            .unwrap_or_default()
    }

    /// Collects memory size and usage from `/proc/meminfo`.
    ///
    /// Usage is `(MemTotal - MemAvailable) / MemTotal` as a percentage.
    pub fn collect_ram(&self) -> Option<Ram> {
        let content = self.reader.read_string(self.proc_path.join("meminfo"))?;
        let info = parser::parse_meminfo(&content);
        let total = info.mem_total?;

        let usage = info
            .mem_available
            .filter(|_| total > 0)
            .map(|available| (total.saturating_sub(available) as f64 * 100.0 / total as f64) as f32);

        Some(Ram {
            size: ByteSize::from_kib(total),
            usage,
        })
    }

    /// Decodes the four socket tables in tcp, udp, tcp6, udp6 order.
    ///
    /// Returns `None` only when none of the tables could be read.
    pub fn collect_routes(&self) -> Option<Vec<NetworkRoute>> {
        let mut any = false;
        let mut routes = Vec::new();
        for table in &ROUTE_TABLES {
            if let Some(content) = self.reader.read_string(self.proc_path.join(table.relative_path)) {
                any = true;
                routes.extend(table.decode(&content));
            }
        }
        any.then_some(routes)
    }
}

/// Instantaneous per-processor frequency and its arithmetic mean.
///
/// Returns `None` when no processor reports `cpu MHz`.
pub fn cpu_frequency(cpuinfo: &CpuInfoTable) -> Option<CpuFrequency> {
    let processors: Vec<ProcessorFrequency> = cpuinfo
        .processors
        .iter()
        .filter_map(|p| {
            Some(ProcessorFrequency {
                processor: p.processor,
                frequency: Frequency::from_mhz(p.mhz?),
            })
        })
        .collect();

    let average = Frequency::mean(processors.iter().map(|p| p.frequency))?;
    Some(CpuFrequency {
        average,
        processors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::model::RouteType;

    fn reader(files: &[(&str, &str)]) -> SourceReader<MockFs> {
        let mut fs = MockFs::new();
        for (path, content) in files {
            fs.add_file(path, *content);
        }
        SourceReader::new(fs)
    }

    #[test]
    fn test_collect_ram() {
        let r = reader(&[(
            "/proc/meminfo",
            "MemTotal:       1000000 kB\nMemFree:  100000 kB\nMemAvailable:    250000 kB\n",
        )]);
        let ram = SystemCollector::new(&r, "/proc").collect_ram().unwrap();
        assert_eq!(ram.usage, Some(75.0));
        assert_eq!(ram.size, ByteSize::from_bytes(1_024_000_000));
    }

    #[test]
    fn test_collect_ram_without_available() {
        let r = reader(&[("/proc/meminfo", "MemTotal: 2048 kB\n")]);
        let ram = SystemCollector::new(&r, "/proc").collect_ram().unwrap();
        assert_eq!(ram.usage, None);
        assert_eq!(ram.size.kib(), 2048.0);

        let r = reader(&[("/proc/meminfo", "MemAvailable: 2048 kB\n")]);
        assert_eq!(SystemCollector::new(&r, "/proc").collect_ram(), None);
    }

    #[test]
    fn test_read_stat_requires_aggregate() {
        let r = reader(&[("/proc/stat", "cpu0 1 2 3 4 5 6 7\n")]);
        assert_eq!(SystemCollector::new(&r, "/proc").read_stat(), None);

        let r = reader(&[("/proc/stat", "cpu 1 2 3 4 5 6 7\ncpu0 1 2 3 4 5 6 7\n")]);
        let table = SystemCollector::new(&r, "/proc").read_stat().unwrap();
        assert_eq!(table.processors.len(), 1);
    }

    #[test]
    fn test_read_net_dev_sums_interfaces() {
        let r = reader(&[(
            "/proc/net/dev",
            "Inter-|   Receive |  Transmit\n face |bytes packets|bytes packets\n    lo: 100 1 0 0 0 0 0 0 300 1 0 0 0 0 0 0\n  eth0: 900 9 0 0 0 0 0 0 700 7 0 0 0 0 0 0\n",
        )]);
        let totals = SystemCollector::new(&r, "/proc").read_net_dev().unwrap();
        assert_eq!(totals.rx_bytes, 1000);
        assert_eq!(totals.tx_bytes, 1000);
        assert_eq!(totals.interfaces, 2);
    }

    #[test]
    fn test_collect_routes() {
        let r = reader(&[
            (
                "/proc/net/tcp",
                "  sl  local_address rem_address   st\n   0: 0100007F:901F 00000000:0000 0A\n",
            ),
            (
                "/proc/net/udp6",
                "  sl  local_address rem_address   st\n   0: 00000000000000000000000000000000:3500 00000000000000000000000000000000:0000 07\n",
            ),
        ]);
        let routes = SystemCollector::new(&r, "/proc").collect_routes().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].route_type, RouteType::Tcp);
        assert_eq!(routes[0].local_port, 8080);
        assert_eq!(routes[1].route_type, RouteType::Udp6);
        assert_eq!(routes[1].local_port, 53);

        let r = reader(&[]);
        assert_eq!(SystemCollector::new(&r, "/proc").collect_routes(), None);
    }

    #[test]
    fn test_cpu_frequency_mean() {
        let cpuinfo = parser::parse_cpuinfo(
            "processor\t: 0\ncpu MHz\t\t: 1000.000\n\nprocessor\t: 1\ncpu MHz\t\t: 3000.500\n\nprocessor\t: 2\n",
        );
        let freq = cpu_frequency(&cpuinfo).unwrap();
        assert_eq!(freq.processors.len(), 2);
        assert_eq!(freq.processors[1].processor, Some(1));
        assert_eq!(freq.processors[1].frequency.khz(), 3_000_500);
        assert_eq!(freq.average.khz(), 2_000_250);
    }

    #[test]
    fn test_cpu_frequency_absent() {
        let cpuinfo = parser::parse_cpuinfo("processor\t: 0\nmodel name\t: ARMv8\n");
        assert_eq!(cpu_frequency(&cpuinfo), None);
    }
}
