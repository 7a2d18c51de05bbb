//! CPU topology and cpufreq policies from `/sys/devices/system/cpu`.

use std::path::{Path, PathBuf};

use crate::collector::source::SourceReader;
use crate::collector::traits::FileSystem;
use crate::model::SchedulerPolicy;
use crate::units::Frequency;

/// Topology and frequency limits gathered across all processors and policies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CpuTopology {
    /// Highest `core_id` + 1, zero when no topology is exposed.
    pub cores: usize,
    /// Highest `die_id` + 1, zero when no topology is exposed.
    pub dies: usize,
    /// Union of available governors, in first-seen order.
    pub governors: Vec<String>,
    pub max_frequency: Option<Frequency>,
    pub clock_boost: Option<bool>,
}

pub struct CpuTopologyCollector<'a, F: FileSystem> {
    reader: &'a SourceReader<F>,
    cpu_path: PathBuf,
}

impl<'a, F: FileSystem> CpuTopologyCollector<'a, F> {
    pub fn new(reader: &'a SourceReader<F>, sys_path: impl AsRef<Path>) -> Self {
        Self {
            reader,
            cpu_path: sys_path.as_ref().join("devices/system/cpu"),
        }
    }

    /// `cpuN` directories, skipping `cpufreq`, `cpuidle` and friends.
    fn processor_dirs(&self) -> Vec<PathBuf> {
        self.reader
            .list_paths(&self.cpu_path)
            .into_iter()
            .filter(|(name, _)| {
                name.strip_prefix("cpu")
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
            .map(|(_, path)| path)
            .collect()
    }

    fn policy_dirs(&self) -> Vec<(String, PathBuf)> {
        self.reader
            .list_paths(self.cpu_path.join("cpufreq"))
            .into_iter()
            .filter(|(name, _)| name.starts_with("policy"))
            .collect()
    }

    pub fn topology(&self) -> CpuTopology {
        let processors = self.processor_dirs();
        let max_id = |attr: &str| {
            processors
                .iter()
                .filter_map(|p| self.reader.read_parsed::<usize>(p.join("topology").join(attr)))
                .max()
                .map_or(0, |id| id + 1)
        };

        let mut governors: Vec<String> = Vec::new();
        let mut max_frequency: Option<Frequency> = None;
        for (_, policy) in self.policy_dirs() {
            for governor in self.reader.read_words(policy.join("scaling_available_governors")) {
                if !governors.contains(&governor) {
                    governors.push(governor);
                }
            }
            if let Some(khz) = self.reader.read_parsed::<u64>(policy.join("cpuinfo_max_freq")) {
                let freq = Frequency::from_khz(khz);
                max_frequency = Some(max_frequency.map_or(freq, |m| m.max(freq)));
            }
        }

        let clock_boost = self
            .reader
            .read_parsed::<u8>(self.cpu_path.join("cpufreq/boost"))
            .map(|b| b != 0);

        CpuTopology {
            cores: max_id("core_id"),
            dies: max_id("die_id"),
            governors,
            max_frequency,
            clock_boost,
        }
    }

    /// One entry per cpufreq policy, in policy name order.
    pub fn scheduler_policies(&self) -> Vec<SchedulerPolicy> {
        self.policy_dirs()
            .into_iter()
            .map(|(name, path)| SchedulerPolicy {
                name,
                scaling_governor: self.reader.read_trimmed(path.join("scaling_governor")),
                scaling_driver: self.reader.read_trimmed(path.join("scaling_driver")),
                minimum_scaling: self
                    .reader
                    .read_parsed(path.join("scaling_min_freq"))
                    .map(Frequency::from_khz),
                maximum_scaling: self
                    .reader
                    .read_parsed(path.join("scaling_max_freq"))
                    .map(Frequency::from_khz),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    fn fixture() -> MockFs {
        let mut fs = MockFs::new();
        let base = "/sys/devices/system/cpu";
        for (cpu, core, die) in [(0, 0, 0), (1, 1, 0), (2, 0, 0), (3, 1, 0)] {
            fs.add_file(format!("{base}/cpu{cpu}/topology/core_id"), format!("{core}\n"));
            fs.add_file(format!("{base}/cpu{cpu}/topology/die_id"), format!("{die}\n"));
        }
        fs.add_dir(format!("{base}/cpuidle"));
        fs.add_file(format!("{base}/cpufreq/boost"), "1\n");
        for (policy, max) in [(0, 4_200_000), (1, 4_600_000)] {
            let dir = format!("{base}/cpufreq/policy{policy}");
            fs.add_file(format!("{dir}/scaling_governor"), "schedutil\n");
            fs.add_file(format!("{dir}/scaling_driver"), "acpi-cpufreq\n");
            fs.add_file(format!("{dir}/scaling_min_freq"), "400000\n");
            fs.add_file(format!("{dir}/scaling_max_freq"), format!("{max}\n"));
            fs.add_file(format!("{dir}/cpuinfo_max_freq"), format!("{max}\n"));
        }
        fs.add_file(
            format!("{base}/cpufreq/policy0/scaling_available_governors"),
            "performance schedutil\n",
        );
        fs.add_file(
            format!("{base}/cpufreq/policy1/scaling_available_governors"),
            "schedutil powersave\n",
        );
        fs
    }

    #[test]
    fn test_topology() {
        let reader = SourceReader::new(fixture());
        let topology = CpuTopologyCollector::new(&reader, "/sys").topology();

        assert_eq!(topology.cores, 2);
        assert_eq!(topology.dies, 1);
        assert_eq!(topology.governors, vec!["performance", "schedutil", "powersave"]);
        assert_eq!(topology.max_frequency, Some(Frequency::from_khz(4_600_000)));
        assert_eq!(topology.clock_boost, Some(true));
    }

    #[test]
    fn test_topology_missing() {
        let reader = SourceReader::new(MockFs::new());
        let topology = CpuTopologyCollector::new(&reader, "/sys").topology();
        assert_eq!(topology, CpuTopology::default());
    }

    #[test]
    fn test_scheduler_policies() {
        let reader = SourceReader::new(fixture());
        let policies = CpuTopologyCollector::new(&reader, "/sys").scheduler_policies();

        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0].name, "policy0");
        assert_eq!(policies[0].scaling_governor.as_deref(), Some("schedutil"));
        assert_eq!(policies[0].scaling_driver.as_deref(), Some("acpi-cpufreq"));
        assert_eq!(policies[0].minimum_scaling.map(|f| f.mhz()), Some(400.0));
        assert_eq!(policies[1].maximum_scaling.map(|f| f.ghz()), Some(4.6));
    }
}
