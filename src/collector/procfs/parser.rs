//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.
//! Malformed lines are skipped and unparsable numbers degrade to zero; none of
//! them can fail the enclosing snapshot.

use std::collections::HashMap;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ /proc/stat ============

/// Minimum number of leading counters a cpu line must carry.
pub const MIN_CPU_COUNTERS: usize = 7;

/// Single CPU line from `/proc/stat`, counters in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Sum of the accounted time categories.
    ///
    /// guest and guest_nice are already folded into user and nice by the
    /// kernel, so they are not counted again. Saturates on garbage input.
    pub fn total(&self) -> u64 {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(self.user, u64::saturating_add)
    }
}

/// CPU rows of `/proc/stat`, aggregate first when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuStatTable {
    pub aggregate: Option<CpuTimes>,
    pub processors: Vec<CpuTimes>,
}

/// Parses the cpu lines of `/proc/stat`.
///
/// Format:
/// cpu  10000 500 3000 80000 1000 200 100 0 0 0
/// cpu0 2500 125 750 20000 250 50 25 0 0 0
///
/// Lines with fewer than [`MIN_CPU_COUNTERS`] numeric counters are dropped.
/// Counters past steal are ignored.
pub fn parse_stat_cpus(content: &str) -> CpuStatTable {
    let mut table = CpuStatTable::default();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else {
            continue;
        };
        let Some(suffix) = label.strip_prefix("cpu") else {
            continue;
        };

        let cpu_id = if suffix.is_empty() {
            None
        } else {
            match suffix.parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) => continue,
            }
        };

        let counters: Vec<u64> = parts.map_while(|s| s.parse().ok()).collect();
        if counters.len() < MIN_CPU_COUNTERS {
            continue;
        }

        let get_val = |idx: usize| -> u64 { counters.get(idx).copied().unwrap_or(0) };
        let times = CpuTimes {
            cpu_id,
            user: get_val(0),
            nice: get_val(1),
            system: get_val(2),
            idle: get_val(3),
            iowait: get_val(4),
            irq: get_val(5),
            softirq: get_val(6),
            steal: get_val(7),
        };

        match cpu_id {
            None if table.aggregate.is_none() => table.aggregate = Some(times),
            None => {}
            Some(_) => table.processors.push(times),
        }
    }

    table
}

// ============ /proc/meminfo ============

/// The two `/proc/meminfo` values the snapshot consumes, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total: Option<u64>,
    pub mem_available: Option<u64>,
}

/// Parses `/proc/meminfo` content.
///
/// Format is `Key:   value kB`, one per line.
pub fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();

    let parse_kb = |value: &str| -> Option<u64> {
        value
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
    };

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "MemTotal" => info.mem_total = parse_kb(value),
            "MemAvailable" => info.mem_available = parse_kb(value),
            _ => {}
        }
    }

    info
}

// ============ /proc/net/dev ============

/// Byte counters summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetDevTotals {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub interfaces: usize,
}

/// Parses `/proc/net/dev` into host-wide receive/transmit byte totals.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
///
/// Receive bytes are the first value after the colon, transmit bytes the ninth.
pub fn parse_net_dev(content: &str) -> NetDevTotals {
    let mut totals = NetDevTotals::default();

    for line in content.lines() {
        // Skip header lines
        if line.contains('|') {
            continue;
        }
        let Some((_, values)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = values.split_whitespace().collect();
        if values.len() < 9 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        totals.rx_bytes = totals.rx_bytes.wrapping_add(get_val(0));
        totals.tx_bytes = totals.tx_bytes.wrapping_add(get_val(8));
        totals.interfaces += 1;
    }

    totals
}

// ============ /proc/cpuinfo ============

/// One processor record of `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuInfoProcessor {
    pub processor: Option<u32>,
    pub mhz: Option<f64>,
}

/// Parsed `/proc/cpuinfo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuInfo {
    /// "model name" of the first record.
    pub model_name: Option<String>,
    pub processors: Vec<CpuInfoProcessor>,
}

/// Parses `/proc/cpuinfo` content.
///
/// Records are separated by a blank line; fields are `key\t: value`.
pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut info = CpuInfo::default();

    for record in content.split("\n\n") {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for line in record.lines() {
            if let Some((key, value)) = line.split_once(':') {
                fields.entry(key.trim()).or_insert(value.trim());
            }
        }

        let Some(processor) = fields.get("processor") else {
            continue;
        };

        if info.processors.is_empty() {
            info.model_name = fields
                .get("model name")
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
        }

        info.processors.push(CpuInfoProcessor {
            processor: processor.parse().ok(),
            mhz: fields.get("cpu MHz").and_then(|s| s.parse().ok()),
        });
    }

    info
}

// ============ /proc/partitions ============

/// One row of `/proc/partitions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    pub major: u32,
    pub minor: u32,
    /// Size in 1 KiB blocks.
    pub blocks: u64,
    pub name: String,
}

/// Parses `/proc/partitions` content.
///
/// Format:
/// major minor  #blocks  name
///
///  259        0  500107608 nvme0n1
pub fn parse_partitions(content: &str) -> Vec<PartitionEntry> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 {
                return None;
            }
            Some(PartitionEntry {
                major: parts[0].parse().ok()?,
                minor: parts[1].parse().ok()?,
                blocks: parts[2].parse().ok()?,
                name: parts[3].to_string(),
            })
        })
        .collect()
}

// ============ /proc/mounts ============

/// Where a block device is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub mount_point: String,
    pub filesystem: String,
}

/// Parses `/proc/mounts` into a map keyed by device short name (`sda1`).
///
/// Only `/dev/*` sources are kept. When a device is mounted more than once
/// the first mount listed wins.
pub fn parse_mounts(content: &str) -> HashMap<String, MountEntry> {
    let mut mounts = HashMap::new();

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(source), Some(mount_point), Some(filesystem)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let Some(short_name) = source.strip_prefix("/dev/") else {
            continue;
        };

        mounts
            .entry(short_name.to_string())
            .or_insert_with(|| MountEntry {
                mount_point: unescape_mount_field(mount_point),
                filesystem: filesystem.to_string(),
            });
    }

    mounts
}

/// Decodes the octal escapes (`\040` for space) the kernel uses in mount fields.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let code = (bytes[i + 1] - b'0') as u32 * 64
                + (bytes[i + 2] - b'0') as u32 * 8
                + (bytes[i + 3] - b'0') as u32;
            if let Ok(byte) = u8::try_from(code) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
