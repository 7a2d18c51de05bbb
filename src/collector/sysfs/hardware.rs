//! Single-shot hardware attributes from `/sys`: thermal sensors, GPU, power
//! supply, backlight, DMI board data and the clock source.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collector::source::SourceReader;
use crate::collector::sysfs::discovery;
use crate::collector::sysfs::gpu_metrics::decode_gpu_metrics;
use crate::collector::traits::FileSystem;
use crate::model::{
    Backlight, Battery, BatteryStatus, Bios, ClockSource, Gpu, Motherboard, TemperatureSensor,
};
use crate::units::ByteSize;

const DMI_ID: &str = "devices/virtual/dmi/id";
const CLOCKSOURCE: &str = "devices/system/clocksource/clocksource0";

/// Collector for hardware attributes under the sysfs root.
pub struct HardwareCollector<'a, F: FileSystem> {
    reader: &'a SourceReader<F>,
    sys_path: PathBuf,
}

impl<'a, F: FileSystem> HardwareCollector<'a, F> {
    /// Creates a new HardwareCollector.
    ///
    /// # Arguments
    /// * `reader` - Source reader over the real or mock filesystem
    /// * `sys_path` - Base path to sysfs (usually "/sys")
    pub fn new(reader: &'a SourceReader<F>, sys_path: impl AsRef<Path>) -> Self {
        Self {
            reader,
            sys_path: sys_path.as_ref().to_path_buf(),
        }
    }

    /// Reads `temp1_input` of every hwmon device.
    ///
    /// The label is the hwmon `name` attribute, falling back to the directory
    /// name. Returns `None` only when the hwmon class directory is missing.
    pub fn temperature_sensors(&self) -> Option<Vec<TemperatureSensor>> {
        let hwmon = self.sys_path.join("class/hwmon");
        if !self.reader.exists(&hwmon) {
            debug!("hwmon class not present");
            return None;
        }

        let sensors = self
            .reader
            .list_paths(&hwmon)
            .into_iter()
            .map(|(name, path)| TemperatureSensor {
                label: self.reader.read_trimmed(path.join("name")).unwrap_or(name),
                // millidegrees Celsius
                temperature: self
                    .reader
                    .read_parsed::<f64>(path.join("temp1_input"))
                    .map(|millis| millis / 1000.0),
            })
            .collect();
        Some(sensors)
    }

    /// GPU attributes of the first DRM card with a device link.
    pub fn gpu(&self) -> Option<Gpu> {
        let Some(card) = discovery::discover_gpu_card(self.reader, &self.sys_path) else {
            debug!("no gpu card discovered");
            return None;
        };
        let device = card.join("device");

        let vram_total: Option<u64> = self.reader.read_parsed(device.join("mem_info_vram_total"));
        let vram_used: Option<u64> = self.reader.read_parsed(device.join("mem_info_vram_used"));
        let vram_usage = match (vram_total, vram_used) {
            (Some(total), Some(used)) if total > 0 => Some((used as f64 * 100.0 / total as f64) as f32),
            _ => None,
        };

        Some(Gpu {
            card: card
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            usage: self.reader.read_parsed(device.join("gpu_busy_percent")),
            vram_size: vram_total.map(ByteSize::from_bytes),
            vram_usage,
            metrics: self
                .reader
                .read_bytes(device.join("gpu_metrics"))
                .and_then(|buf| decode_gpu_metrics(&buf)),
        })
    }

    /// Capacity and charging status of the first battery.
    pub fn battery(&self) -> Option<Battery> {
        let Some(path) = discovery::discover_battery(self.reader, &self.sys_path) else {
            debug!("no battery discovered");
            return None;
        };

        let capacity = self
            .reader
            .read_parsed::<u8>(path.join("capacity"))
            .filter(|c| *c <= 100);
        let status = self
            .reader
            .read_trimmed(path.join("status"))
            .map(|s| BatteryStatus::from_kernel(&s))
            .unwrap_or(BatteryStatus::Unknown);

        Some(Battery { capacity, status })
    }

    /// Brightness of the first backlight device.
    pub fn backlight(&self) -> Option<Backlight> {
        let path = discovery::discover_backlight(self.reader, &self.sys_path)?;
        Some(Backlight {
            brightness: self.reader.read_parsed(path.join("brightness"))?,
            max_brightness: self.reader.read_parsed(path.join("max_brightness"))?,
        })
    }

    /// Motherboard and BIOS identification from DMI.
    ///
    /// Returns `None` when no DMI attribute is readable at all.
    pub fn motherboard(&self) -> Option<Motherboard> {
        let dmi = self.sys_path.join(DMI_ID);
        let attr = |name: &str| self.reader.read_trimmed(dmi.join(name));

        let board = Motherboard {
            name: attr("board_name"),
            vendor: attr("board_vendor"),
            version: attr("board_version"),
            bios: Bios {
                vendor: attr("bios_vendor"),
                release: attr("bios_release"),
                version: attr("bios_version"),
                date: attr("bios_date"),
            },
        };

        let empty = board.name.is_none()
            && board.vendor.is_none()
            && board.version.is_none()
            && board.bios == Bios::default();
        (!empty).then_some(board)
    }

    /// Current and available kernel clock sources.
    pub fn clock_source(&self) -> Option<ClockSource> {
        let dir = self.sys_path.join(CLOCKSOURCE);
        let current = self.reader.read_trimmed(dir.join("current_clocksource"));
        let available = self.reader.read_words(dir.join("available_clocksource"));

        if current.is_none() && available.is_empty() {
            return None;
        }
        Some(ClockSource { current, available })
    }
}
