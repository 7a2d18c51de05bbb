//! Device discovery under `/sys/class`.
//!
//! Each function returns every matching candidate in sorted entry-name order.
//! Collectors use the first one: first match wins.

use std::path::{Path, PathBuf};

use crate::collector::source::SourceReader;
use crate::collector::traits::FileSystem;

/// DRM card nodes (`card0`, `card1`, ...) that expose a `device` link.
///
/// Connector nodes such as `card0-DP-1` are skipped.
pub fn gpu_cards<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Vec<PathBuf> {
    reader
        .list_paths(sys_path.join("class/drm"))
        .into_iter()
        .filter(|(name, _)| is_card_node(name))
        .filter(|(_, path)| reader.exists(path.join("device")))
        .map(|(_, path)| path)
        .collect()
}

fn is_card_node(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Power supplies of type `Battery` that report both status and capacity.
pub fn batteries<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Vec<PathBuf> {
    reader
        .list_paths(sys_path.join("class/power_supply"))
        .into_iter()
        .map(|(_, path)| path)
        .filter(|path| reader.read_trimmed(path.join("type")).as_deref() == Some("Battery"))
        .filter(|path| reader.exists(path.join("status")) && reader.exists(path.join("capacity")))
        .collect()
}

/// Backlight devices that expose a brightness attribute.
pub fn backlights<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Vec<PathBuf> {
    reader
        .list_paths(sys_path.join("class/backlight"))
        .into_iter()
        .map(|(_, path)| path)
        .filter(|path| reader.exists(path.join("brightness")))
        .collect()
}

pub fn discover_gpu_card<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Option<PathBuf> {
    gpu_cards(reader, sys_path).into_iter().next()
}

pub fn discover_battery<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Option<PathBuf> {
    batteries(reader, sys_path).into_iter().next()
}

pub fn discover_backlight<F: FileSystem>(reader: &SourceReader<F>, sys_path: &Path) -> Option<PathBuf> {
    backlights(reader, sys_path).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    const SYS: &str = "/sys";

    #[test]
    fn test_gpu_cards_skip_connectors() {
        let mut fs = MockFs::new();
        fs.add_dir("/sys/class/drm/card1/device");
        fs.add_dir("/sys/class/drm/card0/device");
        fs.add_dir("/sys/class/drm/card0-DP-1");
        fs.add_dir("/sys/class/drm/renderD128");
        fs.add_dir("/sys/class/drm/card2");
        let reader = SourceReader::new(fs);

        let cards = gpu_cards(&reader, Path::new(SYS));
        assert_eq!(
            cards,
            vec![
                PathBuf::from("/sys/class/drm/card0"),
                PathBuf::from("/sys/class/drm/card1"),
            ]
        );
        assert_eq!(
            discover_gpu_card(&reader, Path::new(SYS)),
            Some(PathBuf::from("/sys/class/drm/card0"))
        );
    }

    #[test]
    fn test_battery_requires_type_status_capacity() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/power_supply/AC/type", "Mains\n");
        fs.add_file("/sys/class/power_supply/AC/online", "1\n");
        fs.add_file("/sys/class/power_supply/BAT0/type", "Battery\n");
        fs.add_file("/sys/class/power_supply/BAT0/status", "Charging\n");
        fs.add_file("/sys/class/power_supply/BAT1/type", "Battery\n");
        fs.add_file("/sys/class/power_supply/BAT1/status", "Full\n");
        fs.add_file("/sys/class/power_supply/BAT1/capacity", "100\n");
        let reader = SourceReader::new(fs);

        assert_eq!(
            discover_battery(&reader, Path::new(SYS)),
            Some(PathBuf::from("/sys/class/power_supply/BAT1"))
        );
    }

    #[test]
    fn test_discovery_without_class_dirs() {
        let reader = SourceReader::new(MockFs::new());
        assert_eq!(discover_gpu_card(&reader, Path::new(SYS)), None);
        assert_eq!(discover_battery(&reader, Path::new(SYS)), None);
        assert_eq!(discover_backlight(&reader, Path::new(SYS)), None);
    }

    #[test]
    fn test_backlight_first_match() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/backlight/intel_backlight/brightness", "400\n");
        fs.add_file("/sys/class/backlight/acpi_video0/max_brightness", "15\n");
        let reader = SourceReader::new(fs);

        assert_eq!(
            discover_backlight(&reader, Path::new(SYS)),
            Some(PathBuf::from("/sys/class/backlight/intel_backlight"))
        );
    }
}
