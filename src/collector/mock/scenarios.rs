//! Pre-built host scenarios for collector tests.

use super::MockFs;

const STAT_BEFORE: &str = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
processes 12345
procs_running 2
procs_blocked 0
";

// 400 jiffies per processor; cpu0 fully busy, the rest idle.
const STAT_AFTER: &str = "\
cpu  10300 500 3100 81200 1000 200 100 0 0 0
cpu0 2800 125 850 20000 250 50 25 0 0 0
cpu1 2500 125 750 20400 250 50 25 0 0 0
cpu2 2500 125 750 20400 250 50 25 0 0 0
cpu3 2500 125 750 20400 250 50 25 0 0 0
intr 1000400 50 0 0
ctxt 500400
btime 1700000000
processes 12350
procs_running 1
procs_blocked 0
";

const NET_DEV_BEFORE: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:     500       5    0    0    0     0          0         0      500       5    0    0    0     0       0          0
enp5s0:     500      10    0    0    0     0          0         0     1500      10    0    0    0     0       0          0
";

const NET_DEV_AFTER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:    1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
enp5s0:    1000      20    0    0    0     0          0         0     1200      20    0    0    0     0       0          0
";

const MEMINFO: &str = "\
MemTotal:       1000000 kB
MemFree:         100000 kB
MemAvailable:    250000 kB
Buffers:          50000 kB
Cached:          300000 kB
SwapTotal:             0 kB
SwapFree:              0 kB
";

const TCP: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:901F 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 41772 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:C4A2 5DB8D822:BB01 01 00000000:00000000 02:000A7D5C 00000000  1000        0 58121 2 0000000000000000 20 4 30 10 -1
";

const UDP: &str = "\
   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
  512: 3500007F:3500 00000000:0000 07 00000000:00000000 00:00000000 00000000   101        0 22042 2 0000000000000000 0
";

const TCP6: &str = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000001000000:7702 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 23519 1 0000000000000000 100 0 0 10 0
";

const UDP6: &str = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
";

impl MockFs {
    /// A four-thread desktop with a discrete GPU, a laptop battery, a
    /// backlight, one SATA disk and one NVMe drive.
    ///
    /// `/proc/stat` and `/proc/net/dev` change between the first and second
    /// read, so a snapshot sees non-zero rates.
    pub fn typical_desktop() -> Self {
        let mut fs = Self::minimal_server();

        fs.add_file_sequence("/proc/stat", [STAT_BEFORE, STAT_AFTER]);
        fs.add_file_sequence("/proc/net/dev", [NET_DEV_BEFORE, NET_DEV_AFTER]);
        fs.add_file("/proc/net/tcp6", TCP6);
        fs.add_file("/proc/net/udp6", UDP6);

        fs.add_file(
            "/proc/partitions",
            "\
major minor  #blocks  name

 259        0  500107608 nvme0n1
 259        1     524288 nvme0n1p1
 259        2  499582279 nvme0n1p2
   8        0  976762584 sda
   8        1  976761560 sda1
",
        );
        fs.add_file(
            "/proc/mounts",
            "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
/dev/nvme0n1p1 /boot/efi vfat rw,relatime 0 0
/dev/sda1 /mnt/data xfs rw,relatime 0 0
tmpfs /tmp tmpfs rw,nosuid,nodev 0 0
",
        );

        // Thermal
        fs.add_file("/sys/class/hwmon/hwmon1/name", "amdgpu\n");
        fs.add_file("/sys/class/hwmon/hwmon1/temp1_input", "52000\n");
        fs.add_file("/sys/class/hwmon/hwmon2/name", "nvme\n");
        fs.add_file("/sys/class/hwmon/hwmon2/temp1_input", "38850\n");

        // GPU
        let card = "/sys/class/drm/card0/device";
        fs.add_file(format!("{card}/gpu_busy_percent"), "12\n");
        fs.add_file(format!("{card}/mem_info_vram_total"), "8589934592\n");
        fs.add_file(format!("{card}/mem_info_vram_used"), "2147483648\n");
        fs.add_binary(format!("{card}/gpu_metrics"), gpu_metrics_block());
        fs.add_dir("/sys/class/drm/card0-DP-1");
        fs.add_dir("/sys/class/drm/renderD128");

        // Power
        fs.add_file("/sys/class/power_supply/AC/type", "Mains\n");
        fs.add_file("/sys/class/power_supply/AC/online", "1\n");
        fs.add_file("/sys/class/power_supply/BAT0/type", "Battery\n");
        fs.add_file("/sys/class/power_supply/BAT0/status", "Charging\n");
        fs.add_file("/sys/class/power_supply/BAT0/capacity", "87\n");
        fs.add_file("/sys/class/backlight/amdgpu_bl0/brightness", "128\n");
        fs.add_file("/sys/class/backlight/amdgpu_bl0/max_brightness", "255\n");

        // Storage: one SATA disk next to the virtio one, plus NVMe.
        fs.add_file("/sys/class/block/sda/size", "1953525168\n");
        fs.add_file("/sys/class/block/sda/device/model", "WDC WD10EZEX-08W\n");
        fs.add_file("/sys/class/block/sda1/partition", "1\n");
        fs.add_file("/sys/class/block/sda1/size", "1953523120\n");
        fs.add_file("/sys/class/block/sda1/start", "2048\n");
        fs.add_dir("/sys/class/block/nvme0n1/device");
        fs.add_file("/sys/class/block/nvme0n1p1/partition", "1\n");
        fs.add_file("/sys/class/block/nvme0n1p1/start", "2048\n");
        fs.add_file("/sys/class/block/nvme0n1p2/partition", "2\n");
        fs.add_file("/sys/class/block/nvme0n1p2/start", "1050624\n");
        fs.add_file("/sys/class/nvme/nvme0/model", "Samsung SSD 980 PRO 500GB\n");
        fs.add_file("/sys/class/nvme/nvme0/address", "0000:01:00.0\n");
        fs.add_file(
            "/sys/class/nvme/nvme0/device/current_link_speed",
            "16.0 GT/s PCIe\n",
        );
        fs.add_file("/sys/class/nvme/nvme0/device/current_link_width", "4\n");

        // Board
        let dmi = "/sys/devices/virtual/dmi/id";
        fs.add_file(format!("{dmi}/board_name"), "B550 AORUS ELITE\n");
        fs.add_file(format!("{dmi}/board_vendor"), "Gigabyte Technology Co., Ltd.\n");
        fs.add_file(format!("{dmi}/board_version"), "x.x\n");
        fs.add_file(format!("{dmi}/bios_vendor"), "American Megatrends International, LLC.\n");
        fs.add_file(format!("{dmi}/bios_release"), "5.17\n");
        fs.add_file(format!("{dmi}/bios_version"), "F16d\n");
        fs.add_file(format!("{dmi}/bios_date"), "03/14/2023\n");

        fs.add_file("/sys/devices/system/cpu/cpufreq/boost", "1\n");

        fs
    }

    /// A headless virtual machine: four threads, one virtio disk, no GPU,
    /// battery, backlight or NVMe.
    ///
    /// Counters do not move between reads, so every rate is zero.
    pub fn minimal_server() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/stat", STAT_BEFORE);
        fs.add_file("/proc/net/dev", NET_DEV_BEFORE);
        fs.add_file("/proc/meminfo", MEMINFO);
        fs.add_file("/proc/net/tcp", TCP);
        fs.add_file("/proc/net/udp", UDP);
        fs.add_file("/proc/cpuinfo", cpuinfo(4));
        fs.add_file(
            "/proc/partitions",
            "\
major minor  #blocks  name

 252        0   41943040 vda
 252        1   41942016 vda1
",
        );
        fs.add_file(
            "/proc/mounts",
            "\
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/vda1 / ext4 rw,relatime 0 0
",
        );

        fs.add_file("/sys/class/hwmon/hwmon0/name", "k10temp\n");
        fs.add_file("/sys/class/hwmon/hwmon0/temp1_input", "45250\n");

        fs.add_file("/sys/class/block/vda/size", "83886080\n");
        fs.add_dir("/sys/class/block/vda/device");
        fs.add_file("/sys/class/block/vda1/partition", "1\n");
        fs.add_file("/sys/class/block/vda1/size", "83884032\n");
        fs.add_file("/sys/class/block/vda1/start", "2048\n");
        fs.add_file("/sys/class/block/loop0/size", "0\n");

        let cpu = "/sys/devices/system/cpu";
        for id in 0..4 {
            fs.add_file(format!("{cpu}/cpu{id}/topology/core_id"), format!("{}\n", id % 2));
            fs.add_file(format!("{cpu}/cpu{id}/topology/die_id"), "0\n");
        }
        fs.add_dir(format!("{cpu}/cpuidle"));
        for policy in 0..2 {
            let dir = format!("{cpu}/cpufreq/policy{policy}");
            fs.add_file(format!("{dir}/scaling_governor"), "schedutil\n");
            fs.add_file(format!("{dir}/scaling_driver"), "acpi-cpufreq\n");
            fs.add_file(
                format!("{dir}/scaling_available_governors"),
                "performance schedutil\n",
            );
            fs.add_file(format!("{dir}/scaling_min_freq"), "400000\n");
            fs.add_file(format!("{dir}/scaling_max_freq"), "4200000\n");
            fs.add_file(format!("{dir}/cpuinfo_max_freq"), "4200000\n");
        }

        let clocksource = "/sys/devices/system/clocksource/clocksource0";
        fs.add_file(format!("{clocksource}/current_clocksource"), "tsc\n");
        fs.add_file(
            format!("{clocksource}/available_clocksource"),
            "tsc hpet acpi_pm \n",
        );

        fs
    }
}

fn cpuinfo(threads: u32) -> String {
    (0..threads)
        .map(|id| {
            format!(
                "processor\t: {id}\n\
                 vendor_id\t: AuthenticAMD\n\
                 model name\t: AMD Ryzen 5 5600X 6-Core Processor\n\
                 cpu MHz\t\t: {}.000\n\
                 core id\t\t: {}\n\n",
                2000 + id * 500,
                id % 2,
            )
        })
        .collect()
}

/// Little-endian `gpu_metrics` block, content revision 1.
fn gpu_metrics_block() -> Vec<u8> {
    let mut buf = vec![0u8; 4 + 120];
    let len = buf.len() as u16;
    buf[0..2].copy_from_slice(&len.to_le_bytes());
    buf[2] = 1;
    buf[3] = 1;

    let mut put = |offset: usize, bytes: &[u8]| {
        buf[4 + offset..4 + offset + bytes.len()].copy_from_slice(bytes);
    };
    put(0, &5200u16.to_le_bytes()); // edge
    put(2, &6100u16.to_le_bytes()); // hotspot
    put(18, &45u16.to_le_bytes()); // socket power
    put(36, &1850u16.to_le_bytes()); // average gfxclk
    put(50, &2100u16.to_le_bytes()); // current gfxclk
    put(64, &0u32.to_le_bytes()); // throttle status
    put(68, &1200u16.to_le_bytes()); // fan
    put(70, &16u16.to_le_bytes()); // link width
    put(72, &4u16.to_le_bytes()); // link speed
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_desktop_stat_changes() {
        let fs = MockFs::typical_desktop();
        let first = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        let second = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        assert_ne!(first, second);
        assert!(fs.exists(Path::new("/sys/class/power_supply/BAT0/capacity")));
    }

    #[test]
    fn test_minimal_server_has_no_power_supply() {
        let fs = MockFs::minimal_server();
        assert!(!fs.exists(Path::new("/sys/class/power_supply")));
        assert!(!fs.exists(Path::new("/sys/class/drm")));
        assert!(fs.exists(Path::new("/proc/meminfo")));
    }

    #[test]
    fn test_cpuinfo_records() {
        let content = cpuinfo(2);
        assert_eq!(content.matches("processor\t:").count(), 2);
        assert!(content.contains("cpu MHz\t\t: 2500.000"));
    }
}
