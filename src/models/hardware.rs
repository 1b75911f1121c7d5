// Hardware inventory records captured once per collection run

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Inventory of the host as reported by the hardware adapter.
/// Byte counts are the stored values; GB/MB views are computed on demand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareSnapshot {
    /// Host name of the machine
    pub computer_name: String,
    /// Operating system name and version
    pub os_version: String,
    /// CPU brand string (e.g., "Intel(R) Core(TM) i7-9700K")
    pub cpu_brand: String,
    /// Number of logical processors
    pub cpu_cores: u32,
    /// Installed physical memory in bytes
    pub total_memory: u64,
    /// Seconds since the last boot, when the OS reports it
    pub uptime_seconds: Option<u64>,
    /// Mounted volumes with capacity information
    pub disks: Vec<DiskVolume>,
    /// Network interfaces
    pub network_adapters: Vec<NetworkAdapter>,
    /// Attached USB devices
    pub usb_devices: Vec<UsbDevice>,
    /// USB host controllers / root hubs
    pub usb_controllers: Vec<UsbController>,
    /// Display adapters
    pub gpus: Vec<GpuDevice>,
    /// SMART health data per physical drive
    pub disk_smart: Vec<DiskSmartRecord>,
}

impl HardwareSnapshot {
    /// Total memory in GiB (1024^3 bytes).
    pub fn total_memory_gb(&self) -> f64 {
        self.total_memory as f64 / BYTES_PER_GB
    }

    /// Total memory in whole MiB, rounded down.
    pub fn total_memory_mb(&self) -> u64 {
        (self.total_memory as f64 / BYTES_PER_MB) as u64
    }

    /// Uptime in fractional days.
    pub fn uptime_days(&self) -> Option<f64> {
        self.uptime_seconds.map(|secs| secs as f64 / 86_400.0)
    }
}

/// A mounted volume. `available_space <= total_space` is expected but an
/// adapter may report 0/0 when the query fails.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskVolume {
    /// Volume name or mount point (e.g., C:\ or /home)
    pub name: String,
    /// Filesystem label (e.g., NTFS, ext4)
    pub file_system: String,
    /// Capacity in bytes
    pub total_space: u64,
    /// Free bytes available to the user
    pub available_space: u64,
}

impl DiskVolume {
    /// Percentage of the volume in use, 0 when the capacity is unknown.
    pub fn usage_percent(&self) -> f64 {
        if self.total_space == 0 {
            return 0.0;
        }
        let used = self.total_space.saturating_sub(self.available_space);
        used as f64 / self.total_space as f64 * 100.0
    }

    /// Percentage of the volume still free, 0 when the capacity is unknown.
    pub fn free_percent(&self) -> f64 {
        if self.total_space == 0 {
            return 0.0;
        }
        self.available_space as f64 / self.total_space as f64 * 100.0
    }

    pub fn total_gb(&self) -> f64 {
        self.total_space as f64 / BYTES_PER_GB
    }

    pub fn free_gb(&self) -> f64 {
        self.available_space as f64 / BYTES_PER_GB
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkAdapter {
    pub name: String,
    pub mac_address: String,
    pub ip_addresses: Vec<String>,
}

impl NetworkAdapter {
    /// First address, or an empty string for an unconfigured interface.
    pub fn primary_ip(&self) -> &str {
        self.ip_addresses.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsbDevice {
    pub device_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub pnp_device_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsbController {
    pub device_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub caption: Option<String>,
    pub protocol_version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpuDevice {
    pub name: String,
    pub driver_version: Option<String>,
    /// Dedicated video memory in bytes
    pub video_memory: Option<u64>,
    /// Core temperature in Celsius
    pub temperature: Option<f32>,
    /// Utilization percentage
    pub load: Option<f32>,
    /// MiB
    pub memory_used: Option<f32>,
    /// MiB
    pub memory_total: Option<f32>,
    /// MHz
    pub core_clock: Option<f32>,
    /// MHz
    pub memory_clock: Option<f32>,
    /// Percent of maximum fan speed
    pub fan_speed: Option<f32>,
    /// Board power draw in watts
    pub power: Option<f32>,
}

/// SMART health data for a single physical drive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskSmartRecord {
    /// Device path (e.g., /dev/nvme0n1, /dev/sda)
    pub device_id: String,
    /// Manufacturer model name
    pub model: Option<String>,
    /// Serial number for unique identification
    pub serial_number: Option<String>,
    /// Firmware version string
    pub firmware: Option<String>,
    /// Raw capacity in bytes
    pub capacity: Option<u64>,
    /// Remaining life percentage (0-100, higher is better)
    pub health_percent: Option<u8>,
    /// Current temperature in Celsius
    pub temperature_c: Option<i32>,
    /// Total hours the drive has been powered on
    pub power_on_hours: Option<u64>,
    /// Number of power on/off cycles
    pub power_cycles: Option<u64>,
    /// Count of unsafe shutdowns (power loss)
    pub unsafe_shutdowns: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_percent_is_zero_for_unknown_capacity() {
        let disk = DiskVolume::default();
        assert_eq!(disk.usage_percent(), 0.0);
        assert_eq!(disk.free_percent(), 0.0);
    }

    #[test]
    fn usage_and_free_percent_are_complementary() {
        let disk = DiskVolume {
            name: "C:\\".into(),
            file_system: "NTFS".into(),
            total_space: 1000,
            available_space: 250,
        };
        assert_eq!(disk.usage_percent(), 75.0);
        assert_eq!(disk.free_percent(), 25.0);
    }

    #[test]
    fn memory_views_derive_from_bytes() {
        let hw = HardwareSnapshot {
            total_memory: 8 * 1024 * 1024 * 1024,
            ..Default::default()
        };
        assert_eq!(hw.total_memory_gb(), 8.0);
        assert_eq!(hw.total_memory_mb(), 8192);
    }

    #[test]
    fn uptime_days_follows_seconds() {
        let mut hw = HardwareSnapshot::default();
        assert_eq!(hw.uptime_days(), None);
        hw.uptime_seconds = Some(172_800);
        assert_eq!(hw.uptime_days(), Some(2.0));
    }
}
