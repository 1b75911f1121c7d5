// Static hardware inventory

use super::{HardwareSource, smart};
use crate::error::CollectionError;
use crate::models::{
    DiskVolume, GpuDevice, HardwareSnapshot, NetworkAdapter, UsbController, UsbDevice,
};
use std::fs;
use std::path::Path;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, info};

/// Hardware inventory of the local machine.
#[derive(Debug, Default)]
pub struct HostHardware;

impl HardwareSource for HostHardware {
    fn hardware_snapshot(&self) -> Result<HardwareSnapshot, CollectionError> {
        let sys = System::new_all();

        let cpu_brand = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .unwrap_or_default();
        let cpu_cores = sys.cpus().len() as u32;
        let total_memory = sys.total_memory();
        if cpu_cores == 0 && total_memory == 0 {
            return Err(CollectionError::invalid_data(
                "sysinfo",
                "no CPU or memory information reported",
            ));
        }

        let (usb_devices, usb_controllers) = usb_inventory();
        let snapshot = HardwareSnapshot {
            computer_name: System::host_name().unwrap_or_default(),
            os_version: System::long_os_version()
                .or_else(System::os_version)
                .unwrap_or_default(),
            cpu_brand,
            cpu_cores,
            total_memory,
            uptime_seconds: Some(System::uptime()).filter(|secs| *secs > 0),
            disks: volumes(),
            network_adapters: network_adapters(),
            usb_devices,
            usb_controllers,
            gpus: gpus(),
            disk_smart: smart::probe_all(),
        };

        info!(
            cpus = snapshot.cpu_cores,
            memory_mb = snapshot.total_memory_mb(),
            disks = snapshot.disks.len(),
            smart = snapshot.disk_smart.len(),
            "hardware inventory collected"
        );
        Ok(snapshot)
    }
}

fn volumes() -> Vec<DiskVolume> {
    Disks::new_with_refreshed_list()
        .iter()
        .map(|disk| DiskVolume {
            name: disk.mount_point().to_string_lossy().into_owned(),
            file_system: disk.file_system().to_string_lossy().into_owned(),
            total_space: disk.total_space(),
            available_space: disk.available_space(),
        })
        .collect()
}

fn network_adapters() -> Vec<NetworkAdapter> {
    let networks = Networks::new_with_refreshed_list();
    let mut adapters: Vec<NetworkAdapter> = networks
        .iter()
        .filter(|(name, _)| name.as_str() != "lo")
        .map(|(name, data)| NetworkAdapter {
            name: name.clone(),
            mac_address: data.mac_address().to_string(),
            ip_addresses: data
                .ip_networks()
                .iter()
                .map(|net| net.addr.to_string())
                .collect(),
        })
        .collect();
    adapters.sort_by(|a, b| a.name.cmp(&b.name));
    adapters
}

#[cfg(windows)]
fn usb_inventory() -> (Vec<UsbDevice>, Vec<UsbController>) {
    use super::{json_rows, run_powershell, str_field};

    let devices = run_powershell(
        "Get-CimInstance Win32_PnPEntity | Where-Object { $_.PNPDeviceID -like 'USB*' } | \
         Select-Object DeviceID, Name, Description, Manufacturer, PNPDeviceID, Status | ConvertTo-Json",
    )
    .and_then(|text| json_rows(&text, "Win32_PnPEntity"))
    .map(|rows| {
        rows.iter()
            .map(|row| UsbDevice {
                device_id: str_field(row, "DeviceID").unwrap_or_default(),
                name: str_field(row, "Name"),
                description: str_field(row, "Description"),
                manufacturer: str_field(row, "Manufacturer"),
                pnp_device_id: str_field(row, "PNPDeviceID"),
                status: str_field(row, "Status"),
            })
            .collect()
    })
    .unwrap_or_else(|e| {
        debug!(error = %e, "USB device query failed");
        Vec::new()
    });

    let controllers = run_powershell(
        "Get-CimInstance Win32_USBController | \
         Select-Object DeviceID, Name, Description, Manufacturer, Caption | ConvertTo-Json",
    )
    .and_then(|text| json_rows(&text, "Win32_USBController"))
    .map(|rows| {
        rows.iter()
            .map(|row| {
                let name = str_field(row, "Name");
                UsbController {
                    device_id: str_field(row, "DeviceID").unwrap_or_default(),
                    protocol_version: name.as_deref().and_then(usb_protocol_from_name),
                    name,
                    description: str_field(row, "Description"),
                    manufacturer: str_field(row, "Manufacturer"),
                    caption: str_field(row, "Caption"),
                }
            })
            .collect()
    })
    .unwrap_or_else(|e| {
        debug!(error = %e, "USB controller query failed");
        Vec::new()
    });

    (devices, controllers)
}

#[cfg(windows)]
fn usb_protocol_from_name(name: &str) -> Option<String> {
    let lower = name.to_lowercase();
    if lower.contains("xhci") || lower.contains("3.0") || lower.contains("3.1") {
        Some("USB 3.x".to_string())
    } else if lower.contains("ehci") || lower.contains("2.0") {
        Some("USB 2.0".to_string())
    } else {
        None
    }
}

#[cfg(not(windows))]
fn usb_inventory() -> (Vec<UsbDevice>, Vec<UsbController>) {
    scan_usb_sysfs(Path::new("/sys/bus/usb/devices"))
}

/// Reads USB devices and root hubs from a sysfs tree such as `/sys/bus/usb/devices`.
///
/// Root hubs (`usbN`) become controllers; other device nodes become devices.
/// Interface nodes (`1-0:1.0`) are skipped.
pub fn scan_usb_sysfs(root: &Path) -> (Vec<UsbDevice>, Vec<UsbController>) {
    let mut devices = Vec::new();
    let mut controllers = Vec::new();

    let Ok(entries) = fs::read_dir(root) else {
        debug!(path = %root.display(), "USB sysfs tree unavailable");
        return (devices, controllers);
    };

    for entry in entries.flatten() {
        let node = entry.file_name().to_string_lossy().into_owned();
        if node.contains(':') {
            continue;
        }
        let dir = entry.path();
        let attr = |name: &str| {
            fs::read_to_string(dir.join(name))
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let (Some(vendor), Some(product_id)) = (attr("idVendor"), attr("idProduct")) else {
            continue;
        };
        let device_id = format!("USB\\VID_{}&PID_{}\\{}", vendor.to_uppercase(), product_id.to_uppercase(), node);

        if node.starts_with("usb") {
            controllers.push(UsbController {
                device_id,
                name: attr("product"),
                description: attr("product"),
                manufacturer: attr("manufacturer"),
                caption: Some(node.clone()),
                protocol_version: attr("version").map(|v| format!("USB {v}")),
            });
        } else {
            devices.push(UsbDevice {
                device_id,
                name: attr("product"),
                description: attr("product"),
                manufacturer: attr("manufacturer"),
                pnp_device_id: Some(format!("{vendor}:{product_id}")),
                status: Some("OK".to_string()),
            });
        }
    }

    devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
    controllers.sort_by(|a, b| a.device_id.cmp(&b.device_id));
    (devices, controllers)
}

#[cfg(windows)]
fn gpus() -> Vec<GpuDevice> {
    use super::{json_rows, run_powershell, str_field, u64_field};

    let rows = run_powershell(
        "Get-CimInstance Win32_VideoController | Select-Object Name, DriverVersion, AdapterRAM | ConvertTo-Json",
    )
    .and_then(|text| json_rows(&text, "Win32_VideoController"));
    match rows {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                Some(GpuDevice {
                    name: str_field(row, "Name")?,
                    driver_version: str_field(row, "DriverVersion"),
                    video_memory: u64_field(row, "AdapterRAM").filter(|ram| *ram > 0),
                    ..Default::default()
                })
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, "GPU query failed");
            Vec::new()
        }
    }
}

#[cfg(not(windows))]
fn gpus() -> Vec<GpuDevice> {
    let query = format!("--query-gpu={NVIDIA_GPU_FIELDS}");
    match super::run_command("nvidia-smi", &[&query, "--format=csv,noheader,nounits"]) {
        Ok(text) => parse_nvidia_gpus(&text),
        Err(e) => {
            debug!(error = %e, "nvidia-smi unavailable, no GPU inventory");
            Vec::new()
        }
    }
}

/// Column order expected by [`parse_nvidia_gpus`].
pub const NVIDIA_GPU_FIELDS: &str = "name,driver_version,memory.total,temperature.gpu,\
utilization.gpu,memory.used,clocks.gr,clocks.mem,fan.speed,power.draw";

/// Parses `nvidia-smi --query-gpu` CSV rows in [`NVIDIA_GPU_FIELDS`] order.
/// Memory is reported in MiB; `video_memory` stores it in bytes. Columns
/// beyond the third are optional and `[N/A]` reads as absent.
pub fn parse_nvidia_gpus(text: &str) -> Vec<GpuDevice> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split(',').map(str::trim);
            let name = fields.next().filter(|n| !n.is_empty())?;
            let driver = fields.next().filter(|d| !d.is_empty() && *d != "[N/A]");
            let total_mib = fields.next().and_then(|m| m.parse::<u64>().ok());
            let mut reading = || fields.next().and_then(|v| v.parse::<f32>().ok());
            let temperature = reading();
            let load = reading();
            let memory_used = reading();
            let core_clock = reading();
            let memory_clock = reading();
            let fan_speed = reading();
            let power = reading();
            Some(GpuDevice {
                name: name.to_string(),
                driver_version: driver.map(str::to_string),
                video_memory: total_mib.map(|mib| mib * 1024 * 1024),
                temperature,
                load,
                memory_used,
                memory_total: total_mib.map(|mib| mib as f32),
                core_clock,
                memory_clock,
                fan_speed,
                power,
            })
        })
        .collect()
}
