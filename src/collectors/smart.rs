// SMART probing through smartctl

// Import the collector command helpers
use super::capture;
// Import the SMART record model
use crate::models::DiskSmartRecord;
// Regex for parsing smartctl text output
use regex::Regex;
// Lazily compiled patterns shared across probes
use std::sync::LazyLock;
// Tracing for per-device diagnostics
use tracing::{debug, warn};

// Identity lines; NVMe reports "Model Number", ATA reports "Device Model"
static MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:Model Number|Device Model):\s+(.+)$").unwrap());
static SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Serial Number:\s+(.+)$").unwrap());
static FIRMWARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Firmware Version:\s+(.+)$").unwrap());

// Capacity in bytes, e.g. "User Capacity: 500,107,862,016 bytes [500 GB]"
static CAPACITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:Total NVM Capacity|Namespace 1 Size/Capacity|User Capacity):\s+([\d,.]+)").unwrap()
});

// NVMe health log fields
static PERCENTAGE_USED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Percentage Used:\s+(\d+)%").unwrap());
static NVME_TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Temperature:\s+(\d+)\s+Celsius").unwrap());
static NVME_POWER_CYCLES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Power Cycles:\s+([\d,]+)").unwrap());
static NVME_POWER_ON_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Power On Hours:\s+([\d,]+)").unwrap());
static NVME_UNSAFE_SHUTDOWNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Unsafe Shutdowns:\s+([\d,]+)").unwrap());

// ATA attribute table row: id, name, flag, value, worst, thresh, type, updated, when_failed, raw
static ATTRIBUTE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d+\s+(\S+)\s+0x[0-9a-fA-F]+\s+(\d+)\s+\d+\s+\d+\s+\S+\s+\S+\s+\S+\s+(\d+)")
        .unwrap()
});

/// Probes every device `smartctl --scan` reports.
/// Individual probe failures are logged and skipped; a missing smartctl
/// yields an empty list.
pub fn probe_all() -> Vec<DiskSmartRecord> {
    let scan = match capture("smartctl", &["--scan"]) {
        Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
        Err(e) => {
            debug!(error = %e, "smartctl unavailable, skipping SMART data");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for device in parse_scan_devices(&scan) {
        match capture("smartctl", &["-a", &device]) {
            Ok(output) => {
                // smartctl encodes disk warnings in the exit status bits, so stdout is
                // parsed regardless of status
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if super::mentions_access_denied(&stdout) || super::mentions_access_denied(&stderr) {
                    warn!(device = %device, "{}", permission_hint());
                    continue;
                }
                out.push(parse_smart_report(&device, &stdout));
            }
            Err(e) => warn!(device = %device, error = %e, "SMART probe failed"),
        }
    }

    out.sort_by(|a, b| a.device_id.cmp(&b.device_id));
    out
}

#[cfg(unix)]
fn permission_hint() -> &'static str {
    if nix::unistd::geteuid().is_root() {
        "smartctl was denied access to the device"
    } else {
        "SMART data requires root; rerun with sudo"
    }
}

#[cfg(not(unix))]
fn permission_hint() -> &'static str {
    "SMART data requires administrator privileges"
}

/// Device paths from `smartctl --scan` output.
/// Lines look like `/dev/sda -d sat # /dev/sda [SAT], ATA device`.
pub fn parse_scan_devices(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Builds a SMART record from `smartctl -a` output of either NVMe or ATA devices.
pub fn parse_smart_report(device_id: &str, text: &str) -> DiskSmartRecord {
    let mut record = DiskSmartRecord {
        device_id: device_id.to_string(),
        model: capture_text(&MODEL, text),
        serial_number: capture_text(&SERIAL, text),
        firmware: capture_text(&FIRMWARE, text),
        capacity: capture_number(&CAPACITY, text),
        ..Default::default()
    };

    // NVMe health log
    record.health_percent = capture_number::<u8>(&PERCENTAGE_USED, text)
        .map(|used| 100u8.saturating_sub(used));
    record.temperature_c = capture_number(&NVME_TEMPERATURE, text);
    record.power_cycles = capture_number(&NVME_POWER_CYCLES, text);
    record.power_on_hours = capture_number(&NVME_POWER_ON_HOURS, text);
    record.unsafe_shutdowns = capture_number(&NVME_UNSAFE_SHUTDOWNS, text);

    // ATA attribute table fills whatever the NVMe log did not
    for cap in ATTRIBUTE_ROW.captures_iter(text) {
        let normalized = cap[2].parse::<u64>().ok();
        let raw = cap[3].parse::<u64>().ok();
        match &cap[1] {
            "Temperature_Celsius" | "Airflow_Temperature_Cel" => {
                if record.temperature_c.is_none() {
                    record.temperature_c = raw.and_then(|t| i32::try_from(t).ok());
                }
            }
            "Power_On_Hours" => record.power_on_hours = record.power_on_hours.or(raw),
            "Power_Cycle_Count" => record.power_cycles = record.power_cycles.or(raw),
            "Unexpect_Power_Loss_Ct" | "Unsafe_Shutdown_Count" | "Power-Off_Retract_Count" => {
                record.unsafe_shutdowns = record.unsafe_shutdowns.or(raw)
            }
            "Wear_Leveling_Count" | "Percent_Lifetime_Remain" | "Media_Wearout_Indicator" => {
                if record.health_percent.is_none() {
                    record.health_percent = normalized.map(|v| v.min(100) as u8);
                }
            }
            _ => {}
        }
    }

    record
}

fn capture_text(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn capture_number<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    let cap = re.captures(text)?;
    cap[1].replace([',', '.'], "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NVME_REPORT: &str = "\
=== START OF INFORMATION SECTION ===
Model Number:                       Samsung SSD 980 PRO 1TB
Serial Number:                      S5GXNF0R123456
Firmware Version:                   5B2QGXA7
Total NVM Capacity:                 1,000,204,886,016 [1.00 TB]

=== START OF SMART DATA SECTION ===
SMART/Health Information (NVMe Log 0x02)
Critical Warning:                   0x00
Temperature:                        41 Celsius
Available Spare:                    100%
Percentage Used:                    3%
Data Units Written:                 45,131,112 [23.1 TB]
Power Cycles:                       1,204
Power On Hours:                     6,518
Unsafe Shutdowns:                   87
";

    const ATA_REPORT: &str = "\
=== START OF INFORMATION SECTION ===
Device Model:     WDC WD10EZEX-08WN4A0
Serial Number:    WD-WCC6Y0000000
Firmware Version: 01.01A01
User Capacity:    1,000,204,886,016 bytes [1.00 TB]
Rotation Rate:    7200 rpm

ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  1 Raw_Read_Error_Rate     0x002f   200   200   051    Pre-fail  Always       -       0
  9 Power_On_Hours          0x0032   071   071   000    Old_age   Always       -       21455
 12 Power_Cycle_Count       0x0032   100   100   000    Old_age   Always       -       912
192 Power-Off_Retract_Count 0x0032   200   200   000    Old_age   Always       -       33
194 Temperature_Celsius     0x0022   108   101   000    Old_age   Always       -       35 (Min/Max 21/46)
";

    #[test]
    fn parses_nvme_health_log() {
        let r = parse_smart_report("/dev/nvme0", NVME_REPORT);
        assert_eq!(r.device_id, "/dev/nvme0");
        assert_eq!(r.model.as_deref(), Some("Samsung SSD 980 PRO 1TB"));
        assert_eq!(r.serial_number.as_deref(), Some("S5GXNF0R123456"));
        assert_eq!(r.firmware.as_deref(), Some("5B2QGXA7"));
        assert_eq!(r.capacity, Some(1_000_204_886_016));
        assert_eq!(r.health_percent, Some(97));
        assert_eq!(r.temperature_c, Some(41));
        assert_eq!(r.power_cycles, Some(1204));
        assert_eq!(r.power_on_hours, Some(6518));
        assert_eq!(r.unsafe_shutdowns, Some(87));
    }

    #[test]
    fn parses_ata_attribute_table() {
        let r = parse_smart_report("/dev/sda", ATA_REPORT);
        assert_eq!(r.model.as_deref(), Some("WDC WD10EZEX-08WN4A0"));
        assert_eq!(r.capacity, Some(1_000_204_886_016));
        assert_eq!(r.health_percent, None);
        assert_eq!(r.temperature_c, Some(35));
        assert_eq!(r.power_on_hours, Some(21455));
        assert_eq!(r.power_cycles, Some(912));
        assert_eq!(r.unsafe_shutdowns, Some(33));
    }

    #[test]
    fn empty_report_keeps_only_the_device() {
        let r = parse_smart_report("/dev/sdb", "");
        assert_eq!(
            r,
            DiskSmartRecord {
                device_id: "/dev/sdb".into(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn scan_lists_device_paths() {
        let scan = "/dev/sda -d sat # /dev/sda [SAT], ATA device\n\
                    /dev/nvme0 -d nvme # /dev/nvme0, NVMe device\n\
                    \n\
                    # comment only\n";
        assert_eq!(parse_scan_devices(scan), vec!["/dev/sda", "/dev/nvme0"]);
    }
}
