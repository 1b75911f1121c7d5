// Platform adapters that feed the collection orchestrator

// sysinfo inventory plus USB and GPU enumeration
mod hardware;
// Event log reader (Windows event log or systemd journal)
mod events;
// Reliability history (Windows reliability monitor or coredumps)
mod reliability;
// Live CPU/GPU readings for the desktop view
mod sensors;
// smartctl probing and report parsing
mod smart;

pub use events::{HostEventLog, parse_journal_entries, parse_windows_events};
pub use hardware::{HostHardware, parse_nvidia_gpus, scan_usb_sysfs};
pub use reliability::{HostReliability, parse_coredump_list, parse_reliability_rows};
pub use sensors::{
    SensorMonitor, SensorReading, parse_cpu_temperature, parse_nvidia_sensors, read_sensors,
};
pub use smart::{parse_scan_devices, parse_smart_report, probe_all};

use crate::error::CollectionError;
use crate::models::{EventRecord, HardwareSnapshot, ReliabilityRecord};
use crate::orchestrator::DiagnosticCollector;
use chrono::{DateTime, TimeDelta, TimeZone};
use serde_json::Value;
use std::io::ErrorKind;
use std::process::{Command, Output};
use std::time::Duration;
use tracing::debug;

/// Source of the static hardware inventory.
pub trait HardwareSource: Send + Sync {
    fn hardware_snapshot(&self) -> Result<HardwareSnapshot, CollectionError>;
}

/// Source of reliability history records.
pub trait ReliabilitySource: Send + Sync {
    fn reliability_records(&self, days_back: u32) -> Result<Vec<ReliabilityRecord>, CollectionError>;
}

/// Source of error and warning entries from the OS event log.
pub trait EventLogSource: Send + Sync {
    /// Entries newer than `days_back` days, newest first.
    fn error_and_warning_events(&self, days_back: u32) -> Result<Vec<EventRecord>, CollectionError>;
}

/// The adapters for the host this process runs on.
#[derive(Debug, Default)]
pub struct PlatformCollectors {
    pub hardware: HostHardware,
    pub reliability: HostReliability,
    pub events: HostEventLog,
}

impl PlatformCollectors {
    /// Orchestrator over these adapters with the given per-step deadline.
    pub fn collector(&self, step_timeout: Duration) -> DiagnosticCollector<'_> {
        DiagnosticCollector::new(&self.hardware, &self.reliability, &self.events)
            .with_step_timeout(step_timeout)
    }
}

/// `now` moved back by `days_back` days. A lookback that leaves chrono's
/// representable range is reported as invalid input.
pub(crate) fn lookback_cutoff<Tz: TimeZone>(
    now: DateTime<Tz>,
    days_back: u32,
    data_source: &str,
) -> Result<DateTime<Tz>, CollectionError> {
    TimeDelta::try_days(i64::from(days_back))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            CollectionError::invalid_data(
                data_source,
                format!("lookback of {days_back} days is out of range"),
            )
        })
}

/// Spawns `program` and captures its output without judging the exit status.
pub(crate) fn capture(program: &str, args: &[&str]) -> Result<Output, CollectionError> {
    debug!(program, ?args, "spawning command");
    Command::new(program).args(args).output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            CollectionError::collection_failed(program, format!("{program} is not installed or not on PATH"))
        }
        ErrorKind::PermissionDenied => CollectionError::access_denied(program),
        _ => CollectionError::collection_failed(program, format!("failed to run {program}: {e}")),
    })
}

/// Runs `program` and returns its stdout, treating a non-zero exit as failure.
pub(crate) fn run_command(program: &str, args: &[&str]) -> Result<String, CollectionError> {
    let output = capture(program, args)?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if mentions_access_denied(&stderr) {
        return Err(CollectionError::access_denied(program));
    }
    let detail = stderr.trim();
    Err(CollectionError::collection_failed(
        program,
        if detail.is_empty() {
            format!("{program} exited with {}", output.status)
        } else {
            format!("{program}: {detail}")
        },
    ))
}

/// Runs a PowerShell pipeline with a non-interactive profile-less shell.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn run_powershell(script: &str) -> Result<String, CollectionError> {
    run_command(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
    )
}

pub(crate) fn mentions_access_denied(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("access denied")
        || lower.contains("access is denied")
        || lower.contains("permission denied")
        || lower.contains("unauthorizedaccess")
}

/// Rows of a `ConvertTo-Json` payload.
///
/// PowerShell emits nothing for an empty pipeline, a bare object for a
/// single result and an array otherwise.
pub fn json_rows(text: &str, data_source: &str) -> Result<Vec<Value>, CollectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| CollectionError::invalid_data(data_source, e.to_string()))?;
    Ok(match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

/// String field of a JSON row; blank strings count as missing.
pub(crate) fn str_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Unsigned field that may arrive as a number or a numeric string.
pub(crate) fn u64_field(row: &Value, key: &str) -> Option<u64> {
    match row.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
