// Error and warning entries from the OS event log

use super::{EventLogSource, json_rows, lookback_cutoff, str_field, u64_field};
use crate::error::CollectionError;
use crate::models::EventRecord;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

// Windows PowerShell 5 serializes DateTime as "/Date(1700000000000)/"
static MS_AJAX_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/Date\((-?\d+)(?:[+-]\d{4})?\)/$").unwrap());

/// Event log of the local machine.
#[derive(Debug, Default)]
pub struct HostEventLog;

impl EventLogSource for HostEventLog {
    fn error_and_warning_events(&self, days_back: u32) -> Result<Vec<EventRecord>, CollectionError> {
        let since = lookback_cutoff(Utc::now(), days_back, "event log")?;
        let mut events = read_host_events(since)?;
        events.sort_by(|a, b| b.time_generated.cmp(&a.time_generated));
        info!(count = events.len(), days_back, "event log read");
        Ok(events)
    }
}

#[cfg(windows)]
fn read_host_events(since: DateTime<Utc>) -> Result<Vec<EventRecord>, CollectionError> {
    let script = format!(
        "Get-WinEvent -FilterHashtable @{{LogName='System','Application'; Level=2,3; \
         StartTime=[DateTime]::Parse('{}').ToLocalTime()}} -ErrorAction SilentlyContinue | \
         Select-Object TimeCreated, LogName, ProviderName, Level, LevelDisplayName, Id, Message | \
         ConvertTo-Json -Depth 2",
        since.to_rfc3339()
    );
    let text = super::run_powershell(&script).map_err(|e| match e {
        CollectionError::AccessDenied { .. } => CollectionError::access_denied("Windows event log"),
        other => other,
    })?;
    parse_windows_events(&text)
}

#[cfg(not(windows))]
fn read_host_events(since: DateTime<Utc>) -> Result<Vec<EventRecord>, CollectionError> {
    let since = since
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let text = super::run_command(
        "journalctl",
        &["--priority=warning", "--since", &since, "--output=json", "--no-pager"],
    )
    .map_err(|e| match e {
        CollectionError::AccessDenied { .. } => CollectionError::access_denied("systemd journal"),
        other => other,
    })?;
    parse_journal_entries(&text)
}

/// Parses `Get-WinEvent | ConvertTo-Json` output.
pub fn parse_windows_events(text: &str) -> Result<Vec<EventRecord>, CollectionError> {
    let rows = json_rows(text, "Get-WinEvent")?;
    let mut events = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(time_generated) = row.get("TimeCreated").and_then(parse_windows_time) else {
            debug!("skipping event without a readable TimeCreated");
            continue;
        };
        let event_type = match u64_field(row, "Level") {
            Some(1 | 2) => "Error".to_string(),
            Some(3) => "Warning".to_string(),
            _ => str_field(row, "LevelDisplayName").unwrap_or_default(),
        };
        events.push(EventRecord {
            time_generated,
            log_file: str_field(row, "LogName").unwrap_or_default(),
            source_name: str_field(row, "ProviderName").unwrap_or_default(),
            event_type,
            event_id: u64_field(row, "Id")
                .and_then(|id| u32::try_from(id).ok())
                .unwrap_or_default(),
            message: str_field(row, "Message").unwrap_or_default(),
        });
    }
    Ok(events)
}

/// Reads a PowerShell timestamp in either the `/Date(ms)/` or the ISO 8601 form.
pub(crate) fn parse_windows_time(value: &Value) -> Option<DateTime<Utc>> {
    // PowerShell 7 wraps DateTime as {"value": ..., "DateTime": ...} with -Depth > 1
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("value").and_then(Value::as_str)?,
        _ => return None,
    };

    if let Some(cap) = MS_AJAX_DATE.captures(text) {
        let millis: i64 = cap[1].parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses `journalctl --output=json`, one JSON object per line.
/// Lines that are not valid journal entries are skipped.
pub fn parse_journal_entries(text: &str) -> Result<Vec<EventRecord>, CollectionError> {
    let mut events = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "skipping malformed journal line");
                continue;
            }
        };

        let Some(time_generated) = u64_field(&entry, "__REALTIME_TIMESTAMP")
            .and_then(|micros| i64::try_from(micros).ok())
            .and_then(|micros| Utc.timestamp_micros(micros).single())
        else {
            continue;
        };
        let event_type = match u64_field(&entry, "PRIORITY") {
            Some(0..=3) => "Error",
            Some(4) => "Warning",
            _ => continue,
        };
        let log_file = if entry.get("_TRANSPORT").and_then(Value::as_str) == Some("kernel") {
            "System"
        } else {
            "Application"
        };
        let source_name = str_field(&entry, "SYSLOG_IDENTIFIER")
            .or_else(|| str_field(&entry, "_COMM"))
            .or_else(|| str_field(&entry, "_SYSTEMD_UNIT"))
            .unwrap_or_else(|| "unknown".to_string());

        events.push(EventRecord {
            time_generated,
            log_file: log_file.to_string(),
            source_name,
            event_type: event_type.to_string(),
            event_id: 0,
            message: journal_message(&entry),
        });
    }
    Ok(events)
}

// MESSAGE is a string, or a byte array when it is not valid UTF-8
fn journal_message(entry: &Value) -> String {
    match entry.get("MESSAGE") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(bytes)) => {
            let raw: Vec<u8> = bytes
                .iter()
                .filter_map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            String::from_utf8_lossy(&raw).into_owned()
        }
        _ => String::new(),
    }
}
