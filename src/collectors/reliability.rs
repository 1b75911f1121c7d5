// Reliability history: application and OS failure records

use super::{ReliabilitySource, json_rows, lookback_cutoff, str_field, u64_field};
use crate::error::CollectionError;
use crate::models::ReliabilityRecord;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::info;

/// Reliability history of the local machine.
#[derive(Debug, Default)]
pub struct HostReliability;

impl ReliabilitySource for HostReliability {
    fn reliability_records(&self, days_back: u32) -> Result<Vec<ReliabilityRecord>, CollectionError> {
        let cutoff = lookback_cutoff(Utc::now(), days_back, "reliability history")?;
        let mut records = read_host_records(cutoff)?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        info!(count = records.len(), days_back, "reliability history read");
        Ok(records)
    }
}

#[cfg(windows)]
fn read_host_records(cutoff: DateTime<Utc>) -> Result<Vec<ReliabilityRecord>, CollectionError> {
    let text = super::run_powershell(
        "Get-CimInstance Win32_ReliabilityRecords | \
         Select-Object TimeGenerated, ProductName, SourceName, Message, RecordType | ConvertTo-Json -Depth 2",
    )
    .map_err(|e| match e {
        CollectionError::AccessDenied { .. } => CollectionError::access_denied("Win32_ReliabilityRecords"),
        other => other,
    })?;
    parse_reliability_rows(&text, cutoff)
}

#[cfg(not(windows))]
fn read_host_records(cutoff: DateTime<Utc>) -> Result<Vec<ReliabilityRecord>, CollectionError> {
    let since = cutoff
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let output = super::capture(
        "coredumpctl",
        &["--json=short", "--no-pager", "--since", &since, "list"],
    )?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        // exits non-zero when nothing matched
        if stderr.contains("No coredumps found") {
            return Ok(Vec::new());
        }
        if super::mentions_access_denied(&stderr) {
            return Err(CollectionError::access_denied("coredump storage"));
        }
        return Err(CollectionError::collection_failed(
            "coredumpctl",
            stderr.trim().to_string(),
        ));
    }
    parse_coredump_list(&stdout, cutoff)
}

/// Parses `Win32_ReliabilityRecords | ConvertTo-Json` rows newer than `cutoff`.
pub fn parse_reliability_rows(
    text: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ReliabilityRecord>, CollectionError> {
    let rows = json_rows(text, "Win32_ReliabilityRecords")?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let timestamp = row.get("TimeGenerated").and_then(parse_reliability_time)?;
            (timestamp >= cutoff).then(|| ReliabilityRecord {
                timestamp,
                source_name: str_field(row, "ProductName")
                    .or_else(|| str_field(row, "SourceName"))
                    .unwrap_or_default(),
                message: str_field(row, "Message").unwrap_or_default(),
                record_type: u64_field(row, "RecordType")
                    .and_then(|t| i32::try_from(t).ok()),
            })
        })
        .collect())
}

// Either a PowerShell DateTime or a raw WMI datetime ("yyyyMMddHHmmss.ffffff+UUU")
fn parse_reliability_time(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(dt) = super::events::parse_windows_time(value) {
        return Some(dt);
    }
    let text = value.as_str()?;
    let split = text.len().checked_sub(4)?;
    let (stamp, offset) = (text.get(..split)?, text.get(split..)?);
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S%.f").ok()?;
    let offset_minutes: i64 = offset.parse().ok()?;
    Some(naive.and_utc() - Duration::minutes(offset_minutes))
}

/// Parses `coredumpctl --json=short list`. Every core dump is an
/// application failure record.
pub fn parse_coredump_list(
    text: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<ReliabilityRecord>, CollectionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let dumps: Vec<Value> = serde_json::from_str(trimmed)
        .map_err(|e| CollectionError::invalid_data("coredumpctl", e.to_string()))?;

    Ok(dumps
        .iter()
        .filter_map(|dump| {
            let micros = i64::try_from(u64_field(dump, "time")?).ok()?;
            let timestamp = Utc.timestamp_micros(micros).single()?;
            if timestamp < cutoff {
                return None;
            }
            let exe = str_field(dump, "exe").unwrap_or_else(|| "unknown".to_string());
            let program = exe.rsplit('/').next().unwrap_or(&exe).to_string();
            let pid = u64_field(dump, "pid").unwrap_or_default();
            let signal = u64_field(dump, "sig").unwrap_or_default();
            Some(ReliabilityRecord {
                timestamp,
                message: format!("{exe} (pid {pid}) dumped core on signal {signal}"),
                source_name: program,
                record_type: Some(1),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReliabilityCategory;

    fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(0, 0).unwrap()
    }

    #[test]
    fn oversized_lookback_is_rejected_before_querying() {
        let err = HostReliability.reliability_records(u32::MAX).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidData { ref data_source, .. } if data_source == "reliability history"));
    }

    #[test]
    fn windows_rows_keep_codes_and_respect_cutoff() {
        let json = r#"[
            {"TimeGenerated": "/Date(1700000000000)/", "ProductName": "explorer.exe", "Message": "Stopped working", "RecordType": 1},
            {"TimeGenerated": "/Date(1600000000000)/", "ProductName": "old.exe", "Message": "too old", "RecordType": 1},
            {"TimeGenerated": "20231114221320.000000-000", "SourceName": "Windows", "Message": "Shut down unexpectedly", "RecordType": 2}
        ]"#;
        let cutoff = Utc.timestamp_opt(1_650_000_000, 0).unwrap();
        let records = parse_reliability_rows(json, cutoff).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_name, "explorer.exe");
        assert_eq!(records[0].category(), ReliabilityCategory::ApplicationFailure);
        assert_eq!(records[1].source_name, "Windows");
        assert_eq!(records[1].record_type, Some(2));
        assert_eq!(records[1].timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn wmi_offset_is_applied() {
        let value = Value::String("20240101120000.000000+060".into());
        let dt = parse_reliability_time(&value).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T11:00:00+00:00");
    }

    #[test]
    fn coredumps_become_application_failures() {
        let json = r#"[
            {"time": 1700000000000000, "pid": 4242, "uid": 1000, "gid": 1000, "sig": 11,
             "corefile": "present", "exe": "/usr/bin/firefox", "size": 1048576},
            {"time": 1700000100000000, "pid": 7, "sig": 6}
        ]"#;
        let records = parse_coredump_list(json, epoch()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_name, "firefox");
        assert_eq!(records[0].message, "/usr/bin/firefox (pid 4242) dumped core on signal 11");
        assert!(records.iter().all(|r| r.record_type == Some(1)));
        assert_eq!(records[1].source_name, "unknown");
    }

    #[test]
    fn coredump_garbage_is_invalid_data() {
        assert!(parse_coredump_list("", epoch()).unwrap().is_empty());
        let err = parse_coredump_list("TIME PID UID", epoch()).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidData { .. }));
    }
}
