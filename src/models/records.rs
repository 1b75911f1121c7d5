// Event log and reliability history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single error or warning entry from the OS event log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventRecord {
    /// When the entry was written
    pub time_generated: DateTime<Utc>,
    /// Log the entry came from ("System" or "Application")
    pub log_file: String,
    /// Provider / source name
    pub source_name: String,
    /// Severity text as reported by the log ("Error", "Warning")
    pub event_type: String,
    /// Numeric event identifier
    pub event_id: u32,
    /// Rendered message text
    pub message: String,
}

/// Severity classification of an event entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSeverity {
    Error,
    Warning,
    /// Any other level; counts toward neither errors nor warnings
    Other,
}

impl EventRecord {
    /// Case-insensitive reading of `event_type`.
    pub fn severity(&self) -> EventSeverity {
        if self.event_type.eq_ignore_ascii_case("error") {
            EventSeverity::Error
        } else if self.event_type.eq_ignore_ascii_case("warning") {
            EventSeverity::Warning
        } else {
            EventSeverity::Other
        }
    }
}

/// One entry of the system reliability history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReliabilityRecord {
    pub timestamp: DateTime<Utc>,
    /// Product or source that produced the record
    pub source_name: String,
    pub message: String,
    /// 1 = application failure, 2 = OS failure, 3 = other; null when the
    /// source did not classify the record
    pub record_type: Option<i32>,
}

/// Human-facing category of a reliability record, derived from its code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReliabilityCategory {
    ApplicationFailure,
    SystemFailure,
    Other,
    Unknown,
}

impl ReliabilityCategory {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(1) => ReliabilityCategory::ApplicationFailure,
            Some(2) => ReliabilityCategory::SystemFailure,
            Some(3) => ReliabilityCategory::Other,
            _ => ReliabilityCategory::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReliabilityCategory::ApplicationFailure => "Application failure",
            ReliabilityCategory::SystemFailure => "Windows failure",
            ReliabilityCategory::Other => "Other failure",
            ReliabilityCategory::Unknown => "Unknown",
        }
    }
}

impl ReliabilityRecord {
    pub fn category(&self) -> ReliabilityCategory {
        ReliabilityCategory::from_code(self.record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str) -> EventRecord {
        EventRecord {
            event_type: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn severity_ignores_case() {
        assert_eq!(event("Error").severity(), EventSeverity::Error);
        assert_eq!(event("ERROR").severity(), EventSeverity::Error);
        assert_eq!(event("warning").severity(), EventSeverity::Warning);
        assert_eq!(event("Information").severity(), EventSeverity::Other);
        assert_eq!(event("").severity(), EventSeverity::Other);
    }

    #[test]
    fn category_is_derived_from_code() {
        let mut record = ReliabilityRecord::default();
        assert_eq!(record.category(), ReliabilityCategory::Unknown);

        record.record_type = Some(1);
        assert_eq!(record.category().label(), "Application failure");
        record.record_type = Some(2);
        assert_eq!(record.category(), ReliabilityCategory::SystemFailure);
        record.record_type = Some(3);
        assert_eq!(record.category(), ReliabilityCategory::Other);
        record.record_type = Some(42);
        assert_eq!(record.category(), ReliabilityCategory::Unknown);
    }

    #[test]
    fn null_record_type_is_unknown() {
        let record: ReliabilityRecord = serde_json::from_str(
            r#"{"timestamp": "2024-05-01T12:00:00Z", "sourceName": "app.exe", "recordType": null}"#,
        )
        .unwrap();
        assert_eq!(record.record_type, None);
        assert_eq!(record.category(), ReliabilityCategory::Unknown);
    }
}
