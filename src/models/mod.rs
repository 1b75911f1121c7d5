// Data models for the diagnostic document and collection results

mod analysis;
mod hardware;
mod records;

pub use analysis::{HealthTier, PerformanceAnalysis};
pub use hardware::{
    DiskSmartRecord, DiskVolume, GpuDevice, HardwareSnapshot, NetworkAdapter, UsbController,
    UsbDevice,
};
pub use records::{
    EventRecord, EventSeverity, ReliabilityCategory, ReliabilityRecord,
};

use crate::error::CollectionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything gathered in one collection run plus the derived analysis.
/// This is the unit of export and import. Missing data is represented by
/// empty collections and zero scores, never by absent fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticDocument {
    pub hardware: HardwareSnapshot,
    pub reliability: Vec<ReliabilityRecord>,
    pub events: Vec<EventRecord>,
    pub performance: PerformanceAnalysis,
    /// UTC time the run finished gathering data
    pub collected_at: DateTime<Utc>,
}

/// The four fixed steps of a collection run, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionStep {
    Hardware,
    Reliability,
    Events,
    Analysis,
}

impl CollectionStep {
    pub const ALL: [CollectionStep; 4] = [
        CollectionStep::Hardware,
        CollectionStep::Reliability,
        CollectionStep::Events,
        CollectionStep::Analysis,
    ];

    /// 1-based position used in progress reports.
    pub fn index(self) -> usize {
        match self {
            CollectionStep::Hardware => 1,
            CollectionStep::Reliability => 2,
            CollectionStep::Events => 3,
            CollectionStep::Analysis => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CollectionStep::Hardware => "Hardware inventory",
            CollectionStep::Reliability => "Reliability records",
            CollectionStep::Events => "Event log",
            CollectionStep::Analysis => "Performance analysis",
        }
    }
}

/// Progress notification emitted before each step starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionProgress {
    pub step_index: usize,
    pub step_count: usize,
    pub message: String,
}

impl CollectionProgress {
    /// Completed fraction *before* this step, for progress bars.
    pub fn fraction(&self) -> f32 {
        if self.step_count == 0 {
            return 0.0;
        }
        (self.step_index.saturating_sub(1)) as f32 / self.step_count as f32
    }
}

/// Result of a run: the document plus a warning per degraded step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionOutcome {
    pub document: DiagnosticDocument,
    /// "<step> failed: <reason>" lines in step order
    pub warnings: Vec<String>,
    /// Steps that were substituted with empty values
    pub failed_steps: Vec<CollectionStep>,
}

impl CollectionOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// `PartialCollection` summary when at least one step degraded.
    pub fn summary(&self) -> Option<CollectionError> {
        if self.failed_steps.is_empty() {
            return None;
        }
        let (failed, succeeded): (Vec<&CollectionStep>, Vec<&CollectionStep>) =
            CollectionStep::ALL.iter().partition(|step| self.failed_steps.contains(*step));
        Some(CollectionError::PartialCollection {
            succeeded: succeeded.iter().map(|s| s.label().to_string()).collect(),
            failed: failed.iter().map(|s| s.label().to_string()).collect(),
        })
    }
}
