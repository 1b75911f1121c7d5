//! Collection orchestrator.
//!
//! Drives the hardware, reliability and event-log adapters in a fixed order,
//! reports progress before each step, isolates adapter failures into warnings
//! and finally scores the gathered data. Only cancellation aborts a run.

use crate::collectors::{EventLogSource, HardwareSource, ReliabilitySource};
use crate::error::CollectionError;
use crate::models::{
    CollectionOutcome, CollectionProgress, CollectionStep, DiagnosticDocument, PerformanceAnalysis,
};
use crate::scoring;
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lookback for reliability history, independent of the event-log lookback.
pub const RELIABILITY_LOOKBACK_DAYS: u32 = 7;

/// Deadline applied to each adapter step unless configured otherwise.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(120);

// How often the waiting orchestrator re-checks cancellation and deadlines
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Receives progress notifications from a run.
pub trait ProgressSink {
    fn report(&self, progress: CollectionProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(CollectionProgress),
{
    fn report(&self, progress: CollectionProgress) {
        self(progress)
    }
}

/// Cooperative cancellation flag shared between a caller and a run.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs one diagnostic collection over borrowed adapters.
pub struct DiagnosticCollector<'a> {
    hardware: &'a dyn HardwareSource,
    reliability: &'a dyn ReliabilitySource,
    events: &'a dyn EventLogSource,
    step_timeout: Duration,
}

impl<'a> DiagnosticCollector<'a> {
    pub fn new(
        hardware: &'a dyn HardwareSource,
        reliability: &'a dyn ReliabilitySource,
        events: &'a dyn EventLogSource,
    ) -> Self {
        Self {
            hardware,
            reliability,
            events,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Collects, scores and assembles a document.
    ///
    /// Adapter failures, timeouts and panics become warnings with empty
    /// substitutes. The only error returned is [`CollectionError::Cancelled`],
    /// raised when the token is observed cancelled between or during steps.
    pub fn collect(
        &self,
        lookback_days: u32,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CollectionOutcome, CollectionError> {
        let started = Instant::now();
        let mut run = RunState::default();

        let (hardware_source, reliability_source, event_source) =
            (self.hardware, self.reliability, self.events);

        let (hardware, reliability, events) = thread::scope(|scope| {
            begin(CollectionStep::Hardware, lookback_days, progress, cancel)?;
            let hardware = self.await_step(scope, CollectionStep::Hardware, cancel, move || {
                hardware_source.hardware_snapshot()
            })?;
            let hardware = run.settle(CollectionStep::Hardware, hardware);

            begin(CollectionStep::Reliability, lookback_days, progress, cancel)?;
            let reliability =
                self.await_step(scope, CollectionStep::Reliability, cancel, move || {
                    reliability_source.reliability_records(RELIABILITY_LOOKBACK_DAYS)
                })?;
            let reliability = run.settle(CollectionStep::Reliability, reliability);

            begin(CollectionStep::Events, lookback_days, progress, cancel)?;
            let events = self.await_step(scope, CollectionStep::Events, cancel, move || {
                event_source.error_and_warning_events(lookback_days)
            })?;
            let events = run.settle(CollectionStep::Events, events);

            Ok::<_, CollectionError>((hardware, reliability, events))
        })?;

        begin(CollectionStep::Analysis, lookback_days, progress, cancel)?;
        let analysis = panic::catch_unwind(AssertUnwindSafe(|| {
            scoring::analyze(&hardware, &events, &reliability)
        }))
        .map_err(|payload| {
            CollectionError::collection_failed(CollectionStep::Analysis.label(), panic_reason(payload))
        });
        let performance: PerformanceAnalysis = run.settle(CollectionStep::Analysis, analysis);

        let outcome = CollectionOutcome {
            document: DiagnosticDocument {
                hardware,
                reliability,
                events,
                performance,
                collected_at: Utc::now(),
            },
            warnings: run.warnings,
            failed_steps: run.failed,
        };

        if let Some(summary) = outcome.summary() {
            warn!("{summary}");
        }
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "collection finished");
        Ok(outcome)
    }

    // Runs `work` on a scoped worker while this thread watches the token and
    // the deadline. The outer `Err` is cancellation; the inner result is the
    // step's own outcome. A straggling worker is joined when the scope ends.
    fn await_step<'scope, 'env, T, F>(
        &self,
        scope: &'scope thread::Scope<'scope, 'env>,
        step: CollectionStep,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<Result<T, CollectionError>, CollectionError>
    where
        T: Send + 'scope,
        F: FnOnce() -> Result<T, CollectionError> + Send + 'scope,
    {
        let (tx, rx) = mpsc::channel();
        scope.spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
                Err(CollectionError::collection_failed(step.label(), panic_reason(payload)))
            });
            // the receiver is gone when the step already timed out
            let _ = tx.send(result);
        });

        let deadline = Instant::now() + self.step_timeout;
        loop {
            if cancel.is_cancelled() {
                info!(step = step.label(), "collection cancelled mid-step");
                return Err(CollectionError::Cancelled);
            }
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(result) => return Ok(result),
                Err(RecvTimeoutError::Timeout) if Instant::now() >= deadline => {
                    return Ok(Err(CollectionError::timeout(
                        step.label(),
                        self.step_timeout.as_secs(),
                    )));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Ok(Err(CollectionError::collection_failed(
                        step.label(),
                        "worker exited without a result",
                    )));
                }
            }
        }
    }
}

// Checks cancellation, then announces the step.
fn begin(
    step: CollectionStep,
    lookback_days: u32,
    progress: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<(), CollectionError> {
    if cancel.is_cancelled() {
        info!(step = step.label(), "collection cancelled before step");
        return Err(CollectionError::Cancelled);
    }
    let message = match step {
        CollectionStep::Hardware => "Collecting hardware information...".to_string(),
        CollectionStep::Reliability => "Collecting reliability records...".to_string(),
        CollectionStep::Events => {
            format!("Collecting event log entries (last {lookback_days} days)...")
        }
        CollectionStep::Analysis => "Analyzing system health...".to_string(),
    };
    info!(step = step.index(), "{message}");
    progress.report(CollectionProgress {
        step_index: step.index(),
        step_count: CollectionStep::ALL.len(),
        message,
    });
    Ok(())
}

/// Per-run accumulator for warnings and failed steps.
#[derive(Default)]
struct RunState {
    warnings: Vec<String>,
    failed: Vec<CollectionStep>,
}

impl RunState {
    /// Unwraps a step result, recording a warning and substituting the
    /// empty value on failure.
    fn settle<T: Default>(&mut self, step: CollectionStep, result: Result<T, CollectionError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(step = step.label(), error = %err, "collection step failed");
                self.warnings.push(warning_text(step, &err));
                self.failed.push(step);
                T::default()
            }
        }
    }
}

fn warning_text(step: CollectionStep, err: &CollectionError) -> String {
    format!("{} failed: {}", step.label(), err)
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiskVolume, EventRecord, HardwareSnapshot, ReliabilityRecord};
    use std::cell::RefCell;
    use std::sync::Mutex;

    const GB: u64 = 1024 * 1024 * 1024;

    struct FakeHardware(Result<HardwareSnapshot, CollectionError>);

    impl HardwareSource for FakeHardware {
        fn hardware_snapshot(&self) -> Result<HardwareSnapshot, CollectionError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct FakeReliability {
        requested: Mutex<Vec<u32>>,
    }

    impl ReliabilitySource for FakeReliability {
        fn reliability_records(&self, days_back: u32) -> Result<Vec<ReliabilityRecord>, CollectionError> {
            self.requested.lock().unwrap().push(days_back);
            Ok(vec![ReliabilityRecord::default()])
        }
    }

    enum EventBehavior {
        Ok,
        Fail,
        Panic,
        Sleep(Duration),
        CancelThen(CancellationToken),
    }

    struct FakeEvents {
        behavior: EventBehavior,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeEvents {
        fn new(behavior: EventBehavior) -> Self {
            Self {
                behavior,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl EventLogSource for FakeEvents {
        fn error_and_warning_events(&self, days_back: u32) -> Result<Vec<EventRecord>, CollectionError> {
            self.requested.lock().unwrap().push(days_back);
            match &self.behavior {
                EventBehavior::Ok => Ok(vec![EventRecord {
                    event_type: "Warning".into(),
                    ..Default::default()
                }]),
                EventBehavior::Fail => Err(CollectionError::access_denied("System event log")),
                EventBehavior::Panic => panic!("event reader exploded"),
                EventBehavior::Sleep(d) => {
                    thread::sleep(*d);
                    Ok(Vec::new())
                }
                EventBehavior::CancelThen(token) => {
                    token.cancel();
                    thread::sleep(Duration::from_millis(50));
                    Ok(Vec::new())
                }
            }
        }
    }

    fn healthy_hardware() -> FakeHardware {
        FakeHardware(Ok(HardwareSnapshot {
            computer_name: "WORKSTATION".into(),
            cpu_cores: 8,
            total_memory: 16 * GB,
            disks: vec![DiskVolume {
                name: "C:\\".into(),
                file_system: "NTFS".into(),
                total_space: 100 * GB,
                available_space: 60 * GB,
            }],
            ..Default::default()
        }))
    }

    fn quiet() -> impl Fn(CollectionProgress) {
        |_| {}
    }

    #[test]
    fn progress_is_reported_before_each_step_in_order() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Ok);
        let seen = RefCell::new(Vec::new());
        let sink = |p: CollectionProgress| seen.borrow_mut().push(p);

        let outcome = DiagnosticCollector::new(&hw, &rel, &ev)
            .collect(3, &sink, &CancellationToken::new())
            .unwrap();

        let seen = seen.into_inner();
        let indices: Vec<usize> = seen.iter().map(|p| p.step_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert!(seen.iter().all(|p| p.step_count == 4));
        assert!(seen[2].message.contains("last 3 days"));
        assert!(!outcome.has_warnings());
        assert_eq!(outcome.document.hardware.computer_name, "WORKSTATION");
    }

    #[test]
    fn reliability_lookback_is_fixed() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Ok);

        DiagnosticCollector::new(&hw, &rel, &ev)
            .collect(30, &quiet(), &CancellationToken::new())
            .unwrap();

        assert_eq!(*rel.requested.lock().unwrap(), vec![RELIABILITY_LOOKBACK_DAYS]);
        assert_eq!(*ev.requested.lock().unwrap(), vec![30]);
    }

    #[test]
    fn failed_event_step_is_isolated() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Fail);

        let outcome = DiagnosticCollector::new(&hw, &rel, &ev)
            .collect(3, &quiet(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("Event log failed:"));
        assert!(outcome.warnings[0].contains("administrator"));
        assert_eq!(outcome.failed_steps, vec![CollectionStep::Events]);
        assert_eq!(outcome.document.hardware.cpu_cores, 8);
        assert_eq!(outcome.document.reliability.len(), 1);
        assert!(outcome.document.events.is_empty());
        assert!(outcome.document.performance.system_health_score > 0.0);
    }

    #[test]
    fn failed_hardware_step_substitutes_empty_snapshot() {
        let hw = FakeHardware(Err(CollectionError::invalid_data("sysinfo", "no cpu")));
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Ok);

        let outcome = DiagnosticCollector::new(&hw, &rel, &ev)
            .collect(3, &quiet(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.document.hardware, HardwareSnapshot::default());
        assert_eq!(
            outcome.warnings,
            vec!["Hardware inventory failed: invalid data from sysinfo: no cpu".to_string()]
        );
        // scoring still ran on the substitute
        assert_eq!(outcome.document.performance.disk_health_score, 50.0);
    }

    #[test]
    fn panicking_adapter_becomes_a_warning() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Panic);

        let outcome = DiagnosticCollector::new(&hw, &rel, &ev)
            .collect(3, &quiet(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("event reader exploded"));
    }

    #[test]
    fn slow_step_times_out() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Sleep(Duration::from_millis(400)));

        let outcome = DiagnosticCollector::new(&hw, &rel, &ev)
            .with_step_timeout(Duration::from_millis(50))
            .collect(3, &quiet(), &CancellationToken::new())
            .unwrap();

        assert_eq!(outcome.failed_steps, vec![CollectionStep::Events]);
        assert!(outcome.warnings[0].contains("timed out"));
    }

    #[test]
    fn cancelled_token_stops_before_any_progress() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let ev = FakeEvents::new(EventBehavior::Ok);
        let token = CancellationToken::new();
        token.cancel();
        let seen = RefCell::new(Vec::new());
        let sink = |p: CollectionProgress| seen.borrow_mut().push(p);

        let result = DiagnosticCollector::new(&hw, &rel, &ev).collect(3, &sink, &token);

        assert_eq!(result, Err(CollectionError::Cancelled));
        assert!(seen.borrow().is_empty());
        assert!(rel.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn cancellation_during_a_step_aborts_the_run() {
        let hw = healthy_hardware();
        let rel = FakeReliability::default();
        let token = CancellationToken::new();
        let ev = FakeEvents::new(EventBehavior::CancelThen(token.clone()));
        let seen = RefCell::new(Vec::new());
        let sink = |p: CollectionProgress| seen.borrow_mut().push(p);

        let result = DiagnosticCollector::new(&hw, &rel, &ev).collect(3, &sink, &token);

        assert!(result.unwrap_err().is_cancelled());
        let indices: Vec<usize> = seen.borrow().iter().map(|p| p.step_index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
