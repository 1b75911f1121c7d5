// Host diagnostic collection, health scoring and reporting

// Platform adapters and their contracts
pub mod collectors;
// TOML configuration
pub mod config;
// Error taxonomy
pub mod error;
// Tracing setup
pub mod logging;
// Diagnostic document model
pub mod models;
// Collection orchestrator
pub mod orchestrator;
// JSON interchange and HTML render
pub mod report;
// Health scoring engine
pub mod scoring;

pub use error::{CollectionError, ConfigError, ReportError};
pub use models::{CollectionOutcome, CollectionProgress, DiagnosticDocument, PerformanceAnalysis};
pub use orchestrator::{CancellationToken, DiagnosticCollector, ProgressSink};
