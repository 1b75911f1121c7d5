// Main application state and UI rendering for the system health view

// Import UI building blocks
use crate::gui::{free_space_color, section, stat_card, tier_color};
// Import egui for UI rendering
use eframe::egui;
// Library types for collection, reporting and sensors
use sys_health::collectors::{PlatformCollectors, SensorMonitor, SensorReading};
use sys_health::config::Config;
use sys_health::models::{CollectionOutcome, CollectionProgress, DiagnosticDocument};
use sys_health::report::{self, MESSAGE_CHAR_LIMIT, truncate_chars};
use sys_health::{CancellationToken, CollectionError};
// Channel between the collection worker and the UI thread
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
// Duration and Instant for time-based operations
use std::time::{Duration, Instant};
use tracing::{error, info};

/// File name used for exports and imports inside `output_dir`.
const EXPORT_STEM: &str = "diagnostic";

/// Messages from the collection worker.
enum WorkerMessage {
    Progress(CollectionProgress),
    Finished(Result<CollectionOutcome, CollectionError>),
}

/// A collection running on a background thread.
struct RunningCollection {
    rx: Receiver<WorkerMessage>,
    cancel: CancellationToken,
    progress: Option<CollectionProgress>,
}

/// Main application state for the eframe app.
pub struct AppState {
    /// Loaded configuration
    config: Config,

    /// In-flight collection, if any
    running: Option<RunningCollection>,

    /// Latest document, collected or imported
    document: Option<DiagnosticDocument>,

    /// Warnings from the latest collection
    warnings: Vec<String>,

    /// Last status line (export paths, cancellation)
    status: Option<String>,

    /// Last error message
    last_error: Option<String>,

    /// Live sensor sampler and its latest reading
    sensors: SensorMonitor,
    reading: SensorReading,

    /// Timestamp of the last sensor refresh
    last_refresh: Instant,

    /// How often to refresh the live sensors
    refresh_interval: Duration,
}

impl AppState {
    /// Creates the application state and samples the sensors once.
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        // Configure light theme for consistent appearance
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let mut sensors = SensorMonitor::new();
        let reading = sensors.read();

        Self {
            config,
            running: None,
            document: None,
            warnings: Vec::new(),
            status: None,
            last_error: None,
            sensors,
            reading,
            last_refresh: Instant::now(),
            // Refresh live sensors every 5 seconds
            refresh_interval: Duration::from_secs(5),
        }
    }

    /// Starts a collection on a worker thread.
    fn start_collection(&mut self, ctx: &egui::Context) {
        if self.running.is_some() {
            return;
        }
        self.last_error = None;
        self.status = None;

        let (tx, rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let ctx = ctx.clone();
        let days = self.config.collection.lookback_days;
        let timeout = self.config.step_timeout();

        let spawned = thread::Builder::new()
            .name("collection".into())
            .spawn(move || {
                let collectors = PlatformCollectors::default();
                let sink = |progress: CollectionProgress| {
                    let _ = tx.send(WorkerMessage::Progress(progress));
                    ctx.request_repaint();
                };
                let result = collectors.collector(timeout).collect(days, &sink, &token);
                let _ = tx.send(WorkerMessage::Finished(result));
                ctx.request_repaint();
            });

        match spawned {
            Ok(_) => {
                self.running = Some(RunningCollection {
                    rx,
                    cancel,
                    progress: None,
                })
            }
            Err(e) => self.last_error = Some(format!("failed to start collection: {e}")),
        }
    }

    /// Drains worker messages into the view state.
    fn poll_worker(&mut self) {
        let Some(run) = self.running.as_mut() else {
            return;
        };

        loop {
            match run.rx.try_recv() {
                Ok(WorkerMessage::Progress(p)) => run.progress = Some(p),
                Ok(WorkerMessage::Finished(result)) => {
                    self.running = None;
                    match result {
                        Ok(outcome) => {
                            info!(warnings = outcome.warnings.len(), "collection finished");
                            self.warnings = outcome.warnings;
                            self.document = Some(outcome.document);
                        }
                        Err(CollectionError::Cancelled) => {
                            self.status = Some("Collection cancelled".to_string());
                        }
                        Err(e) => self.last_error = Some(e.to_string()),
                    }
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.running = None;
                    self.last_error = Some("collection worker stopped unexpectedly".to_string());
                    return;
                }
            }
        }
    }

    fn export(&mut self) {
        let Some(doc) = &self.document else {
            return;
        };
        let dir = &self.config.report.output_dir;
        let json = dir.join(format!("{EXPORT_STEM}.json"));
        let html = dir.join(format!("{EXPORT_STEM}.html"));

        let result = report::export_json(doc, &json).and_then(|()| {
            report::export_html(
                doc,
                self.config.collection.lookback_days,
                self.config.report.max_event_rows,
                &html,
            )
        });
        match result {
            Ok(()) => {
                self.status = Some(format!("Saved {} and {}", json.display(), html.display()))
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn import(&mut self) {
        let path = self.config.report.output_dir.join(format!("{EXPORT_STEM}.json"));
        match report::import_json(&path) {
            Ok(doc) => {
                self.document = Some(doc);
                self.warnings.clear();
                self.status = Some(format!("Loaded {}", path.display()));
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn sidebar(&mut self, ui: &mut egui::Ui) {
        ui.add_space(10.0);
        ui.heading(egui::RichText::new("System health").size(18.0).strong());
        ui.add_space(8.0);
        ui.separator();
        ui.add_space(8.0);

        let running = self.running.is_some();
        if ui.add_enabled(!running, egui::Button::new("Run diagnostics")).clicked() {
            self.start_collection(ui.ctx());
        }

        if let Some(run) = &self.running {
            ui.add_space(6.0);
            let (fraction, text) = match &run.progress {
                Some(p) => (p.fraction(), format!("[{}/{}] {}", p.step_index, p.step_count, p.message)),
                None => (0.0, "Starting...".to_string()),
            };
            ui.add(egui::ProgressBar::new(fraction).animate(true));
            ui.label(egui::RichText::new(text).size(11.0));
            if ui.button("Cancel").clicked() {
                run.cancel.cancel();
            }
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            let has_doc = self.document.is_some();
            if ui.add_enabled(has_doc && !running, egui::Button::new("Export")).clicked() {
                self.export();
            }
            if ui.add_enabled(!running, egui::Button::new("Import")).clicked() {
                self.import();
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.label(egui::RichText::new("Live sensors").size(13.0).strong());
        ui.add_space(4.0);
        let fmt = |v: Option<f32>, unit: &str| v.map(|v| format!("{v:.1}{unit}")).unwrap_or("--".into());
        egui::Grid::new("sensor_grid").spacing([10.0, 4.0]).show(ui, |ui| {
            ui.label("CPU load");
            ui.label(fmt(self.reading.cpu_load_percent, "%"));
            ui.end_row();
            ui.label("CPU temp");
            ui.label(fmt(self.reading.cpu_temperature_c, "°C"));
            ui.end_row();
            ui.label("GPU temp");
            ui.label(fmt(self.reading.gpu_temperature_c, "°C"));
            ui.end_row();
            ui.label("GPU load");
            ui.label(fmt(self.reading.gpu_load_percent, "%"));
            ui.end_row();
        });

        if let Some(status) = &self.status {
            ui.add_space(10.0);
            ui.label(egui::RichText::new(status).size(11.0));
        }
        if let Some(err) = &self.last_error {
            ui.add_space(10.0);
            ui.colored_label(egui::Color32::RED, err);
        }
    }

    fn report_view(&self, ui: &mut egui::Ui, doc: &DiagnosticDocument) {
        let perf = &doc.performance;
        let tier = perf.tier();
        let card_width = 150.0;
        let card_height = 60.0;
        let neutral = egui::Color32::from_rgb(59, 130, 246);

        // Overall health with tier badge
        ui.horizontal(|ui| {
            stat_card(
                ui,
                card_width,
                card_height,
                "System health",
                &format!("{:.0}/100", perf.system_health_score),
                tier_color(tier),
            );
            egui::Frame::none()
                .fill(tier_color(tier))
                .rounding(8.0)
                .inner_margin(egui::vec2(20.0, 10.0))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(tier.label())
                            .color(egui::Color32::WHITE)
                            .size(16.0)
                            .strong(),
                    );
                });
            ui.vertical(|ui| {
                ui.label(egui::RichText::new(&doc.hardware.computer_name).size(16.0).strong());
                ui.label(&doc.hardware.os_version);
                ui.label(format!(
                    "{} ({} cores), {:.1} GB RAM",
                    doc.hardware.cpu_brand,
                    doc.hardware.cpu_cores,
                    doc.hardware.total_memory_gb()
                ));
            });
        });
        ui.add_space(10.0);

        ui.horizontal_wrapped(|ui| {
            stat_card(ui, card_width, card_height, "Stability", &format!("{:.0}", perf.stability_score), neutral);
            stat_card(ui, card_width, card_height, "Performance", &format!("{:.0}", perf.performance_score), neutral);
            stat_card(ui, card_width, card_height, "Memory", &format!("{:.0}", perf.memory_usage_score), neutral);
            stat_card(ui, card_width, card_height, "Disk", &format!("{:.0}", perf.disk_health_score), neutral);
            stat_card(
                ui,
                card_width,
                card_height,
                "Critical issues",
                &perf.critical_issues_count.to_string(),
                egui::Color32::from_rgb(239, 68, 68),
            );
            stat_card(
                ui,
                card_width,
                card_height,
                "Warnings",
                &perf.warnings_count.to_string(),
                egui::Color32::from_rgb(245, 158, 11),
            );
            stat_card(
                ui,
                card_width,
                card_height,
                "Uptime",
                &perf
                    .system_uptime_days
                    .map(|d| format!("{d:.1} days"))
                    .unwrap_or("n/a".into()),
                neutral,
            );
        });
        ui.add_space(12.0);

        if !perf.recommendations.is_empty() {
            section(ui, "Recommendations", |ui| {
                for rec in &perf.recommendations {
                    ui.label(format!("• {rec}"));
                }
            });
            ui.add_space(12.0);
        }

        if !self.warnings.is_empty() {
            section(ui, "Collection warnings", |ui| {
                for warning in &self.warnings {
                    ui.colored_label(egui::Color32::from_rgb(220, 150, 0), warning);
                }
            });
            ui.add_space(12.0);
        }

        if !doc.hardware.disks.is_empty() {
            section(ui, "Disk volumes", |ui| {
                egui::Grid::new("disk_grid").striped(true).spacing([25.0, 8.0]).show(ui, |ui| {
                    for header in ["Volume", "File system", "Total", "Free", "Free%"] {
                        ui.label(egui::RichText::new(header).strong().size(11.0));
                    }
                    ui.end_row();
                    for disk in &doc.hardware.disks {
                        ui.label(&disk.name);
                        ui.label(&disk.file_system);
                        ui.label(format!("{:.1} GB", disk.total_gb()));
                        ui.label(format!("{:.1} GB", disk.free_gb()));
                        let free = disk.free_percent();
                        ui.colored_label(free_space_color(free), format!("{free:.1}%"));
                        ui.end_row();
                    }
                });
            });
            ui.add_space(12.0);
        }

        let title = format!(
            "Event log (last {} days) - {} entries",
            self.config.collection.lookback_days,
            doc.events.len()
        );
        section(ui, &title, |ui| {
            egui::Grid::new("event_grid").striped(true).spacing([15.0, 6.0]).show(ui, |ui| {
                for header in ["Time", "Source", "Type", "ID", "Message"] {
                    ui.label(egui::RichText::new(header).strong().size(11.0));
                }
                ui.end_row();
                for event in doc.events.iter().take(self.config.report.max_event_rows) {
                    ui.label(event.time_generated.format("%Y-%m-%d %H:%M").to_string());
                    ui.label(&event.source_name);
                    ui.label(&event.event_type);
                    ui.label(event.event_id.to_string());
                    ui.label(truncate_chars(&event.message, MESSAGE_CHAR_LIMIT));
                    ui.end_row();
                }
            });
        });
    }
}

impl eframe::App for AppState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request repaint every second to keep the sensors and progress fresh
        ctx.request_repaint_after(Duration::from_secs(1));

        self.poll_worker();

        if self.last_refresh.elapsed() >= self.refresh_interval {
            self.reading = self.sensors.read();
            self.last_refresh = Instant::now();
        }

        egui::SidePanel::left("control_panel")
            .resizable(false)
            .exact_width(220.0)
            .show(ctx, |ui| self.sidebar(ui));

        egui::CentralPanel::default()
            .frame(
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(245, 247, 250))
                    .inner_margin(20.0),
            )
            .show(ctx, |ui| match &self.document {
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.heading("No diagnostic data yet");
                            ui.add_space(8.0);
                            ui.label("Run diagnostics or import a saved report");
                        });
                    });
                }
                Some(doc) => {
                    egui::ScrollArea::vertical().show(ui, |ui| self.report_view(ui, doc));
                }
            });
    }
}
