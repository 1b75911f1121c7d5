// Static HTML rendering of a diagnostic document

use crate::error::ReportError;
use crate::models::{DiagnosticDocument, HealthTier};
use serde::Serialize;
use tera::{Context, Tera};

/// Longest event message shown in the event table, in characters.
pub const MESSAGE_CHAR_LIMIT: usize = 100;

// The .html suffix turns on tera's autoescaping
const TEMPLATE_NAME: &str = "report.html";

#[derive(Serialize)]
struct Overview<'a> {
    computer_name: &'a str,
    os_version: &'a str,
    cpu_brand: &'a str,
    cpu_cores: u32,
    memory_mb: u64,
}

// Values are formatted numbers and render unescaped
#[derive(Serialize)]
struct Stat {
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct Health {
    score: String,
    color: &'static str,
    label: &'static str,
    stats: Vec<Stat>,
}

#[derive(Serialize)]
struct DiskRow<'a> {
    name: &'a str,
    file_system: &'a str,
    total: String,
    free: String,
    used: String,
}

#[derive(Serialize)]
struct NetworkRow<'a> {
    name: &'a str,
    mac_address: &'a str,
    ip: &'a str,
}

#[derive(Serialize)]
struct GpuRow<'a> {
    name: &'a str,
    driver: &'a str,
    memory: String,
    temperature: String,
    load: String,
}

#[derive(Serialize)]
struct SmartRow<'a> {
    device_id: &'a str,
    model: &'a str,
    health: String,
    temperature: String,
    power_on_hours: String,
    power_cycles: String,
    unsafe_shutdowns: String,
}

#[derive(Serialize)]
struct ReliabilityRow<'a> {
    time: String,
    source_name: &'a str,
    category: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct EventRow<'a> {
    time: String,
    source_name: &'a str,
    event_type: &'a str,
    event_id: u32,
    message: &'a str,
}

/// Renders `doc` as a standalone HTML page.
///
/// The event table lists at most `max_event_rows` entries in document order
/// and cuts each message at [`MESSAGE_CHAR_LIMIT`] characters. The title
/// still reports the total event count. Interpolated text is HTML-escaped
/// by the template engine.
pub fn render(
    doc: &DiagnosticDocument,
    lookback_days: u32,
    max_event_rows: usize,
) -> Result<String, ReportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, include_str!("template.html"))?;

    let hw = &doc.hardware;
    let mut context = Context::new();
    context.insert(
        "collected_at",
        &doc.collected_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    context.insert(
        "overview",
        &Overview {
            computer_name: &hw.computer_name,
            os_version: &hw.os_version,
            cpu_brand: &hw.cpu_brand,
            cpu_cores: hw.cpu_cores,
            memory_mb: hw.total_memory_mb(),
        },
    );
    context.insert("health", &health(doc));
    context.insert("recommendations", &doc.performance.recommendations);

    let disks: Vec<DiskRow> = hw
        .disks
        .iter()
        .map(|disk| DiskRow {
            name: &disk.name,
            file_system: &disk.file_system,
            total: format!("{:.1} GB", disk.total_gb()),
            free: format!("{:.1} GB", disk.free_gb()),
            used: format!("{:.1}%", disk.usage_percent()),
        })
        .collect();
    context.insert("disks", &disks);

    let networks: Vec<NetworkRow> = hw
        .network_adapters
        .iter()
        .map(|net| NetworkRow {
            name: &net.name,
            mac_address: &net.mac_address,
            ip: Some(net.primary_ip()).filter(|ip| !ip.is_empty()).unwrap_or("--"),
        })
        .collect();
    context.insert("networks", &networks);

    let gpus: Vec<GpuRow> = hw
        .gpus
        .iter()
        .map(|gpu| GpuRow {
            name: &gpu.name,
            driver: gpu.driver_version.as_deref().unwrap_or("--"),
            memory: or_dash(gpu.video_memory, |bytes| format!("{} MB", bytes / (1024 * 1024))),
            temperature: or_dash(gpu.temperature, |t| format!("{t:.0}°C")),
            load: or_dash(gpu.load, |l| format!("{l:.0}%")),
        })
        .collect();
    context.insert("gpus", &gpus);

    let smart: Vec<SmartRow> = hw
        .disk_smart
        .iter()
        .map(|d| SmartRow {
            device_id: &d.device_id,
            model: d.model.as_deref().unwrap_or("--"),
            health: or_dash(d.health_percent, |p| format!("{p}%")),
            temperature: or_dash(d.temperature_c, |t| format!("{t}°C")),
            power_on_hours: or_dash(d.power_on_hours, |h| h.to_string()),
            power_cycles: or_dash(d.power_cycles, |c| c.to_string()),
            unsafe_shutdowns: or_dash(d.unsafe_shutdowns, |u| u.to_string()),
        })
        .collect();
    context.insert("smart", &smart);

    let reliability: Vec<ReliabilityRow> = doc
        .reliability
        .iter()
        .map(|record| ReliabilityRow {
            time: record.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            source_name: &record.source_name,
            category: record.category().label(),
            message: &record.message,
        })
        .collect();
    context.insert("reliability", &reliability);

    let events: Vec<EventRow> = doc
        .events
        .iter()
        .take(max_event_rows)
        .map(|event| EventRow {
            time: event.time_generated.format("%Y-%m-%d %H:%M").to_string(),
            source_name: &event.source_name,
            event_type: &event.event_type,
            event_id: event.event_id,
            message: truncate_chars(&event.message, MESSAGE_CHAR_LIMIT),
        })
        .collect();
    context.insert("events", &events);
    context.insert("event_total", &doc.events.len());
    context.insert("lookback_days", &lookback_days);

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

fn health(doc: &DiagnosticDocument) -> Health {
    let perf = &doc.performance;
    let tier = HealthTier::from_score(perf.system_health_score);
    let score = |value: f64| format!("{value:.0}/100");
    Health {
        score: format!("{:.0}", perf.system_health_score),
        color: tier.color(),
        label: tier.label(),
        stats: vec![
            Stat { label: "Stability", value: score(perf.stability_score) },
            Stat { label: "Performance", value: score(perf.performance_score) },
            Stat { label: "Memory", value: score(perf.memory_usage_score) },
            Stat { label: "Disk health", value: score(perf.disk_health_score) },
            Stat { label: "Critical issues", value: perf.critical_issues_count.to_string() },
            Stat { label: "Warnings", value: perf.warnings_count.to_string() },
            Stat {
                label: "Uptime",
                value: perf
                    .system_uptime_days
                    .map(|days| format!("{days:.1} days"))
                    .unwrap_or_else(|| "n/a".to_string()),
            },
        ],
    }
}

fn or_dash<T>(value: Option<T>, show: impl FnOnce(T) -> String) -> String {
    value.map(show).unwrap_or_else(|| "--".to_string())
}

/// First `limit` characters of `text`, cut on a character boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
