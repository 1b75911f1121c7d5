// Live CPU and GPU readings for display; never part of the scored document

// Regex for parsing lm-sensors output
use regex::Regex;
// Lazily compiled temperature pattern
use std::sync::LazyLock;
// sysinfo for CPU load
use sysinfo::System;
// Tracing for unavailable sensor tools
use tracing::debug;

// Matches temperature values like +47.0°C or +47°C
static TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+([0-9]+(?:\.[0-9]+)?)°C").unwrap());

/// One sample of the live sensors. Unavailable readings are `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    /// Global CPU load in percent
    pub cpu_load_percent: Option<f32>,
    /// Average of the CPU package/core temperatures in Celsius
    pub cpu_temperature_c: Option<f32>,
    /// Temperature of the first GPU in Celsius
    pub gpu_temperature_c: Option<f32>,
    /// Utilization of the first GPU in percent
    pub gpu_load_percent: Option<f32>,
}

/// Keeps the sysinfo handle between samples so CPU load has a baseline.
pub struct SensorMonitor {
    system: System,
}

impl SensorMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self { system }
    }

    /// Takes a sample. CPU load is only meaningful once
    /// `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` has passed since the previous call.
    pub fn read(&mut self) -> SensorReading {
        self.system.refresh_cpu_usage();
        let (gpu_temperature_c, gpu_load_percent) = read_gpu();
        SensorReading {
            cpu_load_percent: Some(self.system.global_cpu_usage()),
            cpu_temperature_c: read_cpu_temperature(),
            gpu_temperature_c,
            gpu_load_percent,
        }
    }
}

impl Default for SensorMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot sample that waits out the CPU measurement interval.
pub fn read_sensors() -> SensorReading {
    let mut monitor = SensorMonitor::new();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    monitor.read()
}

fn read_cpu_temperature() -> Option<f32> {
    match super::run_command("sensors", &[]) {
        Ok(text) => parse_cpu_temperature(&text),
        Err(e) => {
            debug!(error = %e, "lm-sensors unavailable");
            None
        }
    }
}

fn read_gpu() -> (Option<f32>, Option<f32>) {
    match super::run_command(
        "nvidia-smi",
        &["--query-gpu=temperature.gpu,utilization.gpu", "--format=csv,noheader,nounits"],
    ) {
        Ok(text) => parse_nvidia_sensors(&text),
        Err(e) => {
            debug!(error = %e, "nvidia-smi unavailable");
            (None, None)
        }
    }
}

/// Average of the CPU-related temperatures in `sensors` output.
pub fn parse_cpu_temperature(text: &str) -> Option<f32> {
    let temps: Vec<f32> = text
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            ["tctl", "tdie", "package", "core"]
                .iter()
                .any(|label| lower.contains(label))
        })
        .filter_map(|line| TEMPERATURE.captures(line))
        .filter_map(|caps| caps[1].parse::<f32>().ok())
        .collect();

    if temps.is_empty() {
        None
    } else {
        Some(temps.iter().sum::<f32>() / temps.len() as f32)
    }
}

/// Temperature and utilization of the first GPU from
/// `nvidia-smi --query-gpu=temperature.gpu,utilization.gpu`.
pub fn parse_nvidia_sensors(text: &str) -> (Option<f32>, Option<f32>) {
    let Some(line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return (None, None);
    };
    let mut fields = line.split(',').map(|f| f.trim().parse::<f32>().ok());
    (fields.next().flatten(), fields.next().flatten())
}
