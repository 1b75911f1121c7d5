//! Health scoring engine.
//!
//! Turns a hardware snapshot, the event log and the reliability history into
//! a [`PerformanceAnalysis`]. Everything here is pure: no I/O, no clock, and
//! the same inputs always produce the same scores and recommendation order.

use crate::models::{
    DiskVolume, EventRecord, EventSeverity, HardwareSnapshot, PerformanceAnalysis,
    ReliabilityRecord,
};
use tracing::debug;

/// Event IDs treated as critical when logged at error level
/// (unexpected shutdowns, bugchecks, service crashes).
pub const CRITICAL_EVENT_IDS: [u32; 8] = [41, 55, 57, 1003, 1073, 6008, 7034, 7036];

/// Reliability history size above which stability is penalized.
const RELIABILITY_RECORD_LIMIT: usize = 50;

// Weights of the overall score
const STABILITY_WEIGHT: f64 = 0.4;
const PERFORMANCE_WEIGHT: f64 = 0.3;
const MEMORY_WEIGHT: f64 = 0.15;
const DISK_WEIGHT: f64 = 0.15;

// CPU brand tiers: vendor marker, model markers, bonus
const CPU_BRAND_TIERS: &[(&str, &[(&[&str], f64)])] = &[
    (
        "intel",
        &[(&["i9", "xeon"], 15.0), (&["i7"], 10.0), (&["i5"], 5.0)],
    ),
    (
        "amd",
        &[
            (&["ryzen 9", "threadripper"], 15.0),
            (&["ryzen 7"], 10.0),
            (&["ryzen 5"], 5.0),
        ],
    ),
];

/// Error/warning tallies extracted from the event log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EventTally {
    pub errors: u32,
    pub warnings: u32,
    pub critical: u32,
}

/// Scores a collection run.
pub fn analyze(
    hardware: &HardwareSnapshot,
    events: &[EventRecord],
    reliability: &[ReliabilityRecord],
) -> PerformanceAnalysis {
    let tally = tally_events(events);
    let mut recommendations = Vec::new();

    let memory_gb = hardware.total_memory_gb();
    let memory = memory_score(memory_gb, &mut recommendations);
    let disk = disk_score(&hardware.disks, &mut recommendations);
    let stability = stability_score(&tally, reliability.len(), &mut recommendations);
    let performance = performance_score(
        hardware.cpu_cores,
        &hardware.cpu_brand,
        memory_gb,
        &mut recommendations,
    );

    let overall = (stability * STABILITY_WEIGHT
        + performance * PERFORMANCE_WEIGHT
        + memory * MEMORY_WEIGHT
        + disk * DISK_WEIGHT)
        .clamp(0.0, 100.0);

    if tally.critical > 0 {
        recommendations.push(format!(
            "Found {} critical system errors; review the system event log immediately",
            tally.critical
        ));
    }
    if overall < 60.0 {
        recommendations
            .push("System health score is low; a full system maintenance pass is recommended".to_string());
    }

    debug!(
        overall,
        stability, performance, memory, disk, critical = tally.critical, "health scores computed"
    );

    PerformanceAnalysis {
        system_health_score: overall,
        stability_score: stability,
        performance_score: performance,
        memory_usage_score: memory,
        disk_health_score: disk,
        system_uptime_days: hardware.uptime_days(),
        critical_issues_count: tally.critical,
        warnings_count: tally.warnings,
        recommendations,
    }
}

/// Counts errors, warnings and critical errors.
pub fn tally_events(events: &[EventRecord]) -> EventTally {
    let mut tally = EventTally::default();
    for event in events {
        match event.severity() {
            EventSeverity::Error => {
                tally.errors += 1;
                if is_critical(event) {
                    tally.critical += 1;
                }
            }
            EventSeverity::Warning => tally.warnings += 1,
            EventSeverity::Other => {}
        }
    }
    tally
}

/// Whether an error-level event indicates a crash-class failure.
/// Severity is not checked here; callers only pass error events.
pub fn is_critical(event: &EventRecord) -> bool {
    if CRITICAL_EVENT_IDS.contains(&event.event_id) {
        return true;
    }
    let source = event.source_name.to_lowercase();
    let message = event.message.to_lowercase();
    source.contains("bugcheck") || message.contains("critical") || message.contains("fatal")
}

pub fn memory_score(total_memory_gb: f64, recommendations: &mut Vec<String>) -> f64 {
    if total_memory_gb >= 16.0 {
        90.0
    } else if total_memory_gb >= 8.0 {
        75.0
    } else if total_memory_gb >= 4.0 {
        recommendations.push(
            "Memory capacity is small; consider upgrading to 8GB or more".to_string(),
        );
        60.0
    } else {
        recommendations
            .push("Memory is critically low; upgrading to 8GB or more is strongly advised".to_string());
        40.0
    }
}

/// Mean of per-volume free-space scores; 50 when no volume was reported.
pub fn disk_score(disks: &[DiskVolume], recommendations: &mut Vec<String>) -> f64 {
    if disks.is_empty() {
        recommendations.push("No disk detected; check the disk connections".to_string());
        return 50.0;
    }

    let total: f64 = disks
        .iter()
        .map(|disk| volume_score(disk, recommendations))
        .sum();
    total / disks.len() as f64
}

fn volume_score(disk: &DiskVolume, recommendations: &mut Vec<String>) -> f64 {
    let free = disk.free_percent();
    if free > 50.0 {
        90.0
    } else if free > 25.0 {
        75.0
    } else if free > 10.0 {
        recommendations.push(format!(
            "Disk {} is low on free space ({:.0}%); consider cleaning it up",
            disk.name, free
        ));
        60.0
    } else {
        recommendations.push(format!(
            "Disk {} is critically low on free space ({:.0}%); free up space immediately",
            disk.name, free
        ));
        30.0
    }
}

pub fn stability_score(
    tally: &EventTally,
    reliability_count: usize,
    recommendations: &mut Vec<String>,
) -> f64 {
    let mut score = 100.0;
    score -= (tally.errors as f64 * 2.0).min(40.0);
    score -= (tally.warnings as f64 * 0.5).min(20.0);
    score -= (tally.critical as f64 * 10.0).min(30.0);

    if reliability_count > RELIABILITY_RECORD_LIMIT {
        score -= 10.0;
        recommendations.push(
            "Many reliability records were logged; check the system's stability".to_string(),
        );
    }

    f64::max(score, 0.0)
}

pub fn performance_score(
    cpu_cores: u32,
    cpu_brand: &str,
    total_memory_gb: f64,
    recommendations: &mut Vec<String>,
) -> f64 {
    let mut score = 50.0;

    score += if cpu_cores >= 8 {
        20.0
    } else if cpu_cores >= 4 {
        15.0
    } else if cpu_cores >= 2 {
        5.0
    } else {
        recommendations.push(
            "Low CPU core count may limit multitasking performance".to_string(),
        );
        -10.0
    };

    score += cpu_brand_bonus(cpu_brand);

    score += if total_memory_gb >= 16.0 {
        15.0
    } else if total_memory_gb >= 8.0 {
        10.0
    } else if total_memory_gb >= 4.0 {
        5.0
    } else {
        -5.0
    };

    score.clamp(0.0, 100.0)
}

/// Bonus for known high-end CPU lines; 0 for anything unrecognized.
pub fn cpu_brand_bonus(cpu_brand: &str) -> f64 {
    let brand = cpu_brand.to_lowercase();
    let Some((_, tiers)) = CPU_BRAND_TIERS
        .iter()
        .find(|(vendor, _)| brand.contains(vendor))
    else {
        return 0.0;
    };

    tiers
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| brand.contains(m)))
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const GB: u64 = 1024 * 1024 * 1024;

    fn error_event(id: u32, source: &str, message: &str) -> EventRecord {
        EventRecord {
            time_generated: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            log_file: "System".into(),
            source_name: source.into(),
            event_type: "Error".into(),
            event_id: id,
            message: message.into(),
        }
    }

    fn volume(total: u64, available: u64) -> DiskVolume {
        DiskVolume {
            name: "C:\\".into(),
            file_system: "NTFS".into(),
            total_space: total,
            available_space: available,
        }
    }

    #[test]
    fn memory_thresholds_are_inclusive() {
        let mut recs = Vec::new();
        assert_eq!(memory_score(16.0, &mut recs), 90.0);
        assert_eq!(memory_score(15.99, &mut recs), 75.0);
        assert_eq!(memory_score(8.0, &mut recs), 75.0);
        assert!(recs.is_empty());
        assert_eq!(memory_score(4.0, &mut recs), 60.0);
        assert_eq!(recs.len(), 1);
        assert_eq!(memory_score(3.99, &mut recs), 40.0);
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn disk_thresholds_are_strict() {
        let mut recs = Vec::new();
        assert_eq!(disk_score(&[volume(100, 51)], &mut recs), 90.0);
        assert_eq!(disk_score(&[volume(100, 50)], &mut recs), 75.0);
        assert_eq!(disk_score(&[volume(100, 26)], &mut recs), 75.0);
        assert!(recs.is_empty());
        assert_eq!(disk_score(&[volume(100, 25)], &mut recs), 60.0);
        assert_eq!(disk_score(&[volume(100, 11)], &mut recs), 60.0);
        assert_eq!(disk_score(&[volume(100, 10)], &mut recs), 30.0);
        assert_eq!(recs.len(), 3);
        assert!(recs[2].contains("critically low"));
        assert!(recs[2].contains("(10%)"));
    }

    #[test]
    fn disk_score_averages_volumes() {
        let mut recs = Vec::new();
        let score = disk_score(&[volume(100, 80), volume(100, 5)], &mut recs);
        assert_eq!(score, 60.0);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn zero_capacity_volume_counts_as_full() {
        let mut recs = Vec::new();
        assert_eq!(disk_score(&[volume(0, 0)], &mut recs), 30.0);
        assert!(recs[0].contains("(0%)"));
    }

    #[test]
    fn missing_disks_score_fifty() {
        let mut recs = Vec::new();
        assert_eq!(disk_score(&[], &mut recs), 50.0);
        assert_eq!(recs, vec!["No disk detected; check the disk connections".to_string()]);
    }

    #[test]
    fn stability_penalties_are_capped() {
        let mut recs = Vec::new();
        let tally = EventTally {
            errors: 100,
            warnings: 100,
            critical: 100,
        };
        assert_eq!(stability_score(&tally, 0, &mut recs), 10.0);
        assert_eq!(stability_score(&tally, 51, &mut recs), 0.0);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn stability_reliability_limit_is_strict() {
        let mut recs = Vec::new();
        assert_eq!(stability_score(&EventTally::default(), 50, &mut recs), 100.0);
        assert!(recs.is_empty());
        assert_eq!(stability_score(&EventTally::default(), 51, &mut recs), 90.0);
    }

    #[test]
    fn warning_penalty_is_fractional() {
        let mut recs = Vec::new();
        let tally = EventTally {
            errors: 0,
            warnings: 3,
            critical: 0,
        };
        assert_eq!(stability_score(&tally, 0, &mut recs), 98.5);
    }

    #[test]
    fn critical_detection_uses_ids_and_keywords() {
        assert!(is_critical(&error_event(41, "Kernel-Power", "")));
        assert!(is_critical(&error_event(7034, "Service Control Manager", "")));
        assert!(is_critical(&error_event(1, "BugCheck", "")));
        assert!(is_critical(&error_event(1, "App", "A FATAL exception occurred")));
        assert!(is_critical(&error_event(1, "App", "Critical failure")));
        assert!(!is_critical(&error_event(99, "App", "routine error")));
    }

    #[test]
    fn tally_only_counts_known_severities() {
        let mut info = error_event(41, "Kernel-Power", "critical");
        info.event_type = "Information".into();
        let mut warning = error_event(41, "Kernel-Power", "");
        warning.event_type = "WARNING".into();
        let events = vec![
            error_event(41, "Kernel-Power", ""),
            error_event(99, "App", "routine error"),
            warning,
            info,
        ];
        assert_eq!(
            tally_events(&events),
            EventTally {
                errors: 2,
                warnings: 1,
                critical: 1
            }
        );
    }

    #[test]
    fn cpu_brand_tiers() {
        assert_eq!(cpu_brand_bonus("Intel(R) Core(TM) i9-13900K"), 15.0);
        assert_eq!(cpu_brand_bonus("Intel(R) Xeon(R) W-2245"), 15.0);
        assert_eq!(cpu_brand_bonus("Intel(R) Core(TM) i7-9700K"), 10.0);
        assert_eq!(cpu_brand_bonus("Intel(R) Core(TM) i5-8250U"), 5.0);
        assert_eq!(cpu_brand_bonus("AMD Ryzen 9 7950X"), 15.0);
        assert_eq!(cpu_brand_bonus("AMD Ryzen Threadripper 3970X"), 15.0);
        assert_eq!(cpu_brand_bonus("AMD Ryzen 7 5800X"), 10.0);
        assert_eq!(cpu_brand_bonus("AMD Ryzen 5 3600"), 5.0);
        assert_eq!(cpu_brand_bonus("Intel(R) Celeron(R) N4020"), 0.0);
        assert_eq!(cpu_brand_bonus("Apple M2"), 0.0);
        assert_eq!(cpu_brand_bonus(""), 0.0);
    }

    #[test]
    fn performance_score_is_clamped() {
        let mut recs = Vec::new();
        assert_eq!(
            performance_score(64, "AMD Ryzen Threadripper", 256.0, &mut recs),
            100.0
        );
        assert_eq!(performance_score(1, "", 1.0, &mut recs), 35.0);
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn performance_core_thresholds() {
        let mut recs = Vec::new();
        assert_eq!(performance_score(8, "", 16.0, &mut recs), 85.0);
        assert_eq!(performance_score(4, "", 8.0, &mut recs), 75.0);
        assert_eq!(performance_score(2, "", 4.0, &mut recs), 60.0);
        assert!(recs.is_empty());
    }

    #[test]
    fn exactly_eight_gb_scores_seventy_five() {
        let hw = HardwareSnapshot {
            cpu_cores: 4,
            total_memory: 8 * GB,
            disks: vec![volume(100, 80)],
            ..Default::default()
        };
        assert_eq!(analyze(&hw, &[], &[]).memory_usage_score, 75.0);

        let hw = HardwareSnapshot {
            total_memory: 16 * GB,
            ..hw
        };
        assert_eq!(analyze(&hw, &[], &[]).memory_usage_score, 90.0);
    }

    #[test]
    fn uptime_is_informational_only() {
        let mut hw = HardwareSnapshot {
            cpu_cores: 8,
            total_memory: 16 * GB,
            disks: vec![volume(100, 60)],
            ..Default::default()
        };
        let without = analyze(&hw, &[], &[]);
        hw.uptime_seconds = Some(86_400 * 30);
        let with = analyze(&hw, &[], &[]);

        assert_eq!(without.system_uptime_days, None);
        assert_eq!(with.system_uptime_days, Some(30.0));
        assert_eq!(without.system_health_score, with.system_health_score);
        assert_eq!(without.recommendations, with.recommendations);
    }

    #[test]
    fn empty_inputs_still_produce_bounded_scores() {
        let analysis = analyze(&HardwareSnapshot::default(), &[], &[]);
        for score in [
            analysis.system_health_score,
            analysis.stability_score,
            analysis.performance_score,
            analysis.memory_usage_score,
            analysis.disk_health_score,
        ] {
            assert!((0.0..=100.0).contains(&score));
        }
    }
}
