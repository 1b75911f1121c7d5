// Derived health analysis produced by the scoring engine

use serde::{Deserialize, Serialize};

/// Scores and recommendations for one collection run.
/// All scores lie in [0, 100]; the tier is a pure function of `system_health_score`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "AnalysisWire", from = "AnalysisWire")]
pub struct PerformanceAnalysis {
    /// Weighted overall score
    pub system_health_score: f64,
    /// Event-log and reliability based score
    pub stability_score: f64,
    /// CPU and memory capability score
    pub performance_score: f64,
    /// Installed memory score
    pub memory_usage_score: f64,
    /// Mean free-space score across volumes
    pub disk_health_score: f64,
    /// Days since last boot; informational only
    pub system_uptime_days: Option<f64>,
    /// Number of critical error events
    pub critical_issues_count: u32,
    /// Number of warning events
    pub warnings_count: u32,
    /// Remediation hints in generation order
    pub recommendations: Vec<String>,
}

impl PerformanceAnalysis {
    pub fn tier(&self) -> HealthTier {
        HealthTier::from_score(self.system_health_score)
    }
}

/// Coarse label for the overall health score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthTier {
    Excellent,
    Good,
    Fair,
    Poor,
    NeedsAttention,
}

impl HealthTier {
    /// Step function over the overall score; total for every f64 input.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthTier::Excellent
        } else if score >= 75.0 {
            HealthTier::Good
        } else if score >= 60.0 {
            HealthTier::Fair
        } else if score >= 40.0 {
            HealthTier::Poor
        } else {
            HealthTier::NeedsAttention
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthTier::Excellent => "Excellent",
            HealthTier::Good => "Good",
            HealthTier::Fair => "Fair",
            HealthTier::Poor => "Poor",
            HealthTier::NeedsAttention => "Needs attention",
        }
    }

    /// Display color as a `#rrggbb` string.
    pub fn color(self) -> &'static str {
        match self {
            HealthTier::Excellent => "#28a745",
            HealthTier::Good => "#17a2b8",
            HealthTier::Fair => "#ffc107",
            HealthTier::Poor => "#fd7e14",
            HealthTier::NeedsAttention => "#dc3545",
        }
    }
}

// Interchange shape. `healthGrade`/`healthColor` are written for older readers
// and dropped on read, so they can never disagree with the score.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalysisWire {
    system_health_score: f64,
    stability_score: f64,
    performance_score: f64,
    memory_usage_score: f64,
    disk_health_score: f64,
    system_uptime_days: Option<f64>,
    critical_issues_count: u32,
    warnings_count: u32,
    recommendations: Vec<String>,
    #[serde(skip_deserializing)]
    health_grade: String,
    #[serde(skip_deserializing)]
    health_color: String,
}

impl Default for AnalysisWire {
    fn default() -> Self {
        PerformanceAnalysis::default().into()
    }
}

impl From<PerformanceAnalysis> for AnalysisWire {
    fn from(a: PerformanceAnalysis) -> Self {
        let tier = a.tier();
        Self {
            system_health_score: a.system_health_score,
            stability_score: a.stability_score,
            performance_score: a.performance_score,
            memory_usage_score: a.memory_usage_score,
            disk_health_score: a.disk_health_score,
            system_uptime_days: a.system_uptime_days,
            critical_issues_count: a.critical_issues_count,
            warnings_count: a.warnings_count,
            recommendations: a.recommendations,
            health_grade: tier.label().to_string(),
            health_color: tier.color().to_string(),
        }
    }
}

impl From<AnalysisWire> for PerformanceAnalysis {
    fn from(w: AnalysisWire) -> Self {
        Self {
            system_health_score: w.system_health_score,
            stability_score: w.stability_score,
            performance_score: w.performance_score,
            memory_usage_score: w.memory_usage_score,
            disk_health_score: w.disk_health_score,
            system_uptime_days: w.system_uptime_days,
            critical_issues_count: w.critical_issues_count,
            warnings_count: w.warnings_count,
            recommendations: w.recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive_lower_bounds() {
        assert_eq!(HealthTier::from_score(100.0), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(90.0), HealthTier::Excellent);
        assert_eq!(HealthTier::from_score(89.99), HealthTier::Good);
        assert_eq!(HealthTier::from_score(75.0), HealthTier::Good);
        assert_eq!(HealthTier::from_score(74.99), HealthTier::Fair);
        assert_eq!(HealthTier::from_score(60.0), HealthTier::Fair);
        assert_eq!(HealthTier::from_score(59.99), HealthTier::Poor);
        assert_eq!(HealthTier::from_score(40.0), HealthTier::Poor);
        assert_eq!(HealthTier::from_score(39.99), HealthTier::NeedsAttention);
        assert_eq!(HealthTier::from_score(0.0), HealthTier::NeedsAttention);
    }

    #[test]
    fn every_score_maps_to_a_tier_with_a_color() {
        for tenth in 0..=1000 {
            let tier = HealthTier::from_score(tenth as f64 / 10.0);
            assert!(tier.color().starts_with('#'));
            assert_eq!(tier.color().len(), 7);
            assert!(!tier.label().is_empty());
        }
    }

    #[test]
    fn wire_form_carries_grade_and_color() {
        let analysis = PerformanceAnalysis {
            system_health_score: 52.2,
            ..Default::default()
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["healthGrade"], "Poor");
        assert_eq!(value["healthColor"], "#fd7e14");
        assert_eq!(value["systemUptimeDays"], serde_json::Value::Null);
    }

    #[test]
    fn stale_grade_on_input_is_ignored() {
        let json = r##"{"systemHealthScore": 95.0, "healthGrade": "Poor", "healthColor": "#000000"}"##;
        let analysis: PerformanceAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.tier(), HealthTier::Excellent);
        assert!(analysis.recommendations.is_empty());
    }
}
