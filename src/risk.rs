//! Risk scoring and ETA range estimation
//!
//! The risk score is a weighted sum of route and cargo attributes, clamped to
//! 0..=100. ETAs are always a three-point range; single optimistic arrival
//! times are exactly what the range exists to avoid.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RiskConfig;

/// Corridor or overall risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    /// Flat score contribution of the corridor's base risk
    pub fn base_score(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::Medium => 5,
            Self::High => 12,
            Self::Unknown => 8,
        }
    }

    /// Fare effort contribution of this risk level
    pub fn effort_factor(self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::Medium => 0.05,
            Self::High => 0.12,
            Self::Unknown => 0.08,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

/// Cargo types that attract the sensitive-cargo risk bump
const SENSITIVE_CARGO: &[&str] = &["hazmat", "chemicals", "perishable", "perishables", "pharmaceuticals"];

/// Inputs to a risk assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRequest {
    pub distance_km: f64,
    pub checkpoint_count: usize,
    pub cargo_type: String,
    pub weight_tons: f64,
    /// Corridor risk reported by the routing collaborator
    pub corridor_risk: RiskLevel,
}

/// Result of scoring a route/cargo combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0..=100
    pub score: u32,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub mitigations: Vec<String>,
}

/// Optimistic/expected/pessimistic arrival estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaRange {
    pub optimistic_hours: f64,
    pub expected_hours: f64,
    pub pessimistic_hours: f64,
    pub optimistic_arrival: DateTime<Utc>,
    pub expected_arrival: DateTime<Utc>,
    pub pessimistic_arrival: DateTime<Utc>,
}

/// Risk and ETA estimator
#[derive(Debug, Clone)]
pub struct RiskEstimator {
    config: RiskConfig,
}

impl RiskEstimator {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Score the route/cargo combination
    pub fn assess(&self, request: &RiskRequest) -> RiskAssessment {
        let mut score: u32 = 0;
        let mut factors = Vec::new();

        if request.distance_km > 1000.0 {
            score += 15;
            factors.push("Long haul journey (>1000 km)".to_string());
        } else if request.distance_km > 500.0 {
            score += 8;
            factors.push("Medium distance journey".to_string());
        }

        if request.checkpoint_count > 3 {
            score += 20;
            factors.push(format!("{} state border crossings", request.checkpoint_count));
        } else if request.checkpoint_count > 1 {
            score += 10;
            factors.push(format!("{} state border crossings", request.checkpoint_count));
        }

        if SENSITIVE_CARGO.contains(&request.cargo_type.to_ascii_lowercase().as_str()) {
            score += 15;
            factors.push(format!("Sensitive cargo: {}", request.cargo_type));
        }

        if request.weight_tons > 22.0 {
            score += 10;
            factors.push("Heavy load (>22 tons)".to_string());
        }

        score += request.corridor_risk.base_score();
        if request.corridor_risk == RiskLevel::High {
            score += 15;
            factors.push("High-risk corridor".to_string());
        }

        let score = score.min(100);
        let level = if score < self.config.low_risk_below {
            RiskLevel::Low
        } else if score < self.config.medium_risk_below {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        RiskAssessment {
            score,
            level,
            mitigations: mitigation_suggestions(&factors),
            factors,
        }
    }

    /// Derive the three-point ETA range from undelayed driving time
    pub fn eta_range(&self, base_hours: f64, from: DateTime<Utc>) -> EtaRange {
        let optimistic_hours = base_hours * self.config.eta_optimistic_factor;
        let expected_hours = base_hours * self.config.eta_expected_factor;
        let pessimistic_hours = base_hours * self.config.eta_pessimistic_factor;

        EtaRange {
            optimistic_hours,
            expected_hours,
            pessimistic_hours,
            optimistic_arrival: from + hours(optimistic_hours),
            expected_arrival: from + hours(expected_hours),
            pessimistic_arrival: from + hours(pessimistic_hours),
        }
    }
}

fn hours(h: f64) -> ChronoDuration {
    ChronoDuration::seconds((h * 3600.0) as i64)
}

fn mitigation_suggestions(factors: &[String]) -> Vec<String> {
    let mut suggestions = vec![
        "Keep all documents ready (RC, License, E-Way Bill, Insurance)".to_string(),
        "Maintain regular communication with dispatch".to_string(),
    ];

    let has = |needle: &str| factors.iter().any(|f| f.to_ascii_lowercase().contains(needle));

    if has("border") {
        suggestions.push("Prepare for potential delays at state borders".to_string());
    }
    if has("heavy") {
        suggestions.push("Drive cautiously on curves and inclines".to_string());
    }
    if has("sensitive") {
        suggestions.push("Monitor cargo conditions regularly".to_string());
    }
    if has("long haul") {
        suggestions.push("Plan mandatory rest stops every 4-5 hours".to_string());
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> RiskEstimator {
        RiskEstimator::new(RiskConfig::default())
    }

    fn request() -> RiskRequest {
        RiskRequest {
            distance_km: 1420.0,
            checkpoint_count: 3,
            cargo_type: "electronics".to_string(),
            weight_tons: 12.0,
            corridor_risk: RiskLevel::Low,
        }
    }

    #[test]
    fn test_long_haul_scoring() {
        // 15 for distance, 10 for checkpoints, electronics is not sensitive
        let assessment = estimator().assess(&request());
        assert_eq!(assessment.score, 25);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(assessment.factors.len(), 2);
    }

    #[test]
    fn test_sensitive_heavy_high_corridor() {
        let mut req = request();
        req.cargo_type = "hazmat".to_string();
        req.weight_tons = 24.0;
        req.checkpoint_count = 5;
        req.corridor_risk = RiskLevel::High;

        // 15 + 20 + 15 + 10 + 12 + 15 = 87
        let assessment = estimator().assess(&req);
        assert_eq!(assessment.score, 87);
        assert_eq!(assessment.level, RiskLevel::High);
        assert!(assessment
            .mitigations
            .iter()
            .any(|m| m.contains("state borders")));
    }

    #[test]
    fn test_score_clamped_to_100() {
        let mut req = request();
        req.cargo_type = "hazmat".to_string();
        req.weight_tons = 30.0;
        req.checkpoint_count = 8;
        req.distance_km = 2600.0;
        req.corridor_risk = RiskLevel::High;

        let assessment = estimator().assess(&req);
        assert!(assessment.score <= 100);
    }

    #[test]
    fn test_short_easy_route_is_low_risk() {
        let req = RiskRequest {
            distance_km: 350.0,
            checkpoint_count: 0,
            cargo_type: "general".to_string(),
            weight_tons: 8.0,
            corridor_risk: RiskLevel::Low,
        };
        let assessment = estimator().assess(&req);
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_eta_range_factors() {
        let now = Utc::now();
        let eta = estimator().eta_range(24.0, now);
        assert!((eta.optimistic_hours - 21.6).abs() < 1e-9);
        assert!((eta.expected_hours - 27.6).abs() < 1e-9);
        assert!((eta.pessimistic_hours - 36.0).abs() < 1e-9);
        assert!(eta.optimistic_arrival < eta.expected_arrival);
        assert!(eta.expected_arrival < eta.pessimistic_arrival);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn eta_ordering_holds(base_hours in 0.1f64..200.0) {
                let eta = estimator().eta_range(base_hours, Utc::now());
                prop_assert!(eta.optimistic_hours <= eta.expected_hours);
                prop_assert!(eta.expected_hours <= eta.pessimistic_hours);
            }

            #[test]
            fn risk_score_always_in_bounds(
                distance in 0.0f64..5000.0,
                checkpoints in 0usize..10,
                weight in 0.1f64..50.0,
            ) {
                let req = RiskRequest {
                    distance_km: distance,
                    checkpoint_count: checkpoints,
                    cargo_type: "chemicals".to_string(),
                    weight_tons: weight,
                    corridor_risk: RiskLevel::Unknown,
                };
                let assessment = estimator().assess(&req);
                prop_assert!(assessment.score <= 100);
            }
        }
    }
}
