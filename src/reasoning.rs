//! Heuristic reasoning over an observation, with optional advisory input
//!
//! The combiner turns an [`Observation`] into typed constraints,
//! opportunities, risks and trade-offs, then sets a recommendation and a
//! confidence value from a fixed ladder. Advisory output is merged as extra
//! risk notes, never as a replacement for the heuristics, and an advisory
//! failure only lowers confidence. This step cannot fail.

use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::matcher::MatchResult;
use crate::observation::Observation;

/// A hard limit the next decision must respect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Fuel is low enough that refuelling must happen within `km`
    RefuelWithin { km: f64, fuel_percent: f64 },
    /// Driver is close to the legal driving limit
    MandatoryRest { hours_remaining: f64 },
}

impl Constraint {
    pub fn summary(&self) -> String {
        match self {
            Self::RefuelWithin { km, fuel_percent } => {
                format!("Need refueling within {km:.0} km (fuel at {fuel_percent:.0}%)")
            }
            Self::MandatoryRest { hours_remaining } => {
                format!("Driver rest required within {hours_remaining:.1} hours")
            }
        }
    }
}

/// A revenue opportunity visible in the current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opportunity {
    /// Spare tonnage with profitable pooling candidates available
    SpareCapacity { available_tons: f64, candidates: usize },
    /// Mission far enough along to line up a return load
    ReturnLoadWindow { progress_percent: f64 },
    /// A single candidate scored well above the notable threshold
    HighMatchLoad { load_id: String, match_score: f64 },
}

impl Opportunity {
    pub fn summary(&self) -> String {
        match self {
            Self::SpareCapacity {
                available_tons,
                candidates,
            } => format!(
                "Can pool additional LTL loads: {available_tons:.1} tons free, {candidates} candidates"
            ),
            Self::ReturnLoadWindow { progress_percent } => format!(
                "Approaching destination ({progress_percent:.0}% done), return loads worth checking"
            ),
            Self::HighMatchLoad {
                load_id,
                match_score,
            } => format!("Load {load_id} scores {match_score:.0}, strong match"),
        }
    }
}

/// An external condition that threatens the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFlag {
    HeavyTraffic { expected_delay_minutes: u32 },
    AdverseWeather { condition: String },
    StrikeAlert,
    PoorConnectivity,
    /// Risk raised by the advisory collaborator rather than the heuristics
    Advisory { note: String },
}

impl RiskFlag {
    pub fn summary(&self) -> String {
        match self {
            Self::HeavyTraffic {
                expected_delay_minutes,
            } => format!("Heavy traffic, expect roughly {expected_delay_minutes} minutes delay"),
            Self::AdverseWeather { condition } => format!("Adverse weather: {condition}"),
            Self::StrikeAlert => "Strike alert along the route".to_string(),
            Self::PoorConnectivity => "Connectivity degraded, updates may lag".to_string(),
            Self::Advisory { note } => note.clone(),
        }
    }
}

/// A quantified alternative the decision step may act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOff {
    pub description: String,
    pub extra_km: f64,
    pub minutes_saved: f64,
}

/// Output of the reasoning step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reasoning {
    /// Human-readable notes on what was observed
    pub observations: Vec<String>,
    pub constraints: Vec<Constraint>,
    pub opportunities: Vec<Opportunity>,
    pub risks: Vec<RiskFlag>,
    pub trade_offs: Vec<TradeOff>,
    pub recommendation: String,
    /// 0.0..=1.0
    pub confidence: f64,
    /// Advisory recommendation text, when one was received
    pub advisory_note: Option<String>,
}

/// Loosely-typed advisory payload
///
/// Advisory output arrives as free-form JSON; any field may be missing and
/// extra fields are ignored. A payload that is not a JSON object at all is
/// treated as a bare recommendation string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl AdvisoryResponse {
    /// Parse an advisory payload leniently
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(Self {
                recommendation: Some(text),
                ..Self::default()
            }),
            _ => None,
        }
    }
}

/// Result of the advisory call, as seen by the combiner
#[derive(Debug, Clone)]
pub enum AdvisoryOutcome {
    /// No advisory collaborator configured
    Disabled,
    Received(AdvisoryResponse),
    /// Call errored, timed out or returned an unparseable payload
    Failed(String),
}

/// Combines observation heuristics with advisory input
#[derive(Debug, Clone)]
pub struct ReasoningCombiner {
    thresholds: ThresholdConfig,
    failure_confidence_penalty: f64,
}

impl ReasoningCombiner {
    pub fn new(thresholds: ThresholdConfig, failure_confidence_penalty: f64) -> Self {
        Self {
            thresholds,
            failure_confidence_penalty,
        }
    }

    /// Produce a [`Reasoning`] from the observation and pre-scored loads
    ///
    /// `scored_loads` are the pooling candidates already ranked by the
    /// capacity matcher for the vehicle's spare capacity.
    pub fn combine(
        &self,
        observation: &Observation,
        scored_loads: &[MatchResult],
        advisory: AdvisoryOutcome,
    ) -> Reasoning {
        let mut observations = Vec::new();
        let mut constraints = Vec::new();
        let mut opportunities = Vec::new();
        let mut risks = Vec::new();
        let mut trade_offs = Vec::new();

        let vehicle = &observation.vehicle;

        if vehicle.fuel_percent < self.thresholds.fuel_constraint_percent {
            observations.push(format!("Fuel at {:.0}%", vehicle.fuel_percent));
            constraints.push(Constraint::RefuelWithin {
                km: self.thresholds.refuel_within_km,
                fuel_percent: vehicle.fuel_percent,
            });
        }

        if vehicle.driver_hours_remaining < self.thresholds.driver_rest_threshold_hours {
            observations.push(format!(
                "Driver has {:.1} hours before mandatory rest",
                vehicle.driver_hours_remaining
            ));
            constraints.push(Constraint::MandatoryRest {
                hours_remaining: vehicle.driver_hours_remaining,
            });
        }

        let spare = vehicle.available_capacity_tons();
        if spare > self.thresholds.spare_capacity_tons && !scored_loads.is_empty() {
            observations.push(format!("{spare:.1} tons of spare capacity"));
            opportunities.push(Opportunity::SpareCapacity {
                available_tons: spare,
                candidates: scored_loads.len(),
            });
        }

        for result in scored_loads {
            if result.match_score > self.thresholds.notable_match_score {
                opportunities.push(Opportunity::HighMatchLoad {
                    load_id: result.load.load_id.clone(),
                    match_score: result.match_score,
                });
            }
        }

        if let Some(mission) = &observation.mission {
            let progress = mission.progress_percent();
            observations.push(format!("Mission progress: {progress:.0}%"));
            if progress > self.thresholds.backhaul_progress_percent {
                opportunities.push(Opportunity::ReturnLoadWindow {
                    progress_percent: progress,
                });
            }
        }

        let environment = &observation.environment;
        if environment.traffic_level == "heavy" {
            risks.push(RiskFlag::HeavyTraffic {
                expected_delay_minutes: 30,
            });
            trade_offs.push(TradeOff {
                description: "Reroute adds 20 km but saves 25 minutes".to_string(),
                extra_km: 20.0,
                minutes_saved: 25.0,
            });
        }

        if matches!(environment.weather.as_str(), "storm" | "fog") {
            risks.push(RiskFlag::AdverseWeather {
                condition: environment.weather.clone(),
            });
        }

        if environment.strike_alert {
            risks.push(RiskFlag::StrikeAlert);
        }

        if environment.connectivity_status == "offline" {
            risks.push(RiskFlag::PoorConnectivity);
        }

        let mut confidence = if constraints.is_empty() && opportunities.is_empty() {
            0.95
        } else if !constraints.is_empty() {
            0.90
        } else {
            0.85
        };

        let recommendation = if !constraints.is_empty() {
            "Address constraints first, then evaluate opportunities".to_string()
        } else if !opportunities.is_empty() {
            "Evaluate opportunities for additional earnings".to_string()
        } else {
            "Continue current course".to_string()
        };

        let advisory_note = match advisory {
            AdvisoryOutcome::Disabled => None,
            AdvisoryOutcome::Received(response) => {
                for note in response.risks {
                    risks.push(RiskFlag::Advisory { note });
                }
                response.recommendation
            }
            AdvisoryOutcome::Failed(reason) => {
                tracing::warn!(reason = %reason, "advisory unavailable, heuristics only");
                confidence = (confidence - self.failure_confidence_penalty).max(0.0);
                None
            }
        };

        Reasoning {
            observations,
            constraints,
            opportunities,
            risks,
            trade_offs,
            recommendation,
            confidence,
            advisory_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;
    use crate::matcher::CapacityMatcher;
    use crate::observation::observe;
    use crate::state::{
        CandidateLoad, EnvironmentState, GeoPoint, JourneyState, MissionState, VehicleClass,
        VehicleState,
    };
    use chrono::Utc;

    fn combiner() -> ReasoningCombiner {
        ReasoningCombiner::new(ThresholdConfig::default(), 0.1)
    }

    fn vehicle(fuel: f64, hours: f64, load_tons: f64) -> VehicleState {
        VehicleState {
            vehicle_id: "veh-001".to_string(),
            registration: "MH-04-AB-1234".to_string(),
            vehicle_class: VehicleClass::Hcv,
            location: GeoPoint { lat: 19.076, lng: 72.8777 },
            current_city: "Mumbai".to_string(),
            speed_kmh: 60.0,
            fuel_percent: fuel,
            max_capacity_tons: 25.0,
            current_load_tons: load_tons,
            driver_name: "Ramesh".to_string(),
            driver_hours_remaining: hours,
            last_update: Utc::now(),
        }
    }

    fn environment() -> EnvironmentState {
        EnvironmentState {
            weather: "clear".to_string(),
            traffic_level: "moderate".to_string(),
            road_condition: "good".to_string(),
            delay_probability: 0.1,
            fuel_price: 90.0,
            toll_queue_minutes: 5,
            border_delay_minutes: 0,
            festival_season: false,
            strike_alert: false,
            connectivity_status: "good".to_string(),
        }
    }

    fn mission(progress_km: f64) -> MissionState {
        MissionState {
            mission_id: "m-001".to_string(),
            origin: "Delhi".to_string(),
            destination: "Mumbai".to_string(),
            origin_address: "Okhla Phase II".to_string(),
            destination_address: "Bhiwandi".to_string(),
            cargo_type: "electronics".to_string(),
            weight_tons: 12.0,
            distance_km: 1000.0,
            progress_km,
            base_fare: 78100.0,
            toll_cost: 1265.0,
            fuel_cost_estimated: 36514.0,
            started_at: Utc::now(),
            expected_arrival: Utc::now(),
            checkpoints: Vec::new(),
            current_checkpoint_index: 0,
        }
    }

    fn observe_with(
        fuel: f64,
        hours: f64,
        load_tons: f64,
        mission_state: Option<MissionState>,
        env: EnvironmentState,
    ) -> crate::observation::Observation {
        observe(
            &ThresholdConfig::default(),
            JourneyState::InTransit,
            vehicle(fuel, hours, load_tons),
            mission_state,
            env,
            Vec::new(),
        )
    }

    fn scored_load(rate: f64) -> Vec<MatchResult> {
        let matcher = CapacityMatcher::new(MatcherConfig::default());
        matcher.rank_ltl(
            10.0,
            &[CandidateLoad {
                load_id: "ltl-001".to_string(),
                shipper: "ABC Electronics".to_string(),
                cargo_type: "electronics".to_string(),
                weight_tons: 2.5,
                pickup_city: "Mumbai".to_string(),
                delivery_city: "Pune".to_string(),
                offered_rate: rate,
                pickup_window: "Flexible".to_string(),
                detour_km: Some(5.0),
            }],
        )
    }

    #[test]
    fn test_nominal_state_high_confidence() {
        let obs = observe_with(80.0, 6.0, 24.0, None, environment());
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);

        assert!(reasoning.constraints.is_empty());
        assert!(reasoning.opportunities.is_empty());
        assert_eq!(reasoning.confidence, 0.95);
        assert_eq!(reasoning.recommendation, "Continue current course");
    }

    #[test]
    fn test_low_fuel_becomes_constraint() {
        let obs = observe_with(22.0, 6.0, 24.0, None, environment());
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);

        assert_eq!(reasoning.constraints.len(), 1);
        assert!(matches!(
            reasoning.constraints[0],
            Constraint::RefuelWithin { km, .. } if km == 100.0
        ));
        assert_eq!(reasoning.confidence, 0.90);
    }

    #[test]
    fn test_constraints_dominate_opportunities() {
        // Low fuel plus spare capacity with candidates: confidence stays at
        // the constraint rung.
        let obs = observe_with(22.0, 6.0, 12.0, None, environment());
        let reasoning = combiner().combine(&obs, &scored_load(9000.0), AdvisoryOutcome::Disabled);

        assert!(!reasoning.constraints.is_empty());
        assert!(!reasoning.opportunities.is_empty());
        assert_eq!(reasoning.confidence, 0.90);
        assert!(reasoning.recommendation.contains("constraints first"));
    }

    #[test]
    fn test_spare_capacity_needs_candidates() {
        let obs = observe_with(80.0, 6.0, 12.0, None, environment());
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);
        assert!(reasoning.opportunities.is_empty());

        let reasoning = combiner().combine(&obs, &scored_load(9000.0), AdvisoryOutcome::Disabled);
        assert!(matches!(
            reasoning.opportunities[0],
            Opportunity::SpareCapacity { candidates: 1, .. }
        ));
        assert_eq!(reasoning.confidence, 0.85);
    }

    #[test]
    fn test_return_window_after_progress_threshold() {
        let obs = observe_with(80.0, 6.0, 24.0, Some(mission(750.0)), environment());
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);

        assert!(matches!(
            reasoning.opportunities[0],
            Opportunity::ReturnLoadWindow { progress_percent } if progress_percent == 75.0
        ));

        let obs = observe_with(80.0, 6.0, 24.0, Some(mission(500.0)), environment());
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);
        assert!(reasoning.opportunities.is_empty());
    }

    #[test]
    fn test_heavy_traffic_adds_quantified_trade_off() {
        let mut env = environment();
        env.traffic_level = "heavy".to_string();

        let obs = observe_with(80.0, 6.0, 24.0, None, env);
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Disabled);

        assert!(matches!(reasoning.risks[0], RiskFlag::HeavyTraffic { .. }));
        assert_eq!(reasoning.trade_offs.len(), 1);
        assert_eq!(reasoning.trade_offs[0].extra_km, 20.0);
        assert_eq!(reasoning.trade_offs[0].minutes_saved, 25.0);
    }

    #[test]
    fn test_advisory_failure_lowers_confidence_only() {
        let obs = observe_with(80.0, 6.0, 24.0, None, environment());
        let reasoning = combiner().combine(
            &obs,
            &[],
            AdvisoryOutcome::Failed("timed out".to_string()),
        );

        assert!((reasoning.confidence - 0.85).abs() < 1e-9);
        assert!(reasoning.advisory_note.is_none());
        assert_eq!(reasoning.recommendation, "Continue current course");
    }

    #[test]
    fn test_advisory_risks_merged() {
        let obs = observe_with(80.0, 6.0, 24.0, None, environment());
        let response = AdvisoryResponse {
            recommendation: Some("Top up fuel before the ghat section".to_string()),
            risks: vec!["Fog expected after midnight".to_string()],
            confidence: Some(0.7),
        };
        let reasoning = combiner().combine(&obs, &[], AdvisoryOutcome::Received(response));

        assert_eq!(reasoning.confidence, 0.95);
        assert!(matches!(&reasoning.risks[0], RiskFlag::Advisory { note } if note.contains("Fog")));
        assert!(reasoning.advisory_note.is_some());
    }

    #[test]
    fn test_advisory_payload_parsed_leniently() {
        let parsed = AdvisoryResponse::from_value(serde_json::json!({
            "recommendation": "Hold current route",
            "unexpected_field": 42,
        }))
        .unwrap();
        assert_eq!(parsed.recommendation.as_deref(), Some("Hold current route"));
        assert!(parsed.risks.is_empty());

        let raw = AdvisoryResponse::from_value(serde_json::json!("just drive carefully")).unwrap();
        assert_eq!(raw.recommendation.as_deref(), Some("just drive carefully"));

        assert!(AdvisoryResponse::from_value(serde_json::json!(17)).is_none());
    }
}
