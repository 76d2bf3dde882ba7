//! Decision policy: from reasoning to a single concrete action
//!
//! The policy is a strict priority scan. Constraints always win over risks,
//! and risks over opportunities; within constraints a rest limit outranks
//! fuel because the driving-hours rule is not negotiable. Exactly one
//! decision comes out of every evaluation, `NoAction` included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matcher::MatchResult;
use crate::observation::Observation;
use crate::reasoning::{Constraint, Opportunity, Reasoning, RiskFlag};

/// The kind of action being decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    RouteChange,
    AcceptBackhaul,
    RejectBackhaul,
    AcceptLtlLoad,
    FuelStop,
    RestStop,
    BookReturnLoad,
    AlertDriver,
    NoAction,
}

/// Urgency of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Typed parameters of the chosen action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionDetails {
    FuelStop {
        within_km: f64,
    },
    RestStop {
        within_hours: f64,
    },
    RouteChange {
        extra_km: f64,
        minutes_saved: f64,
    },
    AcceptLtlLoad {
        load_id: String,
        detour_km: f64,
    },
    BookReturnLoad {
        search_from: String,
    },
    AcceptBackhaul {
        load_id: String,
    },
    RejectBackhaul {
        load_id: String,
        reason: String,
    },
    AlertDriver {
        message: String,
    },
    NoAction,
}

/// Revenue and cost effect the decision is expected to have
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedBenefit {
    pub revenue: f64,
    pub cost_saved: f64,
    pub time_saved_minutes: f64,
}

/// A single decided action, ready for the ledger
///
/// Carries the full [`Reasoning`] it was derived from, so a ledger record
/// can be audited long after the evaluation cycle is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub decision_type: DecisionType,
    pub priority: Priority,
    /// One-line explanation shown to the dispatcher
    pub summary: String,
    pub details: ActionDetails,
    pub expected_benefit: ExpectedBenefit,
    /// The reasoning this decision was derived from
    pub reasoning: Reasoning,
    /// Copied from the reasoning step
    pub confidence: f64,
}

impl Decision {
    fn new(
        decision_type: DecisionType,
        priority: Priority,
        summary: String,
        details: ActionDetails,
        expected_benefit: ExpectedBenefit,
        reasoning: Reasoning,
    ) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            created_at: Utc::now(),
            decision_type,
            priority,
            summary,
            details,
            expected_benefit,
            confidence: reasoning.confidence,
            reasoning,
        }
    }
}

/// Turns a [`Reasoning`] into exactly one [`Decision`]
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    driver_cost_per_hour: f64,
}

impl DecisionPolicy {
    pub fn new(driver_cost_per_hour: f64) -> Self {
        Self {
            driver_cost_per_hour,
        }
    }

    /// Pick the single highest-priority action
    ///
    /// `best_match` is the top-ranked pooling candidate, used to fill in the
    /// accept-load details when a capacity opportunity wins.
    pub fn decide(
        &self,
        observation: &Observation,
        reasoning: &Reasoning,
        best_match: Option<&MatchResult>,
    ) -> Decision {
        if let Some(decision) = self.decide_constraint(reasoning) {
            return decision;
        }

        if let Some(decision) = self.decide_risk(reasoning) {
            return decision;
        }

        if let Some(decision) = self.decide_opportunity(observation, reasoning, best_match) {
            return decision;
        }

        Decision::new(
            DecisionType::NoAction,
            Priority::Low,
            "All parameters nominal, continuing current plan".to_string(),
            ActionDetails::NoAction,
            ExpectedBenefit::default(),
            reasoning.clone(),
        )
    }

    fn decide_constraint(&self, reasoning: &Reasoning) -> Option<Decision> {
        // Rest outranks fuel: driving-hours limits are regulatory.
        if let Some(Constraint::MandatoryRest { hours_remaining }) = reasoning
            .constraints
            .iter()
            .find(|c| matches!(c, Constraint::MandatoryRest { .. }))
        {
            return Some(Decision::new(
                DecisionType::RestStop,
                Priority::Critical,
                format!("Driver must rest within {hours_remaining:.1} hours"),
                ActionDetails::RestStop {
                    within_hours: *hours_remaining,
                },
                ExpectedBenefit::default(),
                reasoning.clone(),
            ));
        }

        if let Some(Constraint::RefuelWithin { km, fuel_percent }) = reasoning
            .constraints
            .iter()
            .find(|c| matches!(c, Constraint::RefuelWithin { .. }))
        {
            return Some(Decision::new(
                DecisionType::FuelStop,
                Priority::High,
                format!("Refuel within {km:.0} km, fuel at {fuel_percent:.0}%"),
                ActionDetails::FuelStop { within_km: *km },
                ExpectedBenefit::default(),
                reasoning.clone(),
            ));
        }

        None
    }

    fn decide_risk(&self, reasoning: &Reasoning) -> Option<Decision> {
        for risk in &reasoning.risks {
            match risk {
                RiskFlag::HeavyTraffic { .. } => {
                    let (extra_km, minutes_saved) = reasoning
                        .trade_offs
                        .first()
                        .map(|t| (t.extra_km, t.minutes_saved))
                        .unwrap_or((0.0, 0.0));

                    return Some(Decision::new(
                        DecisionType::RouteChange,
                        Priority::Medium,
                        format!(
                            "Reroute around heavy traffic: +{extra_km:.0} km, saves {minutes_saved:.0} min"
                        ),
                        ActionDetails::RouteChange {
                            extra_km,
                            minutes_saved,
                        },
                        ExpectedBenefit {
                            revenue: 0.0,
                            cost_saved: minutes_saved / 60.0 * self.driver_cost_per_hour,
                            time_saved_minutes: minutes_saved,
                        },
                        reasoning.clone(),
                    ));
                }
                RiskFlag::AdverseWeather { .. }
                | RiskFlag::StrikeAlert
                | RiskFlag::PoorConnectivity => {
                    return Some(Decision::new(
                        DecisionType::AlertDriver,
                        Priority::Medium,
                        risk.summary(),
                        ActionDetails::AlertDriver {
                            message: risk.summary(),
                        },
                        ExpectedBenefit::default(),
                        reasoning.clone(),
                    ));
                }
                RiskFlag::Advisory { .. } => {}
            }
        }
        None
    }

    fn decide_opportunity(
        &self,
        observation: &Observation,
        reasoning: &Reasoning,
        best_match: Option<&MatchResult>,
    ) -> Option<Decision> {
        for opportunity in &reasoning.opportunities {
            match opportunity {
                Opportunity::SpareCapacity { .. } | Opportunity::HighMatchLoad { .. } => {
                    let best = best_match?;
                    return Some(Decision::new(
                        DecisionType::AcceptLtlLoad,
                        Priority::Low,
                        format!(
                            "Pool load {} for {:.0} net benefit",
                            best.load.load_id, best.net_benefit
                        ),
                        ActionDetails::AcceptLtlLoad {
                            load_id: best.load.load_id.clone(),
                            detour_km: best.detour_km,
                        },
                        ExpectedBenefit {
                            revenue: best.load.offered_rate,
                            ..ExpectedBenefit::default()
                        },
                        reasoning.clone(),
                    ));
                }
                Opportunity::ReturnLoadWindow { .. } => {
                    let search_from = observation
                        .mission
                        .as_ref()
                        .map(|m| m.destination.clone())
                        .unwrap_or_else(|| observation.vehicle.current_city.clone());

                    return Some(Decision::new(
                        DecisionType::BookReturnLoad,
                        Priority::Medium,
                        format!("Search return loads from {search_from}"),
                        ActionDetails::BookReturnLoad { search_from },
                        ExpectedBenefit::default(),
                        reasoning.clone(),
                    ));
                }
            }
        }
        None
    }
}
