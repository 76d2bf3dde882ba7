//! Engine facade: planning, the evaluation loop, matching and the ledger
//!
//! [`DispatchEngine`] owns the pure components and the decision ledger, and
//! reaches the outside world only through the injected collaborator traits.
//! One call to `evaluate` runs a full observe / reason / decide cycle and
//! records the resulting decision as pending.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::cost::{CostModel, EmptyReturnCost, FareBreakdown, FareRequest};
use crate::decision::{Decision, DecisionPolicy};
use crate::error::{EngineError, Result};
use crate::ledger::{AgentMetrics, DecisionLedger, DecisionRecord};
use crate::matcher::{CapacityMatcher, MatchResult, PoolingSummary};
use crate::observation::{observe, Observation};
use crate::reasoning::{AdvisoryOutcome, AdvisoryResponse, Reasoning, ReasoningCombiner};
use crate::risk::{EtaRange, RiskAssessment, RiskEstimator, RiskRequest};
use crate::state::{CandidateLoad, EnvironmentState, JourneyState, MissionState, VehicleState};
use crate::traits::{AdvisoryProvider, LoadDirectory, PromptContext, Route, RouteProvider};

/// Inputs to mission planning
#[derive(Debug, Clone)]
pub struct MissionPlanRequest {
    pub origin: String,
    pub destination: String,
    pub cargo_type: String,
    pub weight_tons: f64,
    pub vehicle_class: crate::state::VehicleClass,
}

/// A complete mission plan: route, fare, risk and arrival window
#[derive(Debug, Clone)]
pub struct MissionPlan {
    pub route: Route,
    pub fare: FareBreakdown,
    pub risk: RiskAssessment,
    pub eta: EtaRange,
}

/// Everything one evaluation cycle produced
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub observation: Observation,
    pub reasoning: Reasoning,
    pub decision: Decision,
    /// Ledger key the decision was recorded under
    pub mission_key: String,
    pub ranked_loads: Vec<MatchResult>,
}

/// Backhaul options weighed against driving home empty
#[derive(Debug, Clone)]
pub struct BackhaulEvaluation {
    pub matches: Vec<MatchResult>,
    pub empty_return: EmptyReturnCost,
    /// True when the best match beats driving back empty
    pub backhaul_recommended: bool,
}

/// The dispatch decision engine
pub struct DispatchEngine {
    config: EngineConfig,
    cost_model: CostModel,
    risk_estimator: RiskEstimator,
    matcher: CapacityMatcher,
    combiner: ReasoningCombiner,
    policy: DecisionPolicy,
    ledger: DecisionLedger,
    routes: Arc<dyn RouteProvider>,
    loads: Arc<dyn LoadDirectory>,
    advisory: Option<Arc<dyn AdvisoryProvider>>,
}

impl DispatchEngine {
    /// Build an engine from a validated config and injected collaborators
    pub fn new(
        config: EngineConfig,
        routes: Arc<dyn RouteProvider>,
        loads: Arc<dyn LoadDirectory>,
        advisory: Option<Arc<dyn AdvisoryProvider>>,
    ) -> Result<Self> {
        config.validate().map_err(EngineError::configuration)?;

        Ok(Self {
            cost_model: CostModel::new(config.cost.clone()),
            risk_estimator: RiskEstimator::new(config.risk.clone()),
            matcher: CapacityMatcher::new(config.matcher.clone()),
            combiner: ReasoningCombiner::new(
                config.thresholds.clone(),
                config.advisory.failure_confidence_penalty,
            ),
            policy: DecisionPolicy::new(config.cost.driver_cost_per_hour),
            ledger: DecisionLedger::new(),
            routes,
            loads,
            advisory,
            config,
        })
    }

    /// Plan a mission end to end: route, fare, risk score and ETA range
    pub async fn plan_mission(&self, request: &MissionPlanRequest) -> Result<MissionPlan> {
        let route = self
            .routes
            .get_route(&request.origin, &request.destination)
            .await?;

        let fare = self.cost_model.fare(&FareRequest {
            distance_km: route.distance_km,
            weight_tons: request.weight_tons,
            cargo_type: request.cargo_type.clone(),
            checkpoint_count: route.checkpoints.len(),
            toll_cost: route.toll_cost,
            vehicle_class: request.vehicle_class,
            base_hours: route.duration_hours,
            route_risk: route.risk_level,
        })?;

        let risk = self.risk_estimator.assess(&RiskRequest {
            distance_km: route.distance_km,
            checkpoint_count: route.checkpoints.len(),
            cargo_type: request.cargo_type.clone(),
            weight_tons: request.weight_tons,
            corridor_risk: route.risk_level,
        });

        let eta = self.risk_estimator.eta_range(route.duration_hours, Utc::now());

        tracing::info!(
            origin = %request.origin,
            destination = %request.destination,
            distance_km = route.distance_km,
            total_fare = fare.total_fare,
            risk_score = risk.score,
            "mission planned"
        );

        Ok(MissionPlan {
            route,
            fare,
            risk,
            eta,
        })
    }

    /// Run one observe / reason / decide cycle and record the decision
    pub async fn evaluate(
        &self,
        journey_state: JourneyState,
        vehicle: VehicleState,
        mission: Option<MissionState>,
        environment: EnvironmentState,
    ) -> Result<EvaluationOutcome> {
        vehicle.validate()?;
        environment.validate()?;
        if let Some(mission) = &mission {
            mission.validate()?;
        }

        let available_loads = self.market_loads(&vehicle).await;
        let observation = observe(
            &self.config.thresholds,
            journey_state,
            vehicle,
            mission,
            environment,
            available_loads,
        );

        let ranked_loads = self.matcher.rank_ltl(
            observation.vehicle.available_capacity_tons(),
            &observation.available_loads,
        );

        let advisory = self.consult_advisory(&observation).await;
        let reasoning = self.combiner.combine(&observation, &ranked_loads, advisory);
        let decision = self
            .policy
            .decide(&observation, &reasoning, ranked_loads.first());

        let mission_key = observation
            .mission
            .as_ref()
            .map(|m| m.mission_id.clone())
            .unwrap_or_else(|| observation.vehicle.vehicle_id.clone());

        self.ledger.record(&mission_key, decision.clone()).await;

        tracing::info!(
            mission_key = %mission_key,
            decision_type = ?decision.decision_type,
            priority = ?decision.priority,
            confidence = reasoning.confidence,
            "evaluation complete"
        );

        Ok(EvaluationOutcome {
            observation,
            reasoning,
            decision,
            mission_key,
            ranked_loads,
        })
    }

    /// Pooling candidates for the vehicle's current position
    pub async fn find_ltl_matches(
        &self,
        vehicle: &VehicleState,
    ) -> Result<(Vec<MatchResult>, PoolingSummary)> {
        vehicle.validate()?;

        let available = vehicle.available_capacity_tons();
        let candidates = self
            .loads
            .search_loads(&vehicle.current_city, available)
            .await?;

        let matches = self.matcher.rank_ltl(available, &candidates);
        let summary = self.matcher.pooling_summary(
            vehicle.max_capacity_tons,
            vehicle.current_load_tons,
            &matches,
        );
        Ok((matches, summary))
    }

    /// Backhaul options for the return leg, weighed against returning empty
    pub async fn evaluate_backhaul(
        &self,
        vehicle: &VehicleState,
        destination: &str,
        home_base: &str,
    ) -> Result<BackhaulEvaluation> {
        vehicle.validate()?;

        let return_route = self.routes.get_route(destination, home_base).await?;
        let empty_return = self.cost_model.empty_return_cost(
            return_route.distance_km,
            return_route.toll_cost,
            vehicle.vehicle_class,
        );

        let candidates = self.loads.search_backhaul(destination, home_base).await?;
        let matches = self.matcher.rank_backhaul(
            vehicle.max_capacity_tons,
            destination,
            home_base,
            &candidates,
        );

        // Any ranked match already clears the profit threshold; it is
        // recommended when it also covers the dead-mile loss.
        let backhaul_recommended = matches
            .first()
            .map(|best| best.net_benefit > 0.0)
            .unwrap_or(false);

        tracing::info!(
            destination = %destination,
            home_base = %home_base,
            matches = matches.len(),
            empty_cost = empty_return.total,
            backhaul_recommended,
            "backhaul evaluated"
        );

        Ok(BackhaulEvaluation {
            matches,
            empty_return,
            backhaul_recommended,
        })
    }

    /// Verify a load fits before committing to it
    pub fn check_capacity(&self, vehicle: &VehicleState, load: &CandidateLoad) -> Result<()> {
        load.validate()?;
        self.matcher
            .require_capacity(vehicle.available_capacity_tons(), load)
    }

    /// Accept a pending decision; `decided_by` of `"agent"` auto-accepts
    pub async fn accept_decision(
        &self,
        mission_key: &str,
        decision_id: Uuid,
        decided_by: &str,
    ) -> Result<DecisionRecord> {
        self.ledger.accept(mission_key, decision_id, decided_by).await
    }

    /// Reject a pending decision with a reason
    pub async fn reject_decision(
        &self,
        mission_key: &str,
        decision_id: Uuid,
        decided_by: &str,
        reason: &str,
    ) -> Result<DecisionRecord> {
        self.ledger
            .reject(mission_key, decision_id, decided_by, reason)
            .await
    }

    /// Expire a pending decision that was never acted on
    pub async fn expire_decision(
        &self,
        mission_key: &str,
        decision_id: Uuid,
    ) -> Result<DecisionRecord> {
        self.ledger.expire(mission_key, decision_id).await
    }

    /// Mark an accepted decision as carried out
    pub async fn execute_decision(
        &self,
        mission_key: &str,
        decision_id: Uuid,
    ) -> Result<DecisionRecord> {
        self.ledger.mark_executed(mission_key, decision_id).await
    }

    /// Decision history for one mission, oldest first
    pub async fn mission_history(&self, mission_key: &str) -> Vec<DecisionRecord> {
        self.ledger.history(mission_key).await
    }

    /// Aggregate metrics over every recorded decision
    pub async fn metrics(&self) -> AgentMetrics {
        self.ledger.metrics().await
    }

    /// Aggregate metrics over the named missions only
    pub async fn metrics_for(&self, mission_keys: &[&str]) -> AgentMetrics {
        self.ledger.metrics_for(mission_keys).await
    }

    /// Market loads near the vehicle; a market outage degrades to no loads
    async fn market_loads(&self, vehicle: &VehicleState) -> Vec<CandidateLoad> {
        match self
            .loads
            .search_loads(&vehicle.current_city, vehicle.available_capacity_tons())
            .await
        {
            Ok(loads) => loads,
            Err(err) => {
                tracing::warn!(
                    city = %vehicle.current_city,
                    error = %err,
                    "load search failed, evaluating without market loads"
                );
                Vec::new()
            }
        }
    }

    /// Call the advisory collaborator under the configured timeout
    async fn consult_advisory(&self, observation: &Observation) -> AdvisoryOutcome {
        let Some(provider) = &self.advisory else {
            return AdvisoryOutcome::Disabled;
        };

        let context = PromptContext::from_observation(observation);
        match timeout(self.config.advisory.call_timeout, provider.advise(&context)).await {
            Ok(Ok(value)) => match AdvisoryResponse::from_value(value) {
                Some(response) => AdvisoryOutcome::Received(response),
                None => AdvisoryOutcome::Failed("unparseable advisory payload".to_string()),
            },
            Ok(Err(err)) => AdvisoryOutcome::Failed(err.to_string()),
            Err(_) => AdvisoryOutcome::Failed(format!(
                "advisory call exceeded {:?}",
                self.config.advisory.call_timeout
            )),
        }
    }
}
