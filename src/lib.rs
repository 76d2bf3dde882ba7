//! Freight dispatch decision and matching engine
//!
//! Runs the observe / reason / decide loop for long-haul trucking missions:
//! snapshots vehicle, mission and environment state, derives constraints and
//! opportunities, optionally consults an advisory collaborator under a hard
//! timeout, and emits exactly one prioritized decision per cycle into a
//! per-mission ledger.
//!
//! Alongside the loop it provides mission planning (fare, risk score and a
//! three-point ETA range) and capacity matching for LTL pooling and backhaul
//! loads.
//!
//! External concerns (routing, load markets, advisory) are injected through
//! the traits in [`traits`]; everything else is deterministic and
//! config-driven.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dispatch_engine::{DispatchEngine, EngineConfig};
//! # use dispatch_engine::traits::{LoadDirectory, RouteProvider};
//! # fn collaborators() -> (Arc<dyn RouteProvider>, Arc<dyn LoadDirectory>) { unimplemented!() }
//!
//! # fn main() -> dispatch_engine::Result<()> {
//! let (routes, loads) = collaborators();
//! let engine = DispatchEngine::new(EngineConfig::default(), routes, loads, None)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod cost;
pub mod decision;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod observation;
pub mod reasoning;
pub mod risk;
pub mod state;
pub mod traits;

pub use config::EngineConfig;
pub use decision::{Decision, DecisionType, Priority};
pub use engine::{DispatchEngine, EvaluationOutcome, MissionPlan, MissionPlanRequest};
pub use error::{EngineError, Result};
pub use ledger::{AgentMetrics, DecisionLedger, DecisionRecord, DecisionStatus};
pub use matcher::{CapacityMatcher, MatchResult, RecommendationTier};
pub use observation::Observation;
pub use reasoning::{Reasoning, ReasoningCombiner};
pub use risk::{RiskAssessment, RiskEstimator, RiskLevel};
pub use state::{
    CandidateLoad, EnvironmentState, JourneyState, MissionState, VehicleClass, VehicleState,
};
