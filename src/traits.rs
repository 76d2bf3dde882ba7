//! Collaborator traits for routing, load markets and advisory input
//!
//! The engine never talks to the outside world directly; callers inject
//! implementations of these traits. Tests use in-memory fakes, production
//! wires real services behind them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::observation::Observation;
use crate::risk::RiskLevel;
use crate::state::{CandidateLoad, Checkpoint};

/// A planned route between two cities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    /// Undelayed driving time
    pub duration_hours: f64,
    pub highways: Vec<String>,
    pub toll_cost: f64,
    pub checkpoints: Vec<Checkpoint>,
    pub fuel_stops: Vec<String>,
    /// True when derived from distance tables rather than live routing
    pub is_estimated: bool,
    pub risk_level: RiskLevel,
}

/// Supplies routes between cities
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn get_route(&self, origin: &str, destination: &str) -> Result<Route>;
}

/// Supplies candidate loads from the market
#[async_trait]
pub trait LoadDirectory: Send + Sync {
    /// Loads available for pooling near a city, up to the given weight
    async fn search_loads(
        &self,
        near_city: &str,
        max_weight_tons: f64,
    ) -> Result<Vec<CandidateLoad>>;

    /// Loads for the return journey between two cities
    async fn search_backhaul(
        &self,
        from_city: &str,
        to_city: &str,
    ) -> Result<Vec<CandidateLoad>>;
}

/// Structured context handed to the advisory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    pub journey_state: String,
    pub fuel_percent: f64,
    pub driver_hours_remaining: f64,
    pub mission_progress_percent: Option<f64>,
    pub available_load_count: usize,
    pub alerts: Vec<String>,
    pub weather: String,
    pub traffic_level: String,
}

impl PromptContext {
    pub fn from_observation(observation: &Observation) -> Self {
        Self {
            journey_state: format!("{:?}", observation.journey_state),
            fuel_percent: observation.vehicle.fuel_percent,
            driver_hours_remaining: observation.vehicle.driver_hours_remaining,
            mission_progress_percent: observation
                .mission
                .as_ref()
                .map(|m| m.progress_percent()),
            available_load_count: observation.available_loads.len(),
            alerts: observation.alerts.clone(),
            weather: observation.environment.weather.clone(),
            traffic_level: observation.environment.traffic_level.clone(),
        }
    }
}

/// Optional second opinion on the current situation
///
/// The payload is free-form JSON; the reasoning step parses it leniently and
/// falls back to heuristics when it cannot.
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    async fn advise(&self, context: &PromptContext) -> Result<serde_json::Value>;
}
