//! Domain state for vehicles, missions, environment and candidate loads
//!
//! These types are owned by the calling orchestration layer and passed in by
//! value once per evaluation; the engine never holds a live reference to them
//! across calls. Each carries a `validate` method that rejects out-of-range
//! values with [`EngineError::InvalidInput`] before any computation runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Current phase of a vehicle's journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyState {
    /// Vehicle is available, no mission
    Idle,
    /// Before trip, plan being generated
    Planning,
    /// At origin, loading cargo
    Loading,
    /// Actively moving
    InTransit,
    /// At a toll or border checkpoint
    AtCheckpoint,
    /// At a fuel stop
    Refueling,
    /// At destination, unloading
    Unloading,
    /// Return journey, empty or with backhaul
    Returning,
    /// Mission complete
    Completed,
}

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Vehicle class, which selects the fare rate and fuel efficiency in
/// `CostConfig::class_rates`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    /// Light commercial vehicle
    Lcv,
    /// Medium commercial vehicle
    Mcv,
    /// Heavy commercial vehicle
    Hcv,
}

/// Current state of a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleState {
    pub vehicle_id: String,
    pub registration: String,
    pub vehicle_class: VehicleClass,
    pub location: GeoPoint,
    pub current_city: String,
    pub speed_kmh: f64,
    pub fuel_percent: f64,
    pub max_capacity_tons: f64,
    pub current_load_tons: f64,
    pub driver_name: String,
    /// Hours before mandatory rest
    pub driver_hours_remaining: f64,
    pub last_update: DateTime<Utc>,
}

impl VehicleState {
    /// Spare tonnage left on the vehicle
    pub fn available_capacity_tons(&self) -> f64 {
        self.max_capacity_tons - self.current_load_tons
    }

    /// Load as a percentage of capacity
    pub fn utilization_percent(&self) -> f64 {
        if self.max_capacity_tons <= 0.0 {
            return 0.0;
        }
        (self.current_load_tons / self.max_capacity_tons) * 100.0
    }

    /// Check the capacity invariant: `0 <= current_load <= max_capacity`
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity_tons <= 0.0 {
            return Err(EngineError::invalid_input(
                "max_capacity_tons",
                format!("must be positive, got {}", self.max_capacity_tons),
            ));
        }

        if self.current_load_tons < 0.0 || self.current_load_tons > self.max_capacity_tons {
            return Err(EngineError::invalid_input(
                "current_load_tons",
                format!(
                    "must be within 0..={}, got {}",
                    self.max_capacity_tons, self.current_load_tons
                ),
            ));
        }

        if !(0.0..=100.0).contains(&self.fuel_percent) {
            return Err(EngineError::invalid_input(
                "fuel_percent",
                format!("must be within 0..=100, got {}", self.fuel_percent),
            ));
        }

        Ok(())
    }
}

/// A toll, border or inspection point along a route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    pub km: f64,
    pub kind: CheckpointKind,
}

/// Kind of checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    StateBorder,
    TollPlaza,
    Inspection,
}

/// Current state of an active mission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionState {
    pub mission_id: String,
    pub origin: String,
    pub destination: String,
    pub origin_address: String,
    pub destination_address: String,
    pub cargo_type: String,
    pub weight_tons: f64,
    pub distance_km: f64,
    pub progress_km: f64,
    pub base_fare: f64,
    pub toll_cost: f64,
    pub fuel_cost_estimated: f64,
    pub started_at: DateTime<Utc>,
    pub expected_arrival: DateTime<Utc>,
    pub checkpoints: Vec<Checkpoint>,
    /// Monotonically non-decreasing over the mission lifetime
    pub current_checkpoint_index: usize,
}

impl MissionState {
    /// Progress as a percentage of the planned distance
    pub fn progress_percent(&self) -> f64 {
        if self.distance_km <= 0.0 {
            return 0.0;
        }
        (self.progress_km / self.distance_km) * 100.0
    }

    /// Distance still to cover
    pub fn remaining_km(&self) -> f64 {
        self.distance_km - self.progress_km
    }

    /// Check the progress invariant: `0 <= progress_km <= distance_km`
    pub fn validate(&self) -> Result<()> {
        if self.distance_km <= 0.0 {
            return Err(EngineError::invalid_input(
                "distance_km",
                format!("must be positive, got {}", self.distance_km),
            ));
        }

        if self.progress_km < 0.0 || self.progress_km > self.distance_km {
            return Err(EngineError::invalid_input(
                "progress_km",
                format!(
                    "must be within 0..={}, got {}",
                    self.distance_km, self.progress_km
                ),
            ));
        }

        if self.current_checkpoint_index > self.checkpoints.len() {
            return Err(EngineError::invalid_input(
                "current_checkpoint_index",
                format!(
                    "index {} out of range for {} checkpoints",
                    self.current_checkpoint_index,
                    self.checkpoints.len()
                ),
            ));
        }

        Ok(())
    }
}

/// Immutable snapshot of external conditions, supplied per evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentState {
    /// clear, rain, fog, storm
    pub weather: String,
    /// light, moderate, heavy, blocked
    pub traffic_level: String,
    /// good, fair, poor
    pub road_condition: String,
    /// Chance of delays, 0.0 to 1.0
    pub delay_probability: f64,
    pub fuel_price: f64,
    pub toll_queue_minutes: u32,
    pub border_delay_minutes: u32,
    pub festival_season: bool,
    pub strike_alert: bool,
    /// good, poor, offline
    pub connectivity_status: String,
}

impl EnvironmentState {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.delay_probability) {
            return Err(EngineError::invalid_input(
                "delay_probability",
                format!("must be within 0..=1, got {}", self.delay_probability),
            ));
        }
        Ok(())
    }
}

/// A load offered on the market, candidate for pooling or backhaul
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateLoad {
    pub load_id: String,
    pub shipper: String,
    pub cargo_type: String,
    pub weight_tons: f64,
    pub pickup_city: String,
    pub delivery_city: String,
    pub offered_rate: f64,
    pub pickup_window: String,
    /// Extra distance to service this load; estimated by the matcher if absent
    pub detour_km: Option<f64>,
}

impl CandidateLoad {
    pub fn validate(&self) -> Result<()> {
        if self.weight_tons <= 0.0 {
            return Err(EngineError::invalid_input(
                "weight_tons",
                format!("must be positive, got {}", self.weight_tons),
            ));
        }

        if self.offered_rate < 0.0 {
            return Err(EngineError::invalid_input(
                "offered_rate",
                format!("must not be negative, got {}", self.offered_rate),
            ));
        }

        Ok(())
    }
}
