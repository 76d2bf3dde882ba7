//! Effort-based fare and fuel cost model
//!
//! Pure computation: every function here derives its output from the request
//! and the [`CostConfig`] alone. The fare is effort-based rather than flat
//! per-km, so weight tiers, checkpoints, cargo sensitivity and corridor risk
//! all feed the multiplier. Total fare is monotonically non-decreasing in
//! weight, distance and checkpoint count.

use serde::{Deserialize, Serialize};

use crate::config::CostConfig;
use crate::error::{EngineError, Result};
use crate::risk::RiskLevel;
use crate::state::VehicleClass;

/// Inputs to a fare computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareRequest {
    pub distance_km: f64,
    pub weight_tons: f64,
    pub cargo_type: String,
    pub checkpoint_count: usize,
    pub toll_cost: f64,
    pub vehicle_class: VehicleClass,
    /// Undelayed driving time, used for the driver allowance
    pub base_hours: f64,
    /// Corridor risk level supplied by the route
    pub route_risk: RiskLevel,
}

/// Itemized fare for a mission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareBreakdown {
    /// Flat distance * rate fare before effort adjustment
    pub base_fare: f64,
    pub effort_multiplier: f64,
    /// Base fare scaled by effort
    pub adjusted_base: f64,
    pub toll_cost: f64,
    /// Full fuel estimate for the leg
    pub fuel_estimate: f64,
    pub driver_allowance: f64,
    /// `adjusted_base + toll_cost + fuel_estimate * surcharge_fraction`
    pub total_fare: f64,
    pub per_km_rate: f64,
}

/// Cost of driving a leg empty (dead miles)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmptyReturnCost {
    pub distance_km: f64,
    pub fuel_cost: f64,
    pub driver_cost: f64,
    pub wear_cost: f64,
    /// Tolls scaled by the empty-vehicle discount
    pub toll_cost: f64,
    pub total: f64,
    pub per_km: f64,
}

/// Effort added by the cargo type
pub fn cargo_effort_factor(cargo_type: &str) -> f64 {
    match cargo_type.to_ascii_lowercase().as_str() {
        "hazmat" => 0.25,
        "chemicals" => 0.20,
        "perishable" | "perishables" => 0.15,
        "fragile" => 0.12,
        "pharmaceuticals" => 0.12,
        "electronics" => 0.08,
        "steel" => 0.05,
        "cement" => 0.03,
        "general" => 0.0,
        _ => 0.05,
    }
}

/// Effort added by cargo weight
pub fn weight_tier_bonus(weight_tons: f64) -> f64 {
    if weight_tons > 20.0 {
        0.15
    } else if weight_tons > 15.0 {
        0.10
    } else if weight_tons > 10.0 {
        0.05
    } else {
        0.0
    }
}

/// Effort-based fare and dead-mile cost calculator
#[derive(Debug, Clone)]
pub struct CostModel {
    config: CostConfig,
}

impl CostModel {
    pub fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Combined effort multiplier for a request
    pub fn effort_multiplier(&self, request: &FareRequest) -> f64 {
        1.0 + weight_tier_bonus(request.weight_tons)
            + request.checkpoint_count as f64 * self.config.checkpoint_effort_factor
            + cargo_effort_factor(&request.cargo_type)
            + request.route_risk.effort_factor()
    }

    /// Compute the itemized fare for a mission leg
    ///
    /// Rejects non-positive distance or weight, and weight beyond the
    /// configured maximum, before any computation.
    pub fn fare(&self, request: &FareRequest) -> Result<FareBreakdown> {
        if request.distance_km <= 0.0 {
            return Err(EngineError::invalid_input(
                "distance_km",
                format!("must be positive, got {}", request.distance_km),
            ));
        }

        if request.weight_tons <= 0.0 {
            return Err(EngineError::invalid_input(
                "weight_tons",
                format!("must be positive, got {}", request.weight_tons),
            ));
        }

        if request.weight_tons > self.config.max_weight_tons {
            return Err(EngineError::invalid_input(
                "weight_tons",
                format!(
                    "must not exceed {}, got {}",
                    self.config.max_weight_tons, request.weight_tons
                ),
            ));
        }

        if request.toll_cost < 0.0 {
            return Err(EngineError::invalid_input(
                "toll_cost",
                format!("must not be negative, got {}", request.toll_cost),
            ));
        }

        let class_rate = self.config.class_rates.rate(request.vehicle_class);
        let base_fare = request.distance_km * class_rate.base_rate_per_km;
        let effort_multiplier = self.effort_multiplier(request);
        let adjusted_base = base_fare * effort_multiplier;

        let fuel_estimate =
            (request.distance_km / class_rate.efficiency_kmpl) * self.config.fuel_price_per_liter;
        let driver_allowance = request.base_hours * self.config.driver_cost_per_hour;

        let total_fare = adjusted_base
            + request.toll_cost
            + fuel_estimate * self.config.fuel_surcharge_fraction;

        Ok(FareBreakdown {
            base_fare,
            effort_multiplier,
            adjusted_base,
            toll_cost: request.toll_cost,
            fuel_estimate,
            driver_allowance,
            total_fare,
            per_km_rate: total_fare / request.distance_km,
        })
    }

    /// Cost of driving a leg with no revenue cargo
    pub fn empty_return_cost(
        &self,
        distance_km: f64,
        toll_cost: f64,
        vehicle_class: VehicleClass,
    ) -> EmptyReturnCost {
        let efficiency = self.config.class_rates.rate(vehicle_class).efficiency_kmpl;
        let fuel_cost = (distance_km / efficiency) * self.config.fuel_price_per_liter;
        let driver_cost =
            (distance_km / self.config.avg_speed_kmh) * self.config.driver_cost_per_hour;
        let wear_cost = distance_km * self.config.wear_cost_per_km;
        let discounted_toll = toll_cost * self.config.empty_toll_discount;

        let total = fuel_cost + driver_cost + wear_cost + discounted_toll;

        EmptyReturnCost {
            distance_km,
            fuel_cost,
            driver_cost,
            wear_cost,
            toll_cost: discounted_toll,
            total,
            per_km: total / distance_km.max(1.0),
        }
    }
}
