//! Configuration types for the dispatch engine
//!
//! Every rate, threshold and discount the engine uses lives here as a named
//! field with the production defaults. Nothing in the engine reads ambient
//! state; callers construct an [`EngineConfig`] (or take the default) and
//! hand it to the engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::state::VehicleClass;

/// Main configuration for the dispatch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fare and fuel cost parameters
    pub cost: CostConfig,

    /// Risk scoring and ETA parameters
    pub risk: RiskConfig,

    /// Capacity matcher parameters
    pub matcher: MatcherConfig,

    /// Advisory collaborator parameters
    pub advisory: AdvisoryConfig,

    /// Alert and reasoning thresholds
    pub thresholds: ThresholdConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cost: CostConfig::default(),
            risk: RiskConfig::default(),
            matcher: MatcherConfig::default(),
            advisory: AdvisoryConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.cost.validate()?;
        self.risk.validate()?;
        self.matcher.validate()?;
        self.advisory.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }
}

/// Configuration for the cost model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Diesel price per liter
    pub fuel_price_per_liter: f64,

    /// Driver cost per hour
    pub driver_cost_per_hour: f64,

    /// Fraction of the fuel estimate billed as a surcharge on the fare
    pub fuel_surcharge_fraction: f64,

    /// Effort added per checkpoint on the route
    pub checkpoint_effort_factor: f64,

    /// Toll discount applied to empty (unladen) return trips
    pub empty_toll_discount: f64,

    /// Maintenance reserve per km, counted into dead-mile cost
    pub wear_cost_per_km: f64,

    /// Average cruising speed used for dead-mile driver time
    pub avg_speed_kmh: f64,

    /// Maximum accepted cargo weight
    pub max_weight_tons: f64,

    /// Per-class base fare rates and fuel efficiency
    pub class_rates: VehicleClassRates,
}

/// Fare rate and fuel efficiency for one vehicle class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRate {
    pub base_rate_per_km: f64,
    pub efficiency_kmpl: f64,
}

/// Rate table keyed by vehicle class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleClassRates {
    pub lcv: ClassRate,
    pub mcv: ClassRate,
    pub hcv: ClassRate,
}

impl VehicleClassRates {
    pub fn rate(&self, class: VehicleClass) -> &ClassRate {
        match class {
            VehicleClass::Lcv => &self.lcv,
            VehicleClass::Mcv => &self.mcv,
            VehicleClass::Hcv => &self.hcv,
        }
    }
}

impl Default for VehicleClassRates {
    fn default() -> Self {
        Self {
            lcv: ClassRate {
                base_rate_per_km: 30.0,
                efficiency_kmpl: 8.0,
            },
            mcv: ClassRate {
                base_rate_per_km: 42.0,
                efficiency_kmpl: 5.5,
            },
            hcv: ClassRate {
                base_rate_per_km: 55.0,
                efficiency_kmpl: 3.5,
            },
        }
    }
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fuel_price_per_liter: 90.0,
            driver_cost_per_hour: 150.0,
            fuel_surcharge_fraction: 0.3,
            checkpoint_effort_factor: 0.03,
            empty_toll_discount: 0.6,
            wear_cost_per_km: 2.0,
            avg_speed_kmh: 50.0,
            max_weight_tons: 50.0,
            class_rates: VehicleClassRates::default(),
        }
    }
}

impl CostConfig {
    fn validate(&self) -> Result<(), String> {
        if self.fuel_price_per_liter <= 0.0 {
            return Err("fuel_price_per_liter must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.fuel_surcharge_fraction) {
            return Err("fuel_surcharge_fraction must be between 0.0 and 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.empty_toll_discount) {
            return Err("empty_toll_discount must be between 0.0 and 1.0".to_string());
        }

        if self.avg_speed_kmh <= 0.0 {
            return Err("avg_speed_kmh must be greater than 0".to_string());
        }

        if self.max_weight_tons <= 0.0 {
            return Err("max_weight_tons must be greater than 0".to_string());
        }

        for class in [VehicleClass::Lcv, VehicleClass::Mcv, VehicleClass::Hcv] {
            let rate = self.class_rates.rate(class);
            if rate.base_rate_per_km <= 0.0 || rate.efficiency_kmpl <= 0.0 {
                return Err(format!(
                    "class rates for {class:?} must be greater than 0"
                ));
            }
        }

        Ok(())
    }
}

/// Configuration for risk scoring and ETA estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// ETA multiplier when everything goes right
    pub eta_optimistic_factor: f64,

    /// ETA multiplier under typical delays
    pub eta_expected_factor: f64,

    /// ETA multiplier when delays compound
    pub eta_pessimistic_factor: f64,

    /// Risk score below which a route is considered low risk
    pub low_risk_below: u32,

    /// Risk score below which a route is considered medium risk
    pub medium_risk_below: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            eta_optimistic_factor: 0.9,
            eta_expected_factor: 1.15,
            eta_pessimistic_factor: 1.5,
            low_risk_below: 25,
            medium_risk_below: 50,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), String> {
        if self.eta_optimistic_factor > self.eta_expected_factor
            || self.eta_expected_factor > self.eta_pessimistic_factor
        {
            return Err(
                "eta factors must satisfy optimistic <= expected <= pessimistic".to_string(),
            );
        }

        if self.low_risk_below >= self.medium_risk_below {
            return Err("low_risk_below must be less than medium_risk_below".to_string());
        }

        Ok(())
    }
}

/// Configuration for the capacity matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Minimum net benefit for a load to be worth ranking at all
    pub min_profit_threshold: f64,

    /// Round-trip fuel cost per detour km
    pub fuel_cost_per_detour_km: f64,

    /// Average speed assumed on detours
    pub detour_speed_kmh: f64,

    /// Driver time cost per detour hour
    pub detour_driver_cost_per_hour: f64,

    /// Detour distance assumed when the load does not carry one
    pub default_detour_km: f64,

    /// Maximum acceptable detour for pooled loads
    pub max_detour_km: f64,

    /// Score bonus for backhauls delivering directly to the home base
    pub direct_backhaul_bonus: f64,

    /// Score at or above which a match is highly recommended
    pub highly_recommended_score: f64,

    /// Score at or above which a match is recommended
    pub recommended_score: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_profit_threshold: 500.0,
            fuel_cost_per_detour_km: 16.0,
            detour_speed_kmh: 40.0,
            detour_driver_cost_per_hour: 150.0,
            default_detour_km: 20.0,
            max_detour_km: 30.0,
            direct_backhaul_bonus: 10.0,
            highly_recommended_score: 70.0,
            recommended_score: 50.0,
        }
    }
}

impl MatcherConfig {
    fn validate(&self) -> Result<(), String> {
        if self.detour_speed_kmh <= 0.0 {
            return Err("detour_speed_kmh must be greater than 0".to_string());
        }

        if self.max_detour_km <= 0.0 {
            return Err("max_detour_km must be greater than 0".to_string());
        }

        if self.recommended_score > self.highly_recommended_score {
            return Err(
                "recommended_score must not exceed highly_recommended_score".to_string(),
            );
        }

        Ok(())
    }
}

/// Configuration for the advisory collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Hard timeout for a single advisory call
    pub call_timeout: Duration,

    /// Confidence penalty applied when the advisory call fails or times out
    pub failure_confidence_penalty: f64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            failure_confidence_penalty: 0.1,
        }
    }
}

impl AdvisoryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.call_timeout.is_zero() {
            return Err("call_timeout must be greater than 0".to_string());
        }

        if !(0.0..=1.0).contains(&self.failure_confidence_penalty) {
            return Err("failure_confidence_penalty must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}

/// Alert and reasoning thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Fuel percentage below which a low-fuel alert is raised
    pub fuel_alert_percent: f64,

    /// Fuel percentage below which refuelling becomes a hard constraint
    pub fuel_constraint_percent: f64,

    /// Range within which the refuel constraint must be satisfied
    pub refuel_within_km: f64,

    /// Remaining driver hours below which rest becomes mandatory
    pub driver_rest_threshold_hours: f64,

    /// Spare tonnage above which pooling opportunities are raised
    pub spare_capacity_tons: f64,

    /// Mission progress (percent) past which backhaul search is triggered
    pub backhaul_progress_percent: f64,

    /// Match score above which an available load is flagged as notable
    pub notable_match_score: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            fuel_alert_percent: 25.0,
            fuel_constraint_percent: 30.0,
            refuel_within_km: 100.0,
            driver_rest_threshold_hours: 2.0,
            spare_capacity_tons: 5.0,
            backhaul_progress_percent: 70.0,
            notable_match_score: 80.0,
        }
    }
}

impl ThresholdConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.fuel_alert_percent) {
            return Err("fuel_alert_percent must be between 0 and 100".to_string());
        }

        if !(0.0..=100.0).contains(&self.fuel_constraint_percent) {
            return Err("fuel_constraint_percent must be between 0 and 100".to_string());
        }

        if !(0.0..=100.0).contains(&self.backhaul_progress_percent) {
            return Err("backhaul_progress_percent must be between 0 and 100".to_string());
        }

        if self.driver_rest_threshold_hours < 0.0 {
            return Err("driver_rest_threshold_hours must not be negative".to_string());
        }

        Ok(())
    }
}
