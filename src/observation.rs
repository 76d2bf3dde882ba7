//! Observation snapshots for the decision loop
//!
//! `observe` is the first step of every evaluation cycle. It copies the
//! caller-supplied state into an immutable [`Observation`] and derives alert
//! strings. Alerts are advisory text only; nothing here mutates state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ThresholdConfig;
use crate::state::{CandidateLoad, EnvironmentState, JourneyState, MissionState, VehicleState};

/// Complete snapshot of vehicle, mission, environment and market inputs
///
/// Created once per evaluation cycle and owned exclusively by the reasoning
/// step that consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub journey_state: JourneyState,
    pub vehicle: VehicleState,
    pub mission: Option<MissionState>,
    pub environment: EnvironmentState,
    pub available_loads: Vec<CandidateLoad>,
    pub alerts: Vec<String>,
}

/// Build an [`Observation`] from the current inputs
pub fn observe(
    thresholds: &ThresholdConfig,
    journey_state: JourneyState,
    vehicle: VehicleState,
    mission: Option<MissionState>,
    environment: EnvironmentState,
    available_loads: Vec<CandidateLoad>,
) -> Observation {
    let mut alerts = Vec::new();

    if vehicle.fuel_percent < thresholds.fuel_alert_percent {
        alerts.push(format!("Low fuel: {:.0}%", vehicle.fuel_percent));
    }

    if vehicle.driver_hours_remaining < thresholds.driver_rest_threshold_hours {
        alerts.push(format!(
            "Driver rest needed in {:.1}h",
            vehicle.driver_hours_remaining
        ));
    }

    if environment.traffic_level == "heavy" {
        alerts.push("Heavy traffic ahead".to_string());
    }

    if matches!(environment.weather.as_str(), "storm" | "fog") {
        alerts.push(format!("Adverse weather: {}", environment.weather));
    }

    if environment.strike_alert {
        alerts.push("Strike alert in region".to_string());
    }

    Observation {
        timestamp: Utc::now(),
        journey_state,
        vehicle,
        mission,
        environment,
        available_loads,
        alerts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{GeoPoint, VehicleClass};

    fn vehicle(fuel_percent: f64, hours_remaining: f64) -> VehicleState {
        VehicleState {
            vehicle_id: "veh-001".to_string(),
            registration: "MH-04-AB-1234".to_string(),
            vehicle_class: VehicleClass::Hcv,
            location: GeoPoint { lat: 19.076, lng: 72.8777 },
            current_city: "Mumbai".to_string(),
            speed_kmh: 55.0,
            fuel_percent,
            max_capacity_tons: 25.0,
            current_load_tons: 12.0,
            driver_name: "Ramesh".to_string(),
            driver_hours_remaining: hours_remaining,
            last_update: Utc::now(),
        }
    }

    fn environment() -> EnvironmentState {
        EnvironmentState {
            weather: "clear".to_string(),
            traffic_level: "moderate".to_string(),
            road_condition: "good".to_string(),
            delay_probability: 0.15,
            fuel_price: 90.0,
            toll_queue_minutes: 5,
            border_delay_minutes: 0,
            festival_season: false,
            strike_alert: false,
            connectivity_status: "good".to_string(),
        }
    }

    #[test]
    fn test_no_alerts_on_nominal_state() {
        let obs = observe(
            &ThresholdConfig::default(),
            JourneyState::InTransit,
            vehicle(70.0, 6.0),
            None,
            environment(),
            Vec::new(),
        );
        assert!(obs.alerts.is_empty());
    }

    #[test]
    fn test_low_fuel_and_rest_alerts() {
        let obs = observe(
            &ThresholdConfig::default(),
            JourneyState::InTransit,
            vehicle(20.0, 1.5),
            None,
            environment(),
            Vec::new(),
        );
        assert_eq!(obs.alerts.len(), 2);
        assert!(obs.alerts[0].contains("Low fuel"));
        assert!(obs.alerts[1].contains("rest"));
    }

    #[test]
    fn test_environment_alerts() {
        let mut env = environment();
        env.traffic_level = "heavy".to_string();
        env.weather = "fog".to_string();
        env.strike_alert = true;

        let obs = observe(
            &ThresholdConfig::default(),
            JourneyState::InTransit,
            vehicle(70.0, 6.0),
            None,
            env,
            Vec::new(),
        );
        assert_eq!(obs.alerts.len(), 3);
        assert!(obs.alerts.iter().any(|a| a.contains("fog")));
    }

    #[test]
    fn test_inputs_are_kept_verbatim() {
        let loads = vec![CandidateLoad {
            load_id: "ltl-001".to_string(),
            shipper: "ABC Electronics".to_string(),
            cargo_type: "electronics".to_string(),
            weight_tons: 2.5,
            pickup_city: "Mumbai".to_string(),
            delivery_city: "Pune".to_string(),
            offered_rate: 8000.0,
            pickup_window: "Flexible".to_string(),
            detour_km: Some(12.0),
        }];

        let obs = observe(
            &ThresholdConfig::default(),
            JourneyState::InTransit,
            vehicle(70.0, 6.0),
            None,
            environment(),
            loads,
        );
        assert_eq!(obs.available_loads.len(), 1);
        assert_eq!(obs.available_loads[0].load_id, "ltl-001");
        assert_eq!(obs.journey_state, JourneyState::InTransit);
    }
}
