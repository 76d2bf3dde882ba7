//! Capacity matching for LTL pooling and backhaul loads
//!
//! Every candidate is scored against the vehicle's spare tonnage and the
//! detour budget. Loads that do not fit or cannot clear the minimum profit
//! threshold are excluded from the ranked list entirely, not down-ranked.
//! Ordering is deterministic: match score, then net benefit, then the
//! shorter detour.

use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::error::{EngineError, Result};
use crate::state::CandidateLoad;

/// How strongly a match is recommended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    HighlyRecommended,
    Recommended,
    Marginal,
}

/// A scored candidate load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub load: CandidateLoad,
    pub detour_km: f64,
    pub detour_minutes: f64,
    pub fuel_cost: f64,
    pub time_cost: f64,
    /// `offered_rate - fuel_cost - time_cost`, exactly
    pub net_benefit: f64,
    /// 0..=100
    pub match_score: f64,
    pub tier: RecommendationTier,
}

/// Summary of what pooling the ranked loads would do to utilization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolingSummary {
    pub available_capacity_tons: f64,
    pub utilization_before_percent: f64,
    /// Utilization if the best-ranked load were added
    pub utilization_after_best_percent: f64,
    pub loads_found: usize,
    pub total_potential_revenue: f64,
}

/// Scores and ranks candidate loads against available capacity
#[derive(Debug, Clone)]
pub struct CapacityMatcher {
    config: MatcherConfig,
}

impl CapacityMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Score a single load, without the capacity or profit filters
    fn score(&self, load: &CandidateLoad, bonus: f64) -> MatchResult {
        let detour_km = load.detour_km.unwrap_or(self.config.default_detour_km);
        let detour_hours = detour_km / self.config.detour_speed_kmh;

        let fuel_cost = detour_km * self.config.fuel_cost_per_detour_km;
        let time_cost = detour_hours * self.config.detour_driver_cost_per_hour;
        let net_benefit = load.offered_rate - fuel_cost - time_cost;

        let raw_score = 50.0 + net_benefit / 100.0 - detour_km * 2.0 + bonus;
        let match_score = raw_score.clamp(0.0, 100.0);

        let tier = if match_score >= self.config.highly_recommended_score {
            RecommendationTier::HighlyRecommended
        } else if match_score >= self.config.recommended_score {
            RecommendationTier::Recommended
        } else {
            RecommendationTier::Marginal
        };

        MatchResult {
            load: load.clone(),
            detour_km,
            detour_minutes: detour_hours * 60.0,
            fuel_cost,
            time_cost,
            net_benefit,
            match_score,
            tier,
        }
    }

    /// Rank loads that fit the spare capacity and clear the profit threshold
    ///
    /// The returned list never contains a load heavier than
    /// `available_capacity_tons`.
    pub fn rank_ltl(
        &self,
        available_capacity_tons: f64,
        loads: &[CandidateLoad],
    ) -> Vec<MatchResult> {
        let mut matches: Vec<MatchResult> = loads
            .iter()
            .filter(|load| load.weight_tons <= available_capacity_tons)
            .map(|load| self.score(load, 0.0))
            .filter(|result| result.detour_km <= self.config.max_detour_km)
            .filter(|result| result.net_benefit > self.config.min_profit_threshold)
            .collect();

        sort_matches(&mut matches);
        tracing::debug!(
            candidates = loads.len(),
            ranked = matches.len(),
            available_tons = available_capacity_tons,
            "ranked pooling candidates"
        );
        matches
    }

    /// Rank backhaul loads for the return journey
    ///
    /// Only loads picked up at the mission destination qualify. Loads that
    /// also deliver to the home base score a fixed bonus over pickup-only
    /// matches.
    pub fn rank_backhaul(
        &self,
        available_capacity_tons: f64,
        destination: &str,
        home_base: &str,
        loads: &[CandidateLoad],
    ) -> Vec<MatchResult> {
        let mut matches: Vec<MatchResult> = loads
            .iter()
            .filter(|load| load.weight_tons <= available_capacity_tons)
            .filter(|load| load.pickup_city.eq_ignore_ascii_case(destination))
            .map(|load| {
                let bonus = if load.delivery_city.eq_ignore_ascii_case(home_base) {
                    self.config.direct_backhaul_bonus
                } else {
                    0.0
                };
                self.score(load, bonus)
            })
            .filter(|result| result.net_benefit > self.config.min_profit_threshold)
            .collect();

        sort_matches(&mut matches);
        matches
    }

    /// Summarize the utilization effect of the ranked loads
    pub fn pooling_summary(
        &self,
        max_capacity_tons: f64,
        current_load_tons: f64,
        matches: &[MatchResult],
    ) -> PoolingSummary {
        let available = max_capacity_tons - current_load_tons;
        let before = if max_capacity_tons > 0.0 {
            (current_load_tons / max_capacity_tons) * 100.0
        } else {
            0.0
        };

        let after_best = matches
            .first()
            .map(|best| {
                (((current_load_tons + best.load.weight_tons) / max_capacity_tons) * 100.0)
                    .min(100.0)
            })
            .unwrap_or(before);

        PoolingSummary {
            available_capacity_tons: available,
            utilization_before_percent: before,
            utilization_after_best_percent: after_best,
            loads_found: matches.len(),
            total_potential_revenue: matches.iter().map(|m| m.load.offered_rate).sum(),
        }
    }

    /// Check that a load fits the spare capacity, for the explicit accept path
    ///
    /// Unlike ranking, which silently filters, this surfaces the numeric
    /// shortfall as [`EngineError::InsufficientCapacity`].
    pub fn require_capacity(
        &self,
        available_capacity_tons: f64,
        load: &CandidateLoad,
    ) -> Result<()> {
        if load.weight_tons > available_capacity_tons {
            return Err(EngineError::insufficient_capacity(
                load.weight_tons,
                available_capacity_tons,
            ));
        }
        Ok(())
    }
}

/// Deterministic ordering: score desc, net benefit desc, detour asc
fn sort_matches(matches: &mut [MatchResult]) {
    matches.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then(b.net_benefit.total_cmp(&a.net_benefit))
            .then(a.detour_km.total_cmp(&b.detour_km))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CapacityMatcher {
        CapacityMatcher::new(MatcherConfig::default())
    }

    fn load(id: &str, weight: f64, rate: f64, detour: f64) -> CandidateLoad {
        CandidateLoad {
            load_id: id.to_string(),
            shipper: "Shipper".to_string(),
            cargo_type: "general".to_string(),
            weight_tons: weight,
            pickup_city: "Mumbai".to_string(),
            delivery_city: "Delhi".to_string(),
            offered_rate: rate,
            pickup_window: "Flexible".to_string(),
            detour_km: Some(detour),
        }
    }

    #[test]
    fn test_overweight_load_excluded_entirely() {
        let loads = vec![load("a", 6.0, 20000.0, 5.0)];
        let matches = matcher().rank_ltl(5.0, &loads);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_net_benefit_identity() {
        let loads = vec![load("a", 3.0, 9000.0, 10.0)];
        let matches = matcher().rank_ltl(5.0, &loads);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.net_benefit, m.load.offered_rate - m.fuel_cost - m.time_cost);
    }

    #[test]
    fn test_detour_beyond_budget_excluded() {
        let loads = vec![load("far", 3.0, 50000.0, 45.0)];
        assert!(matcher().rank_ltl(10.0, &loads).is_empty());
    }

    #[test]
    fn test_unprofitable_load_excluded() {
        // 10 km detour costs 160 fuel + 37.5 time; 600 rate nets ~402 < 500
        let loads = vec![load("thin", 3.0, 600.0, 10.0)];
        assert!(matcher().rank_ltl(10.0, &loads).is_empty());

        // Exactly at the threshold is still excluded
        let mut at_threshold = load("edge", 3.0, 0.0, 10.0);
        at_threshold.offered_rate = 500.0 + 160.0 + 37.5;
        assert!(matcher().rank_ltl(10.0, &[at_threshold]).is_empty());
    }

    #[test]
    fn test_tie_broken_by_lower_detour() {
        // Same net benefit, different detours. Equalize rates so that
        // net_benefit comes out identical, then the score differs by detour
        // and A must rank first either way.
        let a = load("a", 3.0, 3000.0 + 10.0 * 16.0 + (10.0 / 40.0) * 150.0, 10.0);
        let b = load("b", 3.0, 3000.0 + 25.0 * 16.0 + (25.0 / 40.0) * 150.0, 25.0);
        let matches = matcher().rank_ltl(10.0, &[b, a]);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].load.load_id, "a");
        assert_eq!(matches[0].net_benefit, matches[1].net_benefit);
    }

    #[test]
    fn test_score_formula_and_tiers() {
        // net = 5000 - 5*16 - (5/40)*150 = 4901.25; score = 50 + 49.0125 - 10 = 89.0125
        let loads = vec![load("hot", 3.0, 5000.0, 5.0)];
        let matches = matcher().rank_ltl(10.0, &loads);
        let m = &matches[0];
        assert!((m.match_score - 89.0125).abs() < 1e-9);
        assert_eq!(m.tier, RecommendationTier::HighlyRecommended);
    }

    #[test]
    fn test_score_clamped() {
        let loads = vec![load("huge", 3.0, 1_000_000.0, 1.0)];
        let matches = matcher().rank_ltl(10.0, &loads);
        assert_eq!(matches[0].match_score, 100.0);
    }

    #[test]
    fn test_backhaul_requires_pickup_at_destination() {
        let mut good = load("good", 10.0, 40000.0, 5.0);
        good.pickup_city = "Mumbai".to_string();
        good.delivery_city = "Delhi".to_string();

        let mut wrong_city = load("wrong", 10.0, 40000.0, 5.0);
        wrong_city.pickup_city = "Pune".to_string();

        let matches = matcher().rank_backhaul(20.0, "Mumbai", "Delhi", &[good, wrong_city]);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].load.load_id, "good");
    }

    #[test]
    fn test_direct_backhaul_outranks_partial() {
        let mut direct = load("direct", 10.0, 30000.0, 10.0);
        direct.delivery_city = "Delhi".to_string();

        let mut partial = load("partial", 10.0, 30000.0, 10.0);
        partial.delivery_city = "Jaipur".to_string();

        let matches = matcher().rank_backhaul(20.0, "Mumbai", "Delhi", &[partial, direct]);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].load.load_id, "direct");
        assert!((matches[0].match_score - matches[1].match_score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_require_capacity_reports_shortfall() {
        let heavy = load("heavy", 6.0, 20000.0, 5.0);
        let err = matcher().require_capacity(5.0, &heavy).unwrap_err();
        match err {
            EngineError::InsufficientCapacity {
                required_tons,
                available_tons,
            } => {
                assert_eq!(required_tons, 6.0);
                assert_eq!(available_tons, 5.0);
            }
            other => panic!("expected InsufficientCapacity, got {other:?}"),
        }
    }

    #[test]
    fn test_pooling_summary() {
        let loads = vec![load("a", 5.0, 9000.0, 10.0)];
        let m = matcher();
        let matches = m.rank_ltl(7.0, &loads);
        let summary = m.pooling_summary(25.0, 18.0, &matches);

        assert_eq!(summary.available_capacity_tons, 7.0);
        assert_eq!(summary.utilization_before_percent, 72.0);
        assert_eq!(summary.utilization_after_best_percent, 92.0);
        assert_eq!(summary.loads_found, 1);
        assert_eq!(summary.total_potential_revenue, 9000.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ranked_loads_always_fit(
                capacity in 1.0f64..25.0,
                weights in proptest::collection::vec(0.5f64..30.0, 1..8),
            ) {
                let loads: Vec<CandidateLoad> = weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| load(&format!("l{i}"), *w, 50000.0, 5.0))
                    .collect();

                let matches = matcher().rank_ltl(capacity, &loads);
                for m in &matches {
                    prop_assert!(m.load.weight_tons <= capacity);
                }
            }

            #[test]
            fn ranking_is_ordered(
                rates in proptest::collection::vec(1000.0f64..80000.0, 2..10),
                detours in proptest::collection::vec(1.0f64..30.0, 2..10),
            ) {
                let n = rates.len().min(detours.len());
                let loads: Vec<CandidateLoad> = (0..n)
                    .map(|i| load(&format!("l{i}"), 2.0, rates[i], detours[i]))
                    .collect();

                let matches = matcher().rank_ltl(10.0, &loads);
                for pair in matches.windows(2) {
                    prop_assert!(pair[0].match_score >= pair[1].match_score);
                    prop_assert!(pair[0].net_benefit > matcher().config.min_profit_threshold);
                }
            }
        }
    }
}
