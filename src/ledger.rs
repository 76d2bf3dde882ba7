//! Decision ledger and lifecycle state machine
//!
//! Every decision the engine emits is recorded here as pending and then moved
//! through its lifecycle exactly once. Histories are kept per mission behind
//! a per-mission lock, so concurrent transitions on the same mission
//! serialize while different missions proceed independently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::decision::Decision;
use crate::error::{EngineError, Result};

/// Reserved `decided_by` value for the engine itself
pub const AGENT_ACTOR: &str = "agent";

/// Lifecycle status of a recorded decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Accepted,
    /// Accepted by the engine itself rather than a human dispatcher
    AutoAccepted,
    Rejected,
    Expired,
    Executed,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::AutoAccepted => "auto_accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Executed => "executed",
        }
    }
}

/// A decision plus its lifecycle bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub mission_id: String,
    pub decision: Decision,
    pub status: DecisionStatus,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl DecisionRecord {
    fn new(mission_id: String, decision: Decision) -> Self {
        Self {
            mission_id,
            decision,
            status: DecisionStatus::Pending,
            decided_at: None,
            decided_by: None,
            rejection_reason: None,
            executed_at: None,
        }
    }

    /// Accept the pending decision
    ///
    /// A `decided_by` of [`AGENT_ACTOR`] marks the acceptance as automatic.
    pub fn accept(&mut self, decided_by: &str) -> Result<()> {
        self.require_status(DecisionStatus::Pending)?;
        self.status = if decided_by == AGENT_ACTOR {
            DecisionStatus::AutoAccepted
        } else {
            DecisionStatus::Accepted
        };
        self.decided_at = Some(Utc::now());
        self.decided_by = Some(decided_by.to_string());
        Ok(())
    }

    pub fn reject(&mut self, decided_by: &str, reason: impl Into<String>) -> Result<()> {
        self.require_status(DecisionStatus::Pending)?;
        self.status = DecisionStatus::Rejected;
        self.decided_at = Some(Utc::now());
        self.decided_by = Some(decided_by.to_string());
        self.rejection_reason = Some(reason.into());
        Ok(())
    }

    pub fn expire(&mut self) -> Result<()> {
        self.require_status(DecisionStatus::Pending)?;
        self.status = DecisionStatus::Expired;
        self.decided_at = Some(Utc::now());
        Ok(())
    }

    /// Mark an accepted decision as carried out
    pub fn mark_executed(&mut self) -> Result<()> {
        match self.status {
            DecisionStatus::Accepted | DecisionStatus::AutoAccepted => {
                self.status = DecisionStatus::Executed;
                self.executed_at = Some(Utc::now());
                Ok(())
            }
            other => Err(EngineError::invalid_transition(
                other.as_str(),
                "accepted or auto_accepted",
            )),
        }
    }

    fn require_status(&self, expected: DecisionStatus) -> Result<()> {
        if self.status != expected {
            return Err(EngineError::invalid_transition(
                self.status.as_str(),
                expected.as_str(),
            ));
        }
        Ok(())
    }

    fn was_accepted(&self) -> bool {
        matches!(
            self.status,
            DecisionStatus::Accepted | DecisionStatus::AutoAccepted | DecisionStatus::Executed
        )
    }
}

/// Aggregate performance counters over the whole ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub total_decisions: usize,
    pub accepted_decisions: usize,
    pub acceptance_rate: f64,
    pub avg_confidence_score: f64,
    pub total_revenue_generated: f64,
    pub total_cost_saved: f64,
}

type History = Arc<Mutex<Vec<DecisionRecord>>>;

/// Per-mission decision histories with single-writer transitions
#[derive(Debug, Default)]
pub struct DecisionLedger {
    missions: DashMap<String, History>,
}

impl DecisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn history_handle(&self, mission_id: &str) -> History {
        self.missions
            .entry(mission_id.to_string())
            .or_default()
            .clone()
    }

    /// Record a freshly decided action as pending
    pub async fn record(&self, mission_id: &str, decision: Decision) -> Uuid {
        let decision_id = decision.decision_id;
        let history = self.history_handle(mission_id);
        let mut records = history.lock().await;
        records.push(DecisionRecord::new(mission_id.to_string(), decision));

        tracing::info!(
            mission_id = %mission_id,
            decision_id = %decision_id,
            "decision recorded"
        );
        decision_id
    }

    pub async fn accept(
        &self,
        mission_id: &str,
        decision_id: Uuid,
        decided_by: &str,
    ) -> Result<DecisionRecord> {
        self.transition(mission_id, decision_id, |record| record.accept(decided_by))
            .await
    }

    pub async fn reject(
        &self,
        mission_id: &str,
        decision_id: Uuid,
        decided_by: &str,
        reason: &str,
    ) -> Result<DecisionRecord> {
        self.transition(mission_id, decision_id, |record| {
            record.reject(decided_by, reason)
        })
        .await
    }

    pub async fn expire(&self, mission_id: &str, decision_id: Uuid) -> Result<DecisionRecord> {
        self.transition(mission_id, decision_id, |record| record.expire())
            .await
    }

    pub async fn mark_executed(
        &self,
        mission_id: &str,
        decision_id: Uuid,
    ) -> Result<DecisionRecord> {
        self.transition(mission_id, decision_id, |record| record.mark_executed())
            .await
    }

    async fn transition<F>(
        &self,
        mission_id: &str,
        decision_id: Uuid,
        apply: F,
    ) -> Result<DecisionRecord>
    where
        F: FnOnce(&mut DecisionRecord) -> Result<()>,
    {
        let history = self
            .missions
            .get(mission_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::not_found("mission", mission_id))?;

        let mut records = history.lock().await;
        let record = records
            .iter_mut()
            .find(|r| r.decision.decision_id == decision_id)
            .ok_or_else(|| EngineError::not_found("decision", decision_id.to_string()))?;

        apply(record)?;
        tracing::info!(
            mission_id = %mission_id,
            decision_id = %decision_id,
            status = record.status.as_str(),
            "decision transitioned"
        );
        Ok(record.clone())
    }

    /// Full decision history for one mission, oldest first
    pub async fn history(&self, mission_id: &str) -> Vec<DecisionRecord> {
        // Clone the Arc before awaiting so the map shard lock is released.
        let handle = self
            .missions
            .get(mission_id)
            .map(|entry| entry.value().clone());

        match handle {
            Some(history) => history.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Aggregate metrics across every mission
    pub async fn metrics(&self) -> AgentMetrics {
        let handles: Vec<History> = self
            .missions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Self::aggregate(handles).await
    }

    /// Aggregate metrics over the named missions only
    ///
    /// Unknown mission ids contribute nothing rather than erroring.
    pub async fn metrics_for(&self, mission_ids: &[&str]) -> AgentMetrics {
        let handles: Vec<History> = mission_ids
            .iter()
            .filter_map(|id| self.missions.get(*id).map(|entry| entry.value().clone()))
            .collect();
        Self::aggregate(handles).await
    }

    async fn aggregate(handles: Vec<History>) -> AgentMetrics {
        let mut metrics = AgentMetrics::default();
        let mut confidence_sum = 0.0;

        for history in handles {
            let records = history.lock().await;
            for record in records.iter() {
                metrics.total_decisions += 1;
                confidence_sum += record.decision.confidence;

                if record.was_accepted() {
                    metrics.accepted_decisions += 1;
                    metrics.total_revenue_generated += record.decision.expected_benefit.revenue;
                    metrics.total_cost_saved += record.decision.expected_benefit.cost_saved;
                }
            }
        }

        if metrics.total_decisions > 0 {
            metrics.acceptance_rate =
                metrics.accepted_decisions as f64 / metrics.total_decisions as f64;
            metrics.avg_confidence_score = confidence_sum / metrics.total_decisions as f64;
        }

        metrics
    }
}
