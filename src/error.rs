//! Error types for the dispatch engine

use thiserror::Error;

/// Result type alias for dispatch engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during dispatch engine operations
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A mission, vehicle, load or decision was not found
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// Input values failed validation before any computation
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// A load exceeds the vehicle's remaining capacity
    #[error("Insufficient capacity: load needs {required_tons}t but only {available_tons}t available (short by {shortfall}t)", shortfall = .required_tons - .available_tons)]
    InsufficientCapacity {
        required_tons: f64,
        available_tons: f64,
    },

    /// A decision record was not in a state that permits the transition
    #[error("Invalid state transition: decision is '{current}', expected '{expected}'")]
    InvalidStateTransition { current: String, expected: String },

    /// The advisory collaborator failed or timed out
    ///
    /// Recovered internally by degrading to heuristic-only reasoning; callers
    /// of `evaluate` never see this as a hard failure.
    #[error("Advisory unavailable: {message}")]
    AdvisoryUnavailable { message: String },

    /// The routing collaborator failed; fatal to planning and matching
    #[error("Routing unavailable for {origin} -> {destination}: {message}")]
    RoutingUnavailable {
        origin: String,
        destination: String,
        message: String,
    },

    /// Configuration validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl EngineError {
    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an insufficient-capacity error
    pub fn insufficient_capacity(required_tons: f64, available_tons: f64) -> Self {
        Self::InsufficientCapacity {
            required_tons,
            available_tons,
        }
    }

    /// Create an invalid-state-transition error
    pub fn invalid_transition(current: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            current: current.into(),
            expected: expected.into(),
        }
    }

    /// Create an advisory-unavailable error
    pub fn advisory_unavailable(message: impl Into<String>) -> Self {
        Self::AdvisoryUnavailable {
            message: message.into(),
        }
    }

    /// Create a routing-unavailable error
    pub fn routing_unavailable(
        origin: impl Into<String>,
        destination: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RoutingUnavailable {
            origin: origin.into(),
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the engine recovers from this error locally instead of
    /// surfacing it to the caller
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AdvisoryUnavailable { .. })
    }

    /// Get error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InsufficientCapacity { .. } => "insufficient_capacity",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::AdvisoryUnavailable { .. } => "advisory_unavailable",
            Self::RoutingUnavailable { .. } => "routing_unavailable",
            Self::Configuration { .. } => "configuration",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation_and_display() {
        let err = EngineError::not_found("mission", "m-42");
        assert_eq!(err.category(), "not_found");
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "mission 'm-42' not found");

        let cap = EngineError::insufficient_capacity(6.0, 5.0);
        assert_eq!(
            cap.to_string(),
            "Insufficient capacity: load needs 6t but only 5t available (short by 1t)"
        );
    }

    #[test]
    fn test_advisory_errors_are_recoverable() {
        assert!(EngineError::advisory_unavailable("timed out").is_recoverable());
        assert!(!EngineError::routing_unavailable("Delhi", "Mumbai", "down").is_recoverable());
    }

    #[test]
    fn test_transition_error_names_current_status() {
        let err = EngineError::invalid_transition("rejected", "pending");
        assert_eq!(
            err.to_string(),
            "Invalid state transition: decision is 'rejected', expected 'pending'"
        );
        assert_eq!(err.category(), "invalid_state_transition");
    }
}
