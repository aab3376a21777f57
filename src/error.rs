//! Error types shared by every simulation stage

use std::fmt;

/// One rejected input field and the reason it was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while validating, simulating, solving or exporting
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// One or more parameters were rejected before (or during) the simulation
    #[error("invalid input: {}", join_issues(.0))]
    InvalidInput(Vec<FieldIssue>),

    /// The target NPV cannot be reached by any price pair inside the search bounds
    #[error(
        "no viable carbon price: target NPV {target_npv:.2} exceeds the best reachable conservation NPV {max_conservation_npv:.2}"
    )]
    NoViableSolution {
        target_npv: f64,
        max_conservation_npv: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    /// Shorthand for a single-field `InvalidInput`
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SimulationError::InvalidInput(vec![FieldIssue::new(field, message)])
    }

    /// Fields named by an `InvalidInput`, empty for every other variant
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            SimulationError::InvalidInput(issues) => issues.iter().map(|i| i.field).collect(),
            _ => Vec::new(),
        }
    }
}

/// Convenience result type for simulation operations
pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_lists_every_field() {
        let err = SimulationError::InvalidInput(vec![
            FieldIssue::new("discount_rate", "must not be negative"),
            FieldIssue::new("trials", "must be at least 1"),
        ]);

        let message = err.to_string();
        assert!(message.contains("discount_rate: must not be negative"));
        assert!(message.contains("trials: must be at least 1"));
        assert_eq!(err.invalid_fields(), vec!["discount_rate", "trials"]);
    }

    #[test]
    fn test_no_viable_solution_message() {
        let err = SimulationError::NoViableSolution {
            target_npv: 1000.0,
            max_conservation_npv: 12.5,
        };
        assert!(err.to_string().contains("1000.00"));
        assert!(err.invalid_fields().is_empty());
    }
}
