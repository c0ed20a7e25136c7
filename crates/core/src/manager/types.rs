use thiserror::Error;

use crate::lifecycle::State;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Cannot {operation}: pipeline is {state}")]
    InvalidState { operation: String, state: State },

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

impl ManagerError {
    pub(crate) fn invalid_state(operation: &str, state: State) -> Self {
        Self::InvalidState {
            operation: operation.to_string(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message() {
        let err = ManagerError::invalid_state("start", State::Running);
        assert_eq!(err.to_string(), "Cannot start: pipeline is RUNNING");
    }
}
