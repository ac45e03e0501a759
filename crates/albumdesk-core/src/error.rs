//! Error types module
//!
//! Unified error enum for the Albumdesk core and its clients. Backend
//! failures, malformed payloads, and refused lifecycle transitions all
//! surface as `AppError`; background polling swallows fetch errors itself
//! and never propagates them here.

use crate::models::OrderStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cannot {action} an order in status '{from}'")]
    InvalidTransition {
        from: OrderStatus,
        action: &'static str,
    },

    #[error("Action '{action}' already in flight for order {order_id}")]
    ActionInFlight {
        action: &'static str,
        order_id: String,
    },

    #[error("Checklist index {index} out of range ({len} steps)")]
    ChecklistIndexOutOfRange { index: usize, len: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Whether retrying the same action can reasonably succeed.
    ///
    /// Transport and server-side failures are retryable as a whole pipeline;
    /// refused transitions and bad input are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Http { status, .. } => *status >= 500,
            AppError::Transport(_) => true,
            AppError::ActionInFlight { .. } => true,
            AppError::Parse(_)
            | AppError::InvalidTransition { .. }
            | AppError::ChecklistIndexOutOfRange { .. }
            | AppError::NotFound(_)
            | AppError::InvalidInput(_) => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_recoverable() {
        let err = AppError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn client_errors_are_not_recoverable() {
        let err = AppError::Http {
            status: 400,
            body: "bad request".to_string(),
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn refused_transition_is_not_recoverable() {
        let err = AppError::InvalidTransition {
            from: OrderStatus::Complete,
            action: "accept",
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("complete"));
    }
}
