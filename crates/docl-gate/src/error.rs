use crate::gate::Action;

/// Errors from identity gate decisions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The caller's role does not permit the action.
    #[error("permission denied: caller '{caller_id}' may not {action}")]
    PermissionDenied { caller_id: String, action: Action },

    /// The gate configuration is invalid.
    #[error("gate configuration error: {0}")]
    Config(String),
}

/// Result alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
