use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Cart validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0}")]
    Payment(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("A checkout is already in progress")]
    CheckoutInProgress,
    #[error("Sign in to continue")]
    Unauthenticated,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_joins_every_error() {
        let err = DomainError::Validation(vec![
            "Regulator is out of stock".to_string(),
            "Wetsuit is no longer available".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Cart validation failed: Regulator is out of stock; Wetsuit is no longer available"
        );
    }

    #[test]
    fn invalid_transition_display() {
        let err = DomainError::InvalidTransition {
            from: "delivered".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot move from delivered to pending");
    }

    #[test]
    fn json_errors_map_to_storage() {
        let err: DomainError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, DomainError::Storage(_)));
    }
}
