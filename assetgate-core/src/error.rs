//! Error types for the access-control core

/// Result type used across the store, guard and collaborator traits
pub type AuthResult<T> = Result<T, AuthError>;

/// AssetGate error type
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Authentication service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Role lookup failed: {0}")]
    Lookup(String),
    #[error("Auth store already initialized")]
    AlreadyInitialized,
    #[error("Auth store not initialized")]
    NotInitialized,
    #[error("Auth store closed")]
    StoreClosed,
    #[error("Access guard requires at least one allowed role")]
    EmptyAllowedRoles,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuthError::UnknownRole("guest".to_string());
        assert_eq!(err.to_string(), "Unknown role: guest");

        let err = AuthError::ServiceUnavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AuthError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AuthError::Anyhow(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
