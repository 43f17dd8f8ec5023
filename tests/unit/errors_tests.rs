/*!
 * Tests for error types and conversions
 */

use recordgate::errors::{AppError, ConnectionError, DomainError, QueryError, ValidationError};

#[test]
fn test_connectionError_handshakeRejected_shouldDisplayStatusAndMessage() {
    let error = ConnectionError::HandshakeRejected {
        status_code: 401,
        message: "Unauthorized".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("401"));
    assert!(display.contains("Unauthorized"));
}

#[test]
fn test_queryError_statement_shouldCarryEngineMessage() {
    let error = QueryError::Statement {
        index: 2,
        message: "Database index `name` already contains 'Admins'".to_string(),
    };
    assert_eq!(
        error.statement_message(),
        Some("Database index `name` already contains 'Admins'")
    );
    assert!(error.to_string().contains("Statement 2 failed"));
}

#[test]
fn test_queryError_unavailable_shouldMentionAttemptsAndCause() {
    let error = QueryError::Unavailable {
        attempts: 3,
        last_error: ConnectionError::Closed,
    };
    let display = error.to_string();
    assert!(display.contains("3 attempts"));
    assert!(display.contains("closed"));
    assert_eq!(error.statement_message(), None);
}

#[test]
fn test_validationError_multipleFields_shouldListEach() {
    let mut error = ValidationError::new();
    assert!(error.is_empty());
    error.push("bio", "Too long");
    error.push("css", "Too long");

    assert_eq!(error.message_for("css"), Some("Too long"));
    assert_eq!(error.message_for("theme"), None);
    assert_eq!(error.to_string(), "Validation failed: bio: Too long; css: Too long");
    assert!(error.clone().into_result().is_err());
    assert!(ValidationError::new().into_result().is_ok());
}

#[test]
fn test_domainError_fromValidation_shouldKeepFields() {
    let error: DomainError = ValidationError::single("amount", "Must be positive").into();
    assert_eq!(error.to_string(), "Validation failed: amount: Must be positive");
}

#[test]
fn test_appError_conversions_shouldWrapSources() {
    let app: AppError = ConnectionError::Dormant.into();
    assert!(matches!(app, AppError::Connection(ConnectionError::Dormant)));

    let app: AppError = QueryError::InvalidBinding("x".to_string()).into();
    assert!(app.to_string().starts_with("Query error"));

    let app: AppError = DomainError::InsufficientFunds { amount: 10 }.into();
    assert!(app.to_string().contains("Insufficient funds"));

    let app: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "conf.json").into();
    assert!(matches!(app, AppError::File(_)));

    let app: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(app, AppError::Unknown(ref m) if m == "boom"));
}
