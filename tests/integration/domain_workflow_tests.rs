/*!
 * Integration tests for the domain helpers over the mock engine
 */

use serde_json::json;

use recordgate::database::{COLLATERAL_MESSAGE, StatementResult};
use recordgate::domain::{
    self, AccountRef, AuditAction, PasswordChange, ProfileUpdate, TransferRequest,
};
use recordgate::errors::DomainError;
use recordgate::record::{RecordId, table};

use crate::common;

/// Outcomes of a keyed transfer batch: replay lookup, resolves, checks, updates, create
fn committed_transfer(id: &str) -> Vec<StatementResult> {
    let mut statements = vec![StatementResult::Success(json!(null)); 9];
    statements.push(StatementResult::Success(json!([{"id": id}])));
    statements
}

fn index_violation(key: &str) -> Vec<StatementResult> {
    let mut statements = vec![StatementResult::failure(COLLATERAL_MESSAGE); 9];
    statements.push(StatementResult::failure(format!(
        "Database index `transactionIdempotency` already contains '{}', with record `transaction:t1`",
        key
    )));
    statements
}

/// A purchase transfers currency and audits it; retrying with the same key is a no-op
#[tokio::test]
async fn test_purchase_withRetriedTransfer_shouldApplyOnce() {
    common::init_logging();
    let (connector, executor) = common::mock_executor().await;

    let request = TransferRequest::new(
        AccountRef::Id("buyer".to_string()),
        AccountRef::Number(1),
        10,
    )
    .with_note("Bought item Hat")
    .with_link("/avatarshop/5/Hat")
    .with_generated_key();
    let key = request.idempotency_key.clone().unwrap();

    connector.push_response(committed_transfer("transaction:t1"));
    let receipt = domain::transfer(&executor, &request).await.unwrap();
    assert_eq!(receipt.transaction.as_deref(), Some("transaction:t1"));

    domain::audit_log(&executor, AuditAction::Economy, "Bought item Hat", "buyer")
        .await
        .unwrap();

    connector.push_response(index_violation(&key));
    let replay = domain::transfer(&executor, &request).await.unwrap();
    assert!(replay.duplicate);
    assert_eq!(replay.transaction, None);

    let recorded = connector.recorded();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded[0].bindings.get("idempotencyKey"), Some(&json!(key)));
    assert_eq!(recorded[0].bindings.get("link"), Some(&json!("/avatarshop/5/Hat")));
    assert_eq!(recorded[1].bindings.get("action"), Some(&json!("Economy")));
}

/// Insufficient funds surface as a typed error with nothing retried
#[tokio::test]
async fn test_transfer_insufficientFunds_shouldNotRetry() {
    let (connector, executor) = common::mock_executor().await;
    let mut statements = vec![StatementResult::failure(COLLATERAL_MESSAGE); 9];
    statements[5] = StatementResult::failure("An error occurred: Insufficient funds");
    connector.push_response(statements);

    let request = TransferRequest::new(AccountRef::Number(2), AccountRef::Number(1), 1_000_000);
    let err = domain::transfer(&executor, &request).await.unwrap_err();

    assert_eq!(err, DomainError::InsufficientFunds { amount: 1_000_000 });
    assert_eq!(connector.queries(), 1);
    assert_eq!(connector.opens(), 1);
}

/// Settings forms reject bad input before the database sees it
#[tokio::test]
async fn test_settings_invalidForms_shouldNotQuery() {
    let (connector, executor) = common::mock_executor().await;
    let user = RecordId::new(table::User, "u1");

    let long_bio = ProfileUpdate {
        bio: Some("x".repeat(1001)),
    };
    assert!(matches!(
        domain::update_profile(&executor, &user, &long_bio).await,
        Err(DomainError::Validation(_))
    ));

    let mismatch = PasswordChange {
        current_password: "old".to_string(),
        new_password: "new".to_string(),
        confirm_password: "other".to_string(),
    };
    let err = mismatch.validate().unwrap_err();
    assert_eq!(err.message_for("confirm_password"), Some("Passwords do not match"));

    assert_eq!(connector.queries(), 0);
}

/// Group search and presence pings use bindings only
#[tokio::test]
async fn test_groupsAndPresence_shouldRoundTrip() {
    let (connector, executor) = common::mock_executor().await;
    connector
        .push_success(vec![json!([{"name": "Admins", "memberCount": 3}])])
        .push_success(vec![json!(true)])
        .push_success(vec![json!([])]);

    let groups = domain::search_groups(&executor, "ADM").await.unwrap();
    assert_eq!(groups[0].name, "Admins");
    assert_eq!(groups[0].member_count, 3);

    assert!(domain::record_presence(&executor, "ticket-1", 1_700_000_123).await.unwrap());

    let recorded = connector.recorded();
    assert_eq!(recorded[0].bindings.get("term"), Some(&json!("ADM")));
    assert_eq!(recorded[2].bindings.get("ping"), Some(&json!(1_700_000_123_i64)));
}
