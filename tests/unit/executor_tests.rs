/*!
 * Tests for batch execution semantics
 */

use serde::Deserialize;
use serde_json::json;

use recordgate::database::{Bindings, COLLATERAL_MESSAGE, StatementResult};
use recordgate::errors::{ConnectionError, QueryError};
use recordgate::record::{RecordId, table};

use crate::common;

#[derive(Debug, Deserialize, PartialEq)]
struct UserRow {
    username: String,
    number: i64,
}

/// A real failure followed by collateral skips raises exactly one error
#[tokio::test]
async fn test_execute_failureFollowedByCollateral_shouldRaiseOriginalMessage() {
    let (connector, executor) = common::mock_executor().await;
    connector.push_response(vec![
        StatementResult::failure(COLLATERAL_MESSAGE),
        StatementResult::failure("Database index `username` already contains 'Heliodex'"),
        StatementResult::failure(COLLATERAL_MESSAGE),
        StatementResult::failure(COLLATERAL_MESSAGE),
    ]);

    let err = executor
        .execute(
            "BEGIN; CREATE user SET username = $u; CREATE regKey; COMMIT",
            &Bindings::new().bind("u", "Heliodex"),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        QueryError::Statement {
            index: 1,
            message: "Database index `username` already contains 'Heliodex'".to_string(),
        }
    );
}

/// Successful batches keep one payload per statement in order
#[tokio::test]
async fn test_execute_successfulBatch_shouldDecodeEachStatement() {
    let (connector, executor) = common::mock_executor().await;
    connector.push_success(vec![
        json!([{"username": "Heliodex", "number": 1}]),
        json!(42),
    ]);

    let results = executor
        .execute("SELECT username, number FROM user; RETURN 42", &Bindings::new())
        .await
        .unwrap();

    let users: Vec<UserRow> = results.take(0).unwrap();
    assert_eq!(
        users,
        vec![UserRow {
            username: "Heliodex".to_string(),
            number: 1
        }]
    );
    assert_eq!(results.take::<i64>(1).unwrap(), 42);
}

/// Missing records are not errors
#[tokio::test]
async fn test_exists_missingUser_shouldReturnFalseWithoutError() {
    let (connector, executor) = common::mock_executor().await;
    connector.push_success(vec![json!(false)]);

    let found = executor
        .exists(&RecordId::new(table::User, "ghost"))
        .await
        .unwrap();
    assert!(!found);
}

/// Predicates only reference bindings; values never reach the query text
#[tokio::test]
async fn test_existsWhere_groupName_shouldMatchThroughBindings() {
    let (connector, executor) = common::mock_executor().await;
    connector
        .push_success(vec![json!(true)])
        .push_success(vec![json!(false)]);

    let admins = executor
        .exists_where(table::Group, "name = $n", Bindings::new().bind("n", "Admins"))
        .await
        .unwrap();
    let lowercase = executor
        .exists_where(table::Group, "name = $n", Bindings::new().bind("n", "admins"))
        .await
        .unwrap();

    assert!(admins);
    assert!(!lowercase);
    for sent in connector.recorded() {
        assert!(!sent.query.contains("dmins"));
        assert_eq!(sent.bindings.get("table"), Some(&json!("group")));
    }
}

/// Transport failures are retried; exhaustion is explicit
#[tokio::test]
async fn test_execute_engineDown_shouldReportUnavailable() {
    let (connector, executor) = common::mock_executor().await;
    connector.fail_opens(true);
    connector.push_error(ConnectionError::Unreachable("connection reset".to_string()));

    let err = executor.execute("RETURN 1", &Bindings::new()).await.unwrap_err();
    assert!(matches!(err, QueryError::Unavailable { attempts: 3, .. }));

    connector.fail_opens(false);
    connector.push_success(vec![json!(1)]);
    let results = executor.execute("RETURN 1", &Bindings::new()).await.unwrap();
    assert_eq!(results.get(0), Some(&json!(1)));
    assert_eq!(executor.connections().generation(), 2);
}
