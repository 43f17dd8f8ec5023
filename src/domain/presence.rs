use log::debug;

use crate::database::{Bindings, QueryExecutor};
use crate::errors::{DomainError, ValidationError};
use crate::record::{RecordId, table};

/// Record a heartbeat for the game session with join ticket `ticket`
///
/// # Arguments
/// * `executor` - Executor to run the check and update on
/// * `ticket` - Join ticket, the key of the `playing` record
/// * `now` - Heartbeat time as unix seconds
///
/// # Returns
/// * `Result<bool, DomainError>` - `false` when no session has this ticket
pub async fn record_presence(
    executor: &QueryExecutor,
    ticket: &str,
    now: i64,
) -> Result<bool, DomainError> {
    if ticket.is_empty() {
        return Err(ValidationError::single("ticket", "Required").into());
    }

    let session = RecordId::new(table::Playing, ticket);
    if !executor.exists(&session).await? {
        debug!("Presence ping for unknown ticket {}", ticket);
        return Ok(false);
    }

    let bindings = Bindings::new().bind("session", &session).bind("ping", now);
    executor
        .execute("UPDATE type::record($session) SET ping = $ping", &bindings)
        .await?;
    Ok(true)
}

/// Record a heartbeat stamped with the current time
pub async fn record_presence_now(executor: &QueryExecutor, ticket: &str) -> Result<bool, DomainError> {
    record_presence(executor, ticket, chrono::Utc::now().timestamp()).await
}
