use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::{Bindings, QueryExecutor};
use crate::errors::QueryError;
use crate::record::{RecordId, table};

const AUDIT_LOG_QUERY: &str = "CREATE auditLog CONTENT {
    action: $action,
    note: $note,
    user: type::record($user),
    time: time::now()
}";

/// Category of a privileged action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Account,
    Administration,
    Moderation,
    Economy,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Administration => "Administration",
            Self::Moderation => "Moderation",
            Self::Economy => "Economy",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record a privileged action taken by the user with key `user_key`
pub async fn audit_log(
    executor: &QueryExecutor,
    action: AuditAction,
    note: &str,
    user_key: &str,
) -> Result<(), QueryError> {
    let user = RecordId::new(table::User, user_key);
    let bindings = Bindings::new()
        .bind("action", action.as_str())
        .bind("note", note)
        .bind("user", &user);

    executor.execute(AUDIT_LOG_QUERY, &bindings).await?;
    Ok(())
}
