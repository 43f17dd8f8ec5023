/*!
 * Database schema bootstrap.
 *
 * The init script is run once at startup, right after the first connection. Every
 * statement is a `DEFINE`, so running it against an existing database re-applies
 * the same definitions instead of failing.
 */

use log::{debug, info};

use super::executor::QueryExecutor;
use super::statement::Bindings;
use crate::errors::QueryError;

/// Current schema version, stored on the `schema` param
pub const SCHEMA_VERSION: i64 = 1;

/// Name of the unique index guarding transfer replays
pub const IDEMPOTENCY_INDEX: &str = "transactionIdempotency";

/// Schema definition statements, in execution order
const DEFINITIONS: &[&str] = &[
    // Accounts
    "DEFINE TABLE user SCHEMALESS",
    "DEFINE FIELD number ON user TYPE int",
    "DEFINE FIELD currency ON user TYPE int DEFAULT 0 ASSERT $value >= 0",
    "DEFINE FIELD bio ON user TYPE option<string>",
    "DEFINE FIELD css ON user TYPE option<string>",
    "DEFINE INDEX userNumber ON user FIELDS number UNIQUE",
    "DEFINE INDEX username ON user FIELDS username UNIQUE",
    // Groups
    "DEFINE TABLE group SCHEMALESS",
    "DEFINE INDEX groupName ON group FIELDS name UNIQUE",
    "DEFINE TABLE in TYPE RELATION FROM user TO group",
    // Audit
    "DEFINE TABLE auditLog SCHEMALESS",
    "DEFINE FIELD action ON auditLog TYPE string ASSERT $value IN ['Account', 'Administration', 'Moderation', 'Economy']",
    "DEFINE FIELD note ON auditLog TYPE string",
    "DEFINE FIELD user ON auditLog TYPE record<user>",
    "DEFINE FIELD time ON auditLog TYPE datetime DEFAULT time::now()",
    // Transfers
    "DEFINE TABLE transaction SCHEMALESS",
    "DEFINE FIELD sender ON transaction TYPE record<user>",
    "DEFINE FIELD receiver ON transaction TYPE record<user>",
    "DEFINE FIELD amountSent ON transaction TYPE int ASSERT $value > 0",
    "DEFINE FIELD note ON transaction TYPE option<string>",
    "DEFINE FIELD link ON transaction TYPE option<string>",
    "DEFINE FIELD idempotencyKey ON transaction TYPE option<string>",
    "DEFINE FIELD time ON transaction TYPE datetime DEFAULT time::now()",
    "DEFINE INDEX transactionIdempotency ON transaction FIELDS idempotencyKey UNIQUE",
    // Game sessions
    "DEFINE TABLE playing SCHEMALESS",
    "DEFINE FIELD ping ON playing TYPE int DEFAULT 0",
];

/// The full init script as sent to the engine
pub fn init_script() -> String {
    let mut script = DEFINITIONS.join(";\n");
    script.push_str(";\nDEFINE PARAM $schema VALUE $version;");
    script
}

/// Run the init script
///
/// # Arguments
/// * `executor` - Executor connected to the target database
pub async fn initialize(executor: &QueryExecutor) -> Result<(), QueryError> {
    info!("Initializing database schema v{}", SCHEMA_VERSION);

    let bindings = Bindings::new().bind("version", SCHEMA_VERSION);
    let results = executor.execute(&init_script(), &bindings).await?;

    debug!("Schema applied ({} statements)", results.len());
    Ok(())
}
