/*!
 * # recordgate
 *
 * A resilient data-access layer for a remote record/graph database engine
 * reached over HTTP.
 *
 * ## Features
 *
 * - One shared connection handle with versioned reconnects
 * - Bounded reconnect-and-retry for transient transport failures
 * - Multi-statement batches where only the first real statement failure is
 *   raised and statements skipped by a failed transaction are ignored
 * - Typed record identities: the table fixes the key type at compile time
 * - Domain helpers: audit log, currency transfer, account settings, groups,
 *   client presence
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `record`: Table markers and typed record ids
 * - `database`: Connection, retry, execution and schema bootstrap:
 *   - `database::engine`: Transport traits
 *   - `database::http`: JSON-over-HTTP transport
 *   - `database::connection`: Connection lifecycle
 *   - `database::retry`: Retry policy
 *   - `database::executor`: Query execution
 * - `domain`: Operations built on the executor
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod record;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{Bindings, Database, QueryExecutor, QueryResults};
pub use errors::{AppError, ConnectionError, DomainError, QueryError, ValidationError};
pub use record::{RecordId, Table, table};
