/*!
 * Query execution over the shared connection.
 *
 * `QueryExecutor::execute` sends a batch through the retry policy, then walks the
 * per-statement outcomes in order. The first real failure is raised with its
 * message; statements the engine skipped because an earlier one failed are left
 * out instead of raising a second, misleading error.
 */

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use super::connection::ConnectionManager;
use super::retry::{RetryOutcome, RetryPolicy};
use super::statement::{Bindings, QueryResults};
use crate::errors::QueryError;
use crate::record::{RecordId, Table};

/// Binding name `exists_where` uses for the table
const TABLE_BINDING: &str = "table";

/// Runs query batches with retry and statement-level error filtering
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    connections: Arc<ConnectionManager>,
    retry: RetryPolicy,
}

impl QueryExecutor {
    /// Create an executor over `connections`
    pub fn new(connections: Arc<ConnectionManager>, retry: RetryPolicy) -> Self {
        Self { connections, retry }
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    /// Execute a batch and return one payload per statement
    ///
    /// # Arguments
    /// * `query` - Query text with one or more statements
    /// * `bindings` - Named parameters shared by every statement
    ///
    /// # Returns
    /// * `Result<QueryResults, QueryError>` - Payloads in submission order, or the first statement failure
    pub async fn execute(&self, query: &str, bindings: &Bindings) -> Result<QueryResults, QueryError> {
        bindings.validate()?;
        debug!("Executing query ({} bindings): {}", bindings.len(), query);

        let outcome = self
            .retry
            .run(&self.connections, |handle| async move {
                handle.query(query, bindings).await
            })
            .await;

        match outcome {
            RetryOutcome::Completed(statements) => QueryResults::from_statements(statements),
            RetryOutcome::Exhausted { attempts, last_error } => {
                Err(QueryError::Unavailable { attempts, last_error })
            }
        }
    }

    /// Whether the record exists; a missing record is `false`, not an error
    pub async fn exists<T: Table>(&self, id: &RecordId<T>) -> Result<bool, QueryError> {
        let bindings = Bindings::new().bind("record", id);
        let results = self
            .execute("!!SELECT 1 FROM type::record($record)", &bindings)
            .await?;
        Ok(truthy(results.get(0)))
    }

    /// Whether any record of table `T` matches `predicate`
    ///
    /// The predicate is fixed query text; every value it refers to must come in
    /// through `params`. The name `table` is reserved for the table binding.
    ///
    /// # Example
    /// ```no_run
    /// # async fn demo(executor: &recordgate::database::QueryExecutor) -> Result<(), recordgate::errors::QueryError> {
    /// use recordgate::database::Bindings;
    /// use recordgate::record::table;
    ///
    /// let found = executor
    ///     .exists_where(table::Group, "name = $n", Bindings::new().bind("n", "Admins"))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn exists_where<T: Table>(
        &self,
        _table: T,
        predicate: &'static str,
        params: Bindings,
    ) -> Result<bool, QueryError> {
        if params.contains(TABLE_BINDING) {
            return Err(QueryError::InvalidBinding(format!(
                "'{}' is reserved for the table name",
                TABLE_BINDING
            )));
        }

        let query = format!("!!SELECT 1 FROM type::table($table) WHERE {}", predicate);
        let bindings = params.bind(TABLE_BINDING, T::NAME);
        let results = self.execute(&query, &bindings).await?;
        Ok(truthy(results.get(0)))
    }
}

/// Interpret an existence payload; the engine may answer with a bool or the selected rows
fn truthy(payload: Option<&Value>) -> bool {
    match payload {
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(rows)) => !rows.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}
