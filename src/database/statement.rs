/*!
 * Statement-level types shared by the transport and the executor.
 *
 * - `Bindings`: named parameters sent alongside a batch
 * - `StatementResult`: the outcome of one statement in a batch
 * - `QueryResults`: the filtered payloads returned to callers
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::QueryError;

/// Message the engine reports for statements skipped because an earlier one failed
pub const COLLATERAL_MESSAGE: &str = "The query was not executed due to a failed transaction";

static BINDING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("binding name pattern is valid"));

/// Named parameters for a query batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Bindings(BTreeMap<String, Value>);

impl Bindings {
    /// Create an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any previous value under the same name
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a binding in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value bound under `name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over name/value pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Check every name against the engine's parameter syntax
    pub fn validate(&self) -> Result<(), QueryError> {
        match self.0.keys().find(|name| !BINDING_NAME.is_match(name)) {
            Some(name) => Err(QueryError::InvalidBinding(format!(
                "'{}' is not a valid parameter name",
                name
            ))),
            None => Ok(()),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Status of one statement as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StatementStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERR")]
    Err,
}

/// One statement outcome exactly as the engine sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatement {
    /// Outcome status
    pub status: StatementStatus,
    /// Payload on success, message on failure
    #[serde(default)]
    pub result: Value,
    /// Execution time as reported by the engine
    #[serde(default)]
    pub time: Option<String>,
}

/// Outcome of one statement in a batch
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// The statement ran and produced a payload
    Success(Value),
    /// The statement failed with this message
    Failure(String),
    /// The statement never ran because an earlier statement in the transaction failed
    Collateral,
}

impl StatementResult {
    /// Classify a failure message, separating collateral non-execution from real failures
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message == COLLATERAL_MESSAGE {
            Self::Collateral
        } else {
            Self::Failure(message)
        }
    }
}

impl From<RawStatement> for StatementResult {
    fn from(raw: RawStatement) -> Self {
        match raw.status {
            StatementStatus::Ok => Self::Success(raw.result),
            StatementStatus::Err => match raw.result {
                Value::String(message) => Self::failure(message),
                other => Self::Failure(other.to_string()),
            },
        }
    }
}

/// Payloads of a batch, one entry per statement; collateral statements are `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResults(Vec<Option<Value>>);

impl QueryResults {
    /// Filter statement outcomes in order, stopping at the first real failure
    pub fn from_statements(statements: Vec<StatementResult>) -> Result<Self, QueryError> {
        let mut payloads = Vec::with_capacity(statements.len());

        for (index, statement) in statements.into_iter().enumerate() {
            match statement {
                StatementResult::Success(value) => payloads.push(Some(value)),
                StatementResult::Collateral => payloads.push(None),
                StatementResult::Failure(message) => {
                    return Err(QueryError::Statement { index, message });
                }
            }
        }

        Ok(Self(payloads))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Payload of the statement at `index`; `None` for collateral or out of range
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index).and_then(|v| v.as_ref())
    }

    /// Deserialize the payload of the statement at `index`
    ///
    /// A missing payload is decoded from `null`, so `Option<T>` targets yield `None`.
    pub fn take<T: DeserializeOwned>(&self, index: usize) -> Result<T, QueryError> {
        let value = self.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| QueryError::Decode {
            index,
            message: e.to_string(),
        })
    }

    pub fn into_inner(self) -> Vec<Option<Value>> {
        self.0
    }
}
