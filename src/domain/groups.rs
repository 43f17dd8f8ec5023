use serde::{Deserialize, Serialize};

use crate::database::{Bindings, QueryExecutor};
use crate::errors::QueryError;

const LIST_QUERY: &str = "SELECT name, count(<-in) AS memberCount FROM group ORDER BY name";
const SEARCH_QUERY: &str = "SELECT name, count(<-in) AS memberCount FROM group \
     WHERE string::contains(string::lowercase(name), string::lowercase($term)) ORDER BY name";

/// A group with its member count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    #[serde(rename = "memberCount", default)]
    pub member_count: u64,
}

/// All groups
pub async fn list_groups(executor: &QueryExecutor) -> Result<Vec<GroupSummary>, QueryError> {
    let results = executor.execute(LIST_QUERY, &Bindings::new()).await?;
    Ok(results.take::<Option<Vec<GroupSummary>>>(0)?.unwrap_or_default())
}

/// Groups whose name contains `term`, ignoring case
pub async fn search_groups(executor: &QueryExecutor, term: &str) -> Result<Vec<GroupSummary>, QueryError> {
    let bindings = Bindings::new().bind("term", term);
    let results = executor.execute(SEARCH_QUERY, &bindings).await?;
    Ok(results.take::<Option<Vec<GroupSummary>>>(0)?.unwrap_or_default())
}
