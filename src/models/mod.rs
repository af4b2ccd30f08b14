pub mod graphql;
pub mod issue;

// Re-export commonly used types
pub use graphql::{GraphQLErrorEntry, GraphQLResponse};
pub use issue::IssueNode;

use serde::{Deserialize, Serialize};

/// Cursor-paginated connection as the API returns it.
#[derive(Debug, Deserialize, Serialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageInfo {
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
}
