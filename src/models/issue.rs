use serde::{Deserialize, Serialize};

/// One issue as it appears in a sub-issue listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueNode {
    pub id: String,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub state: Option<String>,
}
