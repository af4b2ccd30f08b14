use serde::Deserialize;
use serde_json::Value;

use super::{Connection, IssueNode};

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLErrorEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLErrorEntry {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

// Sub-issue listing: node(id:) { ... on Issue { subIssues(...) } }
#[derive(Debug, Deserialize)]
pub struct SubIssuesData {
    pub node: Option<SubIssuesNode>,
}

#[derive(Debug, Deserialize)]
pub struct SubIssuesNode {
    #[serde(rename = "subIssues")]
    pub sub_issues: Connection<IssueNode>,
}

// Project field listing
#[derive(Debug, Deserialize)]
pub struct ProjectFieldsData {
    pub node: Option<ProjectFieldsNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFieldsNode {
    pub fields: Connection<ProjectFieldNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectFieldNode {
    // Union members without ProjectV2FieldCommon deserialize as empty objects.
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "dataType")]
    pub data_type: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<FieldOptionNode>>,
}

#[derive(Debug, Deserialize)]
pub struct FieldOptionNode {
    pub id: String,
    pub name: String,
}

// Issue node-id lookup by repo + number
#[derive(Debug, Deserialize)]
pub struct IssueIdData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub issue: Option<NodeRef>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

// Project lookup by owner + number
#[derive(Debug, Deserialize)]
pub struct ProjectIdData {
    pub owner: Option<ProjectOwnerNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectOwnerNode {
    #[serde(rename = "projectV2")]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectRef {
    pub id: String,
}

// Project item lookup for one issue
#[derive(Debug, Deserialize)]
pub struct IssueItemsData {
    pub node: Option<IssueItemsNode>,
}

#[derive(Debug, Deserialize)]
pub struct IssueItemsNode {
    #[serde(rename = "projectItems")]
    pub project_items: Connection<ProjectItemNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItemNode {
    pub id: String,
    pub project: ProjectRef,
}
