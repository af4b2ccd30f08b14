use serde_json::json;

use crate::api::pagination::{collect_all, Page};
use crate::api::retry::RetryPolicy;
use crate::client::{extract_data, GraphQlRequest, Transport};
use crate::constants::{DEFAULT_MAX_PAGES, PAGE_SIZE};
use crate::error::{GhSubError, GhSubResult};
use crate::models::graphql::{IssueIdData, IssueItemsData, ProjectIdData};

/// Node id for `owner/repo#number`.
pub async fn resolve_issue_node_id(
    transport: &dyn Transport,
    owner: &str,
    repo: &str,
    number: u64,
) -> GhSubResult<String> {
    let request = GraphQlRequest::new(
        r#"
        query($owner: String!, $repo: String!, $number: Int!) {
            repository(owner: $owner, name: $repo) {
                issue(number: $number) {
                    id
                }
            }
        }
    "#,
        json!({ "owner": owner, "repo": repo, "number": number }),
    );

    let mut policy = RetryPolicy::new();
    let response = policy.run(|| transport.execute(&request)).await?;
    let data: IssueIdData = extract_data(response)?;

    data.repository
        .and_then(|r| r.issue)
        .map(|i| i.id)
        .ok_or_else(|| {
            GhSubError::InvalidInput(format!("issue {}/{}#{} not found", owner, repo, number))
        })
}

/// Project node id for an owner's project number. Works for both user and
/// organization owners.
pub async fn resolve_project_id(
    transport: &dyn Transport,
    owner: &str,
    number: u32,
) -> GhSubResult<String> {
    let request = GraphQlRequest::new(
        r#"
        query($owner: String!, $number: Int!) {
            owner: repositoryOwner(login: $owner) {
                ... on User { projectV2(number: $number) { id } }
                ... on Organization { projectV2(number: $number) { id } }
            }
        }
    "#,
        json!({ "owner": owner, "number": number }),
    );

    let mut policy = RetryPolicy::new();
    let response = policy.run(|| transport.execute(&request)).await?;
    let data: ProjectIdData = extract_data(response)?;

    data.owner
        .and_then(|o| o.project)
        .map(|p| p.id)
        .ok_or_else(|| {
            GhSubError::InvalidInput(format!("project {} not found for owner {}", number, owner))
        })
}

/// The issue's item id within one project. An issue can sit on several
/// boards, so the project-items listing is paginated and filtered.
pub async fn resolve_item_id(
    transport: &dyn Transport,
    issue_id: &str,
    project_id: &str,
) -> GhSubResult<String> {
    let query = r#"
        query($issueId: ID!, $pageSize: Int!, $cursor: String) {
            node(id: $issueId) {
                ... on Issue {
                    projectItems(first: $pageSize, after: $cursor) {
                        nodes {
                            id
                            project { id }
                        }
                        pageInfo {
                            endCursor
                            hasNextPage
                        }
                    }
                }
            }
        }
    "#;

    let items = collect_all(
        |cursor| {
            let issue_id = issue_id.to_string();
            async move {
                let request = GraphQlRequest::new(
                    query,
                    json!({ "issueId": issue_id, "pageSize": PAGE_SIZE, "cursor": cursor }),
                );
                let mut policy = RetryPolicy::new();
                let response = policy.run(|| transport.execute(&request)).await?;
                let data: IssueItemsData = extract_data(response)?;
                let node = data.node.ok_or_else(|| {
                    GhSubError::MalformedResponse(format!("issue {} not found", issue_id))
                })?;
                Ok(Page::from_connection(node.project_items))
            }
        },
        DEFAULT_MAX_PAGES,
    )
    .await?;

    items
        .into_iter()
        .find(|item| item.project.id == project_id)
        .map(|item| item.id)
        .ok_or_else(|| {
            GhSubError::InvalidInput(format!(
                "issue {} is not an item on project {}",
                issue_id, project_id
            ))
        })
}
