use std::collections::HashSet;

use serde_json::json;

use crate::api::batch::{demux, BatchBuilder, FieldValue, MutationIntent};
use crate::api::lookup::resolve_item_id;
use crate::api::pagination::{collect_all, Page};
use crate::api::retry::RetryPolicy;
use crate::client::{extract_data, GraphQlRequest, Transport};
use crate::constants::{DEFAULT_MAX_PAGES, PAGE_INFO_FIELDS, PAGE_SIZE, SUB_ISSUE_FIELDS};
use crate::error::{GhSubError, GhSubResult};
use crate::logging::{log_debug, log_info};
use crate::models::graphql::SubIssuesData;
use crate::models::IssueNode;

/// The field change a traversal applies to every node it visits.
#[derive(Debug, Clone)]
pub struct FieldChange {
    pub project_id: String,
    pub field_id: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
    /// Field mutation confirmed by the API.
    Updated,
    /// Dry run: the node would have been mutated.
    WouldUpdate,
    /// Traversal with no operation (listing).
    Listed,
    /// Mutation or item lookup failed; the reason names the cause.
    Failed(String),
    /// Node was already visited; revisit recorded, not descended into.
    SkippedCycle,
}

#[derive(Debug, Clone)]
pub struct NodeResult {
    pub issue_id: String,
    pub number: Option<u64>,
    pub title: Option<String>,
    pub depth: u32,
    pub status: NodeStatus,
}

/// Per-node outcomes plus aggregate counts. Child-listing failures are kept
/// apart from node outcomes so neither is dropped.
#[derive(Debug, Default)]
pub struct TraversalReport {
    pub results: Vec<NodeResult>,
    pub fetch_errors: Vec<(String, String)>,
}

impl TraversalReport {
    pub fn visited(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status != NodeStatus::SkippedCycle)
            .count()
    }

    pub fn mutated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, NodeStatus::Updated | NodeStatus::WouldUpdate))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, NodeStatus::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == NodeStatus::SkippedCycle)
            .count()
    }
}

#[derive(Debug, Clone)]
struct LevelNode {
    issue_id: String,
    number: Option<u64>,
    title: Option<String>,
    depth: u32,
}

/// Breadth-first traversal over the sub-issue graph. The frontier is an
/// explicit per-level list and revisits are caught by a visited-ID set, so
/// depth and cycle protection do not depend on the call stack. Each level's
/// mutations are finalized (success or recorded failure) before that level's
/// children are fetched.
pub struct HierarchyWalker<'a> {
    transport: &'a dyn Transport,
    batch_builder: BatchBuilder,
    max_pages: usize,
}

impl<'a> HierarchyWalker<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            batch_builder: BatchBuilder::new(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn batch_builder(mut self, builder: BatchBuilder) -> Self {
        self.batch_builder = builder;
        self
    }

    /// Apply `change` to the root and, down to `max_depth`, its descendants.
    /// `max_depth = 0` is root only. With `dry_run`, no mutation wire call is
    /// issued and each reachable node is reported as `WouldUpdate`. With no
    /// `change`, the traversal is a pure listing.
    pub async fn apply(
        &self,
        root_id: &str,
        change: Option<&FieldChange>,
        max_depth: u32,
        dry_run: bool,
    ) -> GhSubResult<TraversalReport> {
        let mut report = TraversalReport::default();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root_id.to_string());

        let mut level = vec![LevelNode {
            issue_id: root_id.to_string(),
            number: None,
            title: None,
            depth: 0,
        }];
        let mut depth = 0u32;

        while !level.is_empty() {
            let statuses = match change {
                None => vec![NodeStatus::Listed; level.len()],
                Some(_) if dry_run => vec![NodeStatus::WouldUpdate; level.len()],
                Some(change) => self.mutate_level(&level, change).await,
            };

            for (node, status) in level.iter().zip(statuses) {
                report.results.push(NodeResult {
                    issue_id: node.issue_id.clone(),
                    number: node.number,
                    title: node.title.clone(),
                    depth: node.depth,
                    status,
                });
            }

            if depth >= max_depth {
                break;
            }

            // Children are fetched for every node at this level, including
            // nodes whose own mutation just failed.
            let mut next = Vec::new();
            for node in &level {
                match self.fetch_children(&node.issue_id).await {
                    Ok(children) => {
                        for child in children {
                            if !visited.insert(child.id.clone()) {
                                report.results.push(NodeResult {
                                    issue_id: child.id,
                                    number: Some(child.number),
                                    title: Some(child.title),
                                    depth: depth + 1,
                                    status: NodeStatus::SkippedCycle,
                                });
                            } else {
                                next.push(LevelNode {
                                    issue_id: child.id,
                                    number: Some(child.number),
                                    title: Some(child.title),
                                    depth: depth + 1,
                                });
                            }
                        }
                    }
                    Err(e) => {
                        log_debug(&format!(
                            "child listing failed for {}: {}",
                            node.issue_id, e
                        ));
                        report.fetch_errors.push((node.issue_id.clone(), e.to_string()));
                    }
                }
            }

            level = next;
            depth += 1;
        }

        log_info(&format!(
            "traversal done: {} visited, {} mutated, {} failed, {} skipped",
            report.visited(),
            report.mutated(),
            report.failed(),
            report.skipped()
        ));
        Ok(report)
    }

    /// One pass over a level: resolve item ids, batch the mutations, execute
    /// each batch under retry, and demultiplex outcomes back to nodes.
    /// Returns a status per node, index-aligned with `level`.
    async fn mutate_level(&self, level: &[LevelNode], change: &FieldChange) -> Vec<NodeStatus> {
        let mut statuses: Vec<Option<NodeStatus>> = vec![None; level.len()];

        let mut intents = Vec::new();
        let mut intent_nodes = Vec::new();
        for (i, node) in level.iter().enumerate() {
            match resolve_item_id(self.transport, &node.issue_id, &change.project_id).await {
                Ok(item_id) => {
                    intents.push(MutationIntent {
                        project_id: change.project_id.clone(),
                        item_id,
                        field_id: change.field_id.clone(),
                        value: change.value.clone(),
                    });
                    intent_nodes.push(i);
                }
                Err(e) => statuses[i] = Some(NodeStatus::Failed(e.to_string())),
            }
        }

        let batches = self.batch_builder.build(intents);
        let mut cursor = 0usize;
        for batch in &batches {
            let request = batch.to_request();
            let mut policy = RetryPolicy::new();
            match policy.run(|| self.transport.execute(&request)).await {
                Ok(response) => {
                    for outcome in demux(batch, &response) {
                        let node_index = intent_nodes[cursor];
                        cursor += 1;
                        statuses[node_index] = Some(match outcome.error {
                            None => NodeStatus::Updated,
                            Some(message) => NodeStatus::Failed(message),
                        });
                    }
                }
                Err(e) => {
                    // The whole batch failed at the transport level; every
                    // intent in it gets that reason, none is dropped.
                    let message = e.to_string();
                    for _ in 0..batch.len() {
                        let node_index = intent_nodes[cursor];
                        cursor += 1;
                        statuses[node_index] = Some(NodeStatus::Failed(message.clone()));
                    }
                }
            }
        }

        statuses
            .into_iter()
            .map(|s| s.unwrap_or_else(|| NodeStatus::Failed("no outcome recorded".to_string())))
            .collect()
    }

    /// All direct sub-issues of one node, across however many pages.
    async fn fetch_children(&self, issue_id: &str) -> GhSubResult<Vec<IssueNode>> {
        let query = format!(
            r#"
            query($issueId: ID!, $pageSize: Int!, $cursor: String) {{
                node(id: $issueId) {{
                    ... on Issue {{
                        subIssues(first: $pageSize, after: $cursor) {{
                            nodes {{{}}}
                            pageInfo {{{}}}
                        }}
                    }}
                }}
            }}
        "#,
            SUB_ISSUE_FIELDS, PAGE_INFO_FIELDS
        );

        collect_all(
            |cursor| {
                let query = query.clone();
                let issue_id = issue_id.to_string();
                async move {
                    let request = GraphQlRequest::new(
                        query,
                        json!({ "issueId": issue_id, "pageSize": PAGE_SIZE, "cursor": cursor }),
                    );
                    let mut policy = RetryPolicy::new();
                    let response = policy.run(|| self.transport.execute(&request)).await?;
                    let data: SubIssuesData = extract_data(response)?;
                    let node = data.node.ok_or_else(|| {
                        GhSubError::MalformedResponse(format!("issue {} not found", issue_id))
                    })?;
                    Ok(Page::from_connection(node.sub_issues))
                }
            },
            self.max_pages,
        )
        .await
    }
}
