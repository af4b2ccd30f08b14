use async_trait::async_trait;
use serde_json::Value;

use crate::client::graphql::GraphQlRequest;
use crate::error::GhSubResult;
use crate::models::GraphQLErrorEntry;

/// Outcome of one wire call that reached the API and came back parseable.
/// Transport-level failures (rate limit statuses, timeouts, unreachable
/// endpoint) are returned as errors so the retry layer can classify them.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub retry_after: Option<u64>,
    pub data: Option<Value>,
    pub errors: Vec<GraphQLErrorEntry>,
}

/// The seam between the orchestration core and the wire. Production uses the
/// `gh` subprocess; tests use scripted mocks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &GraphQlRequest) -> GhSubResult<TransportResponse>;
}
