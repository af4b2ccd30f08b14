use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::transport::TransportResponse;
use crate::error::{GhSubError, GhSubResult};

/// One GraphQL document plus its variables, serialized as the wire body.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }

    pub fn without_variables(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Null,
        }
    }
}

/// Deserialize the `data` payload, treating any GraphQL-level error as fatal.
/// Batch responses go through `batch::demux` instead, which attributes errors
/// per alias rather than failing the whole call.
pub fn extract_data<T>(response: TransportResponse) -> GhSubResult<T>
where
    T: DeserializeOwned,
{
    if !response.errors.is_empty() {
        let messages = response
            .errors
            .iter()
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(GhSubError::GraphQLError(messages));
    }

    match response.data {
        Some(data) => serde_json::from_value(data).map_err(GhSubError::from),
        None => Err(GhSubError::MalformedResponse(
            "no data in response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GraphQLErrorEntry;
    use serde_json::json;

    #[test]
    fn request_body_serializes_query_and_variables() {
        let request = GraphQlRequest::new("query { viewer { login } }", json!({"first": 50}));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["query"], "query { viewer { login } }");
        assert_eq!(body["variables"]["first"], 50);
    }

    #[test]
    fn extract_data_surfaces_graphql_errors() {
        let response = TransportResponse {
            status: 200,
            retry_after: None,
            data: Some(json!({"node": null})),
            errors: vec![GraphQLErrorEntry {
                message: "Could not resolve to a node".to_string(),
                path: None,
                error_type: Some("NOT_FOUND".to_string()),
            }],
        };

        let result: GhSubResult<Value> = extract_data(response);
        match result {
            Err(GhSubError::GraphQLError(msg)) => assert!(msg.contains("Could not resolve")),
            _ => panic!("Expected GraphQLError"),
        }
    }

    #[test]
    fn extract_data_rejects_missing_data() {
        let response = TransportResponse {
            status: 200,
            retry_after: None,
            data: None,
            errors: vec![],
        };
        let result: GhSubResult<Value> = extract_data(response);
        assert!(matches!(result, Err(GhSubError::MalformedResponse(_))));
    }
}
