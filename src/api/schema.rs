use serde_json::json;

use crate::api::batch::FieldValue;
use crate::api::pagination::{collect_all, Page};
use crate::api::retry::RetryPolicy;
use crate::client::{extract_data, GraphQlRequest, Transport};
use crate::constants::{DEFAULT_MAX_PAGES, PAGE_INFO_FIELDS, PAGE_SIZE, PROJECT_FIELD_SELECTION};
use crate::error::{GhSubError, GhSubResult};
use crate::logging::log_debug;
use crate::models::graphql::ProjectFieldsData;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldDataType {
    Text,
    Number,
    Date,
    SingleSelect,
    Other(String),
}

impl FieldDataType {
    fn from_api(data_type: &str) -> Self {
        match data_type {
            "TEXT" | "TITLE" => FieldDataType::Text,
            "NUMBER" => FieldDataType::Number,
            "DATE" => FieldDataType::Date,
            "SINGLE_SELECT" => FieldDataType::SingleSelect,
            other => FieldDataType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

/// A resolved project field definition. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub id: String,
    pub name: String,
    pub data_type: FieldDataType,
    pub options: Vec<FieldOption>,
}

impl FieldSchema {
    pub fn option_id(&self, label: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(label))
            .map(|o| o.id.as_str())
    }

    fn option_names(&self) -> String {
        self.options
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Convert a raw CLI value into the typed mutation value for this field.
    pub fn value_for(&self, raw: &str) -> GhSubResult<FieldValue> {
        match &self.data_type {
            FieldDataType::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldDataType::Date => Ok(FieldValue::Date(raw.to_string())),
            FieldDataType::Number => raw.parse::<f64>().map(FieldValue::Number).map_err(|_| {
                GhSubError::InvalidInput(format!(
                    "field '{}' expects a number, got '{}'",
                    self.name, raw
                ))
            }),
            FieldDataType::SingleSelect => match self.option_id(raw) {
                Some(id) => Ok(FieldValue::SingleSelectOption(id.to_string())),
                None => Err(GhSubError::UnknownOption {
                    field: self.name.clone(),
                    value: raw.to_string(),
                    options: self.option_names(),
                }),
            },
            FieldDataType::Other(data_type) => Err(GhSubError::InvalidInput(format!(
                "field '{}' has unsupported type {}",
                self.name, data_type
            ))),
        }
    }
}

/// Memoized field-name lookups for one run. The listing is fetched at most
/// once; everything after is served from memory. Owned by the run's
/// `CliContext` and passed by reference, never a process global.
pub struct FieldSchemaCache {
    fields: Option<Vec<FieldSchema>>,
}

impl FieldSchemaCache {
    pub fn new() -> Self {
        Self { fields: None }
    }

    /// Pre-populated cache, for callers that already hold the schema.
    pub fn from_fields(fields: Vec<FieldSchema>) -> Self {
        Self {
            fields: Some(fields),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.fields.is_some()
    }

    pub fn fields(&self) -> &[FieldSchema] {
        self.fields.as_deref().unwrap_or(&[])
    }

    /// Fetch the project's field listing unless already cached.
    pub async fn ensure_loaded(
        &mut self,
        transport: &dyn Transport,
        project_id: &str,
    ) -> GhSubResult<()> {
        if self.fields.is_some() {
            return Ok(());
        }

        let query = format!(
            r#"
            query($projectId: ID!, $pageSize: Int!, $cursor: String) {{
                node(id: $projectId) {{
                    ... on ProjectV2 {{
                        fields(first: $pageSize, after: $cursor) {{
                            nodes {{{}}}
                            pageInfo {{{}}}
                        }}
                    }}
                }}
            }}
        "#,
            PROJECT_FIELD_SELECTION, PAGE_INFO_FIELDS
        );

        let nodes = collect_all(
            |cursor| {
                let query = query.clone();
                let project_id = project_id.to_string();
                async move {
                    let request = GraphQlRequest::new(
                        query,
                        json!({
                            "projectId": project_id,
                            "pageSize": PAGE_SIZE,
                            "cursor": cursor,
                        }),
                    );
                    let mut policy = RetryPolicy::new();
                    let response = policy.run(|| transport.execute(&request)).await?;
                    let data: ProjectFieldsData = extract_data(response)?;
                    let node = data.node.ok_or_else(|| {
                        GhSubError::MalformedResponse(
                            "project node not found or not a ProjectV2".to_string(),
                        )
                    })?;
                    Ok(Page::from_connection(node.fields))
                }
            },
            DEFAULT_MAX_PAGES,
        )
        .await?;

        let fields: Vec<FieldSchema> = nodes
            .into_iter()
            // Union members outside ProjectV2FieldCommon come back empty.
            .filter_map(|n| match (n.id, n.name) {
                (Some(id), Some(name)) => Some(FieldSchema {
                    id,
                    name,
                    data_type: FieldDataType::from_api(n.data_type.as_deref().unwrap_or("")),
                    options: n
                        .options
                        .unwrap_or_default()
                        .into_iter()
                        .map(|o| FieldOption {
                            id: o.id,
                            name: o.name,
                        })
                        .collect(),
                }),
                _ => None,
            })
            .collect();

        log_debug(&format!("cached {} project fields", fields.len()));
        self.fields = Some(fields);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> GhSubResult<&FieldSchema> {
        let fields = self.fields.as_deref().unwrap_or(&[]);
        fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GhSubError::UnknownField {
                name: name.to_string(),
                available: fields
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Resolve a field plus a single-select option label to its backing id.
    pub fn resolve_option(&self, field_name: &str, label: &str) -> GhSubResult<String> {
        let field = self.resolve(field_name)?;
        match field.option_id(label) {
            Some(id) => Ok(id.to_string()),
            None => Err(GhSubError::UnknownOption {
                field: field.name.clone(),
                value: label.to_string(),
                options: field.option_names(),
            }),
        }
    }
}

impl Default for FieldSchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TransportResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status_field() -> FieldSchema {
        FieldSchema {
            id: "FLD_status".to_string(),
            name: "Status".to_string(),
            data_type: FieldDataType::SingleSelect,
            options: vec![
                FieldOption {
                    id: "OPT_todo".to_string(),
                    name: "Todo".to_string(),
                },
                FieldOption {
                    id: "OPT_done".to_string(),
                    name: "Done".to_string(),
                },
            ],
        }
    }

    fn estimate_field() -> FieldSchema {
        FieldSchema {
            id: "FLD_estimate".to_string(),
            name: "Estimate".to_string(),
            data_type: FieldDataType::Number,
            options: vec![],
        }
    }

    #[test]
    fn resolves_fields_case_insensitively() {
        let cache = FieldSchemaCache::from_fields(vec![status_field(), estimate_field()]);
        assert_eq!(cache.resolve("status").unwrap().id, "FLD_status");
        assert_eq!(cache.resolve("ESTIMATE").unwrap().id, "FLD_estimate");
    }

    #[test]
    fn unknown_field_lists_available_names() {
        let cache = FieldSchemaCache::from_fields(vec![status_field(), estimate_field()]);
        match cache.resolve("Priority") {
            Err(GhSubError::UnknownField { name, available }) => {
                assert_eq!(name, "Priority");
                assert!(available.contains("Status"));
                assert!(available.contains("Estimate"));
            }
            _ => panic!("Expected UnknownField"),
        }
    }

    #[test]
    fn unknown_option_lists_valid_options() {
        let cache = FieldSchemaCache::from_fields(vec![status_field()]);
        assert_eq!(cache.resolve_option("Status", "done").unwrap(), "OPT_done");
        match cache.resolve_option("Status", "Blocked") {
            Err(GhSubError::UnknownOption { field, options, .. }) => {
                assert_eq!(field, "Status");
                assert!(options.contains("Todo"));
                assert!(options.contains("Done"));
            }
            _ => panic!("Expected UnknownOption"),
        }
    }

    #[test]
    fn value_for_respects_the_field_type() {
        let status = status_field();
        assert_eq!(
            status.value_for("Done").unwrap(),
            FieldValue::SingleSelectOption("OPT_done".to_string())
        );

        let estimate = estimate_field();
        assert_eq!(estimate.value_for("3.5").unwrap(), FieldValue::Number(3.5));
        assert!(matches!(
            estimate.value_for("many"),
            Err(GhSubError::InvalidInput(_))
        ));
    }

    struct CountingTransport {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn execute(&self, _request: &GraphQlRequest) -> GhSubResult<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TransportResponse {
                status: 200,
                retry_after: None,
                data: Some(serde_json::json!({
                    "node": {
                        "fields": {
                            "nodes": [
                                { "id": "FLD_1", "name": "Status", "dataType": "SINGLE_SELECT",
                                  "options": [{ "id": "OPT_1", "name": "Todo" }] },
                                {},
                            ],
                            "pageInfo": { "endCursor": null, "hasNextPage": false }
                        }
                    }
                })),
                errors: vec![],
            })
        }
    }

    #[tokio::test]
    async fn listing_is_fetched_at_most_once_per_run() {
        let transport = CountingTransport {
            calls: AtomicU32::new(0),
        };
        let mut cache = FieldSchemaCache::new();

        cache.ensure_loaded(&transport, "PVT_1").await.unwrap();
        cache.ensure_loaded(&transport, "PVT_1").await.unwrap();
        let _ = cache.resolve("Status").unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        // The empty union member was dropped.
        assert_eq!(cache.fields().len(), 1);
    }
}
