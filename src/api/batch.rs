use std::collections::HashMap;

use serde_json::Value;

use crate::client::{GraphQlRequest, TransportResponse};
use crate::constants::{DEFAULT_MAX_BATCH_INTENTS, DEFAULT_MAX_BODY_BYTES};

/// A typed project-field value, rendered into the mutation input.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(String),
    SingleSelectOption(String),
}

impl FieldValue {
    fn render(&self) -> String {
        match self {
            // serde_json string rendering doubles as GraphQL string quoting.
            FieldValue::Text(text) => format!("{{ text: {} }}", quote(text)),
            FieldValue::Number(n) => format!("{{ number: {} }}", n),
            FieldValue::Date(date) => format!("{{ date: {} }}", quote(date)),
            FieldValue::SingleSelectOption(id) => {
                format!("{{ singleSelectOptionId: {} }}", quote(id))
            }
        }
    }
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// One requested field change. Never mutated in place; a retry re-sends the
/// rendered document as-is.
#[derive(Debug, Clone)]
pub struct MutationIntent {
    pub project_id: String,
    pub item_id: String,
    pub field_id: String,
    pub value: FieldValue,
}

impl MutationIntent {
    fn render(&self, alias: &str) -> String {
        format!(
            "{}: updateProjectV2ItemFieldValue(input: {{ projectId: {}, itemId: {}, fieldId: {}, value: {} }}) {{ projectV2Item {{ id }} }}",
            alias,
            quote(&self.project_id),
            quote(&self.item_id),
            quote(&self.field_id),
            self.value.render()
        )
    }
}

/// A group of intents sent as one aliased wire call.
#[derive(Debug)]
pub struct BatchRequest {
    pub document: String,
    pub intents: Vec<MutationIntent>,
    pub aliases: Vec<String>,
    alias_index: HashMap<String, usize>,
}

impl BatchRequest {
    pub fn to_request(&self) -> GraphQlRequest {
        GraphQlRequest::without_variables(self.document.clone())
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Outcome of one intent after its batch response was demultiplexed.
#[derive(Debug, Clone)]
pub struct IntentOutcome {
    pub item_id: String,
    pub alias: String,
    pub error: Option<String>,
}

impl IntentOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Packs mutation intents into aliased batch documents under a count ceiling
/// and an estimated body-size ceiling. Both bounds are hard; a batch closes
/// as soon as the next intent would cross either one.
pub struct BatchBuilder {
    max_intents: usize,
    max_body_bytes: usize,
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self {
            max_intents: DEFAULT_MAX_BATCH_INTENTS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_intents(mut self, max: usize) -> Self {
        self.max_intents = max.max(1);
        self
    }

    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    pub fn build(&self, intents: Vec<MutationIntent>) -> Vec<BatchRequest> {
        let mut batches = Vec::new();
        let mut current: Vec<(String, String, MutationIntent)> = Vec::new();
        let mut current_bytes = 0usize;

        for intent in intents {
            let alias = format!("m{}", current.len());
            let rendered = intent.render(&alias);

            let over_count = current.len() >= self.max_intents;
            let over_bytes =
                !current.is_empty() && current_bytes + rendered.len() > self.max_body_bytes;
            if over_count || over_bytes {
                batches.push(Self::close(std::mem::take(&mut current)));
                current_bytes = 0;
                // Re-alias against the new batch's numbering.
                let alias = "m0".to_string();
                let rendered = intent.render(&alias);
                current_bytes += rendered.len();
                current.push((alias, rendered, intent));
                continue;
            }

            current_bytes += rendered.len();
            current.push((alias, rendered, intent));
        }

        if !current.is_empty() {
            batches.push(Self::close(current));
        }

        batches
    }

    fn close(parts: Vec<(String, String, MutationIntent)>) -> BatchRequest {
        let mut aliases = Vec::with_capacity(parts.len());
        let mut intents = Vec::with_capacity(parts.len());
        let mut rendered = Vec::with_capacity(parts.len());
        let mut alias_index = HashMap::with_capacity(parts.len());

        for (i, (alias, body, intent)) in parts.into_iter().enumerate() {
            alias_index.insert(alias.clone(), i);
            aliases.push(alias);
            rendered.push(body);
            intents.push(intent);
        }

        BatchRequest {
            document: format!("mutation {{ {} }}", rendered.join(" ")),
            intents,
            aliases,
            alias_index,
        }
    }
}

/// Map an aliased batch response back to one outcome per intent, in input
/// order. An alias that the `errors` array names, or that is missing or null
/// in `data`, failed with that specific reason; its siblings stand. Partial
/// success is a normal outcome, not a batch error.
pub fn demux(batch: &BatchRequest, response: &TransportResponse) -> Vec<IntentOutcome> {
    let mut alias_errors: HashMap<&str, String> = HashMap::new();
    for entry in &response.errors {
        let alias = entry
            .path
            .as_ref()
            .and_then(|p| p.first())
            .and_then(Value::as_str);
        match alias {
            Some(alias) if batch.alias_index.contains_key(alias) => {
                alias_errors.insert(
                    batch.aliases[batch.alias_index[alias]].as_str(),
                    entry.message.clone(),
                );
            }
            // An error with no usable path applies to the whole document.
            _ => {
                return batch
                    .intents
                    .iter()
                    .zip(&batch.aliases)
                    .map(|(intent, alias)| IntentOutcome {
                        item_id: intent.item_id.clone(),
                        alias: alias.clone(),
                        error: Some(entry.message.clone()),
                    })
                    .collect();
            }
        }
    }

    let data = response.data.as_ref();
    batch
        .intents
        .iter()
        .zip(&batch.aliases)
        .map(|(intent, alias)| {
            let error = if let Some(message) = alias_errors.get(alias.as_str()) {
                Some(message.clone())
            } else {
                match data.and_then(|d| d.get(alias.as_str())) {
                    Some(value) if !value.is_null() => None,
                    _ => Some(format!("no result returned for alias {}", alias)),
                }
            };
            IntentOutcome {
                item_id: intent.item_id.clone(),
                alias: alias.clone(),
                error,
            }
        })
        .collect()
}
