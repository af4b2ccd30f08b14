pub const CONFIG_FILE: &str = ".ghsub-config.json";

// Batching
pub const DEFAULT_MAX_BATCH_INTENTS: usize = 50;
// Conservative against the wire service's own payload limits, well under the
// ~32KB argv ceiling the stdin transport already avoids.
pub const DEFAULT_MAX_BODY_BYTES: usize = 24 * 1024;

// Retry/backoff
pub const DEFAULT_RETRY_BASE_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const JITTER_FRACTION: f64 = 0.2;

// Pagination
pub const PAGE_SIZE: u32 = 50;
pub const DEFAULT_MAX_PAGES: usize = 100;

// Common GraphQL field selections
pub const SUB_ISSUE_FIELDS: &str = r#"
    id
    number
    title
    state
"#;

pub const PAGE_INFO_FIELDS: &str = r#"
    endCursor
    hasNextPage
"#;

pub const PROJECT_FIELD_SELECTION: &str = r#"
    ... on ProjectV2FieldCommon {
        id
        name
        dataType
    }
    ... on ProjectV2SingleSelectField {
        options {
            id
            name
        }
    }
"#;
