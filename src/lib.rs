// Module declarations
pub mod api;
pub mod cli_context;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;

// Re-export commonly used items
pub use api::{
    BatchBuilder, FieldChange, FieldSchema, FieldSchemaCache, FieldValue, HierarchyWalker,
    MutationIntent, NodeStatus, RetryPolicy, TraversalReport,
};
pub use cli_context::{CliContext, CliContextBuilder};
pub use client::{GhTransport, GraphQlRequest, Transport, TransportResponse};
pub use config::{load_config, save_config, Config};
pub use error::{GhSubError, GhSubResult};
pub use models::*;
