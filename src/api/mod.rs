pub mod batch;
pub mod hierarchy;
pub mod lookup;
pub mod pagination;
pub mod retry;
pub mod schema;

pub use batch::{demux, BatchBuilder, BatchRequest, FieldValue, IntentOutcome, MutationIntent};
pub use hierarchy::{FieldChange, HierarchyWalker, NodeResult, NodeStatus, TraversalReport};
pub use pagination::{collect_all, Page};
pub use retry::RetryPolicy;
pub use schema::{FieldDataType, FieldOption, FieldSchema, FieldSchemaCache};
