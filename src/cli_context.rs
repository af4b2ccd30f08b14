use std::sync::Arc;

use crate::api::FieldSchemaCache;
use crate::client::{GhTransport, Transport};
use crate::config::{load_config, Config};
use crate::error::GhSubResult;

/// Per-run wiring: the transport and the run-scoped schema cache. Each
/// command invocation builds its own context, so repeated invocations in one
/// process stay isolated.
pub struct CliContext {
    transport: Arc<dyn Transport>,
    pub schema_cache: FieldSchemaCache,
    pub config: Config,
}

impl CliContext {
    pub fn load() -> GhSubResult<Self> {
        Ok(Self {
            transport: Arc::new(GhTransport::new()),
            schema_cache: FieldSchemaCache::new(),
            config: load_config(),
        })
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }
}

/// Builder used by tests to swap in a scripted transport or canned config.
pub struct CliContextBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: Option<Config>,
    schema_cache: Option<FieldSchemaCache>,
}

impl CliContextBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            config: None,
            schema_cache: None,
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_schema_cache(mut self, cache: FieldSchemaCache) -> Self {
        self.schema_cache = Some(cache);
        self
    }

    pub fn build(self) -> CliContext {
        CliContext {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(GhTransport::new())),
            schema_cache: self.schema_cache.unwrap_or_default(),
            config: self.config.unwrap_or_default(),
        }
    }
}

impl Default for CliContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
