use crate::core::config::EngineConfig;
use crate::core::locator::LocatorRef;
use crate::core::logging::{LogSink, TracingSink};
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Navigable page handle; its lifecycle belongs to the caller.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Locate elements matching a selector anywhere on the page
    fn locator(&self, selector: &str) -> LocatorRef;

    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current page URL
    async fn url(&self) -> Result<String>;

    /// Fixed pause between interactions
    async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// What every field and button needs from its surroundings.
#[derive(Clone)]
pub struct PageBinding {
    pub page: Arc<dyn PageHandle>,
    pub config: Arc<EngineConfig>,
    pub sink: Arc<dyn LogSink>,
}

impl PageBinding {
    pub fn new(page: Arc<dyn PageHandle>) -> Self {
        Self {
            page,
            config: Arc::new(EngineConfig::default()),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }
}
