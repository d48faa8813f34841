//! Configuration for bulk fetch operations

use std::time::Duration;

use sable_domain::{Result, SableError};

/// Configuration for bulk fetch behavior
#[derive(Debug, Clone)]
pub struct BulkFetchConfig {
    /// Maximum number of fetch tasks in flight per bulk call
    pub max_concurrent: usize,
    /// Page size used by query-driven bulk fetches
    pub page_size: usize,
    /// How long a submission waits for a free slot before running the fetch
    /// inline on the submitting task. `None` blocks until a slot frees.
    pub admission_wait: Option<Duration>,
    /// Attempts per listing page before the bulk call aborts
    pub max_page_attempts: usize,
    /// Base delay between listing page retries, doubled per retry
    pub page_retry_backoff: Duration,
}

impl Default for BulkFetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 30,
            page_size: 250,
            admission_wait: Some(Duration::from_millis(100)),
            max_page_attempts: 3,
            page_retry_backoff: Duration::from_millis(200),
        }
    }
}

impl BulkFetchConfig {
    /// Create a new configuration builder
    pub fn builder() -> BulkFetchConfigBuilder {
        BulkFetchConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(SableError::InvalidInput("max_concurrent must be greater than 0".into()));
        }
        if self.page_size == 0 {
            return Err(SableError::InvalidInput("page_size must be greater than 0".into()));
        }
        if self.max_page_attempts == 0 {
            return Err(SableError::InvalidInput(
                "max_page_attempts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`BulkFetchConfig`]
#[derive(Debug)]
pub struct BulkFetchConfigBuilder {
    config: BulkFetchConfig,
}

impl Default for BulkFetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BulkFetchConfigBuilder {
    pub fn new() -> Self {
        Self { config: BulkFetchConfig::default() }
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.max_concurrent = max;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Bound the admission wait; an elapsed wait runs the fetch inline.
    pub fn admission_wait(mut self, wait: Duration) -> Self {
        self.config.admission_wait = Some(wait);
        self
    }

    /// Block submissions until a slot frees instead of falling back inline.
    pub fn block_until_admitted(mut self) -> Self {
        self.config.admission_wait = None;
        self
    }

    pub fn max_page_attempts(mut self, attempts: usize) -> Self {
        self.config.max_page_attempts = attempts;
        self
    }

    pub fn page_retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.page_retry_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<BulkFetchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
