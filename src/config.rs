//! Pipeline tunables.

use crate::checkpoint::DEFAULT_CHECKPOINT_INTERVAL;
use crate::error::{PubmetaError, Result};
use crate::retry::RetryPolicy;
use std::time::Duration;

/// Default delay between per-publication detail fetches.
pub const DETAIL_DELAY: Duration = Duration::from_millis(400);

/// Default delay between preprint title searches.
pub const LINK_DELAY: Duration = Duration::from_millis(200);

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the collector and link resolver.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub checkpoint_every: usize,
    pub detail_delay: Duration,
    pub link_delay: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Proxy URL (e.g., http://127.0.0.1:7890)
    pub proxy: Option<String>,
    /// Google Scholar mirror base URL
    pub mirror: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: DEFAULT_CHECKPOINT_INTERVAL,
            detail_delay: DETAIL_DELAY,
            link_delay: LINK_DELAY,
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            proxy: None,
            mirror: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.checkpoint_every == 0 {
            return Err(PubmetaError::Config(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(PubmetaError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(PubmetaError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
