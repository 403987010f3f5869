//! Client configuration

use std::time::Duration;

/// Floor client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote service's REST surface
    pub base_url: String,
    /// Push channel address (host:port); `None` runs poll-only
    pub push_addr: Option<String>,
    /// Cadence of the last-QR/last-food telemetry poll
    pub telemetry_poll_interval: Duration,
    /// Cadence of the pending-detection poll
    pub pending_poll_interval: Duration,
    /// Cadence of the unconditional full-collection backstop refresh
    pub collection_refresh_interval: Duration,
    /// How long a delay warning stays visible
    pub delay_warning_ttl: Duration,
    /// Delay between push-channel reconnect attempts
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            push_addr: None,
            telemetry_poll_interval: Duration::from_millis(1000),
            pending_poll_interval: Duration::from_millis(1500),
            collection_refresh_interval: Duration::from_secs(30),
            delay_warning_ttl: Duration::from_millis(5000),
            reconnect_delay: Duration::from_millis(5000),
        }
    }
}

impl ClientConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment
    ///
    /// Recognized variables: `GASTRO_BASE_URL`, `GASTRO_PUSH_ADDR`.
    /// Everything else keeps its default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GASTRO_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(addr) = std::env::var("GASTRO_PUSH_ADDR") {
            config.push_addr = Some(addr);
        }
        config
    }

    /// Set the REST base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the push channel address
    pub fn with_push_addr(mut self, addr: impl Into<String>) -> Self {
        self.push_addr = Some(addr.into());
        self
    }

    /// Set the pending-detection poll cadence
    pub fn with_pending_poll_interval(mut self, interval: Duration) -> Self {
        self.pending_poll_interval = interval;
        self
    }

    /// Set the telemetry poll cadence
    pub fn with_telemetry_poll_interval(mut self, interval: Duration) -> Self {
        self.telemetry_poll_interval = interval;
        self
    }

    /// Set the backstop collection refresh cadence
    pub fn with_collection_refresh_interval(mut self, interval: Duration) -> Self {
        self.collection_refresh_interval = interval;
        self
    }

    /// Set the delay warning display duration
    pub fn with_delay_warning_ttl(mut self, ttl: Duration) -> Self {
        self.delay_warning_ttl = ttl;
        self
    }
}
