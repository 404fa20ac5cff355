//! Client configuration
//!
//! All configuration is passed explicitly at initialization; faultline reads
//! no environment variables and no config files. Construct with
//! [`Config::new`] and adjust defaults through the `with_*` methods.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default per-request delivery timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default capacity of the pending-event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Configuration for a [`Client`](crate::Client)
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token sent in the `Authorization` header
    pub token: String,
    /// Collector ingestion URL (events are POSTed here)
    pub endpoint: String,
    /// Environment name attached to every event
    pub environment: String,
    /// Service name attached to every event
    pub service_name: String,
    /// Per-request timeout for event delivery
    pub timeout: Duration,
    /// Capacity of the pending-event queue; events beyond it are dropped
    pub queue_capacity: usize,
    /// Whether `init` installs the process-wide crash reporting hook
    pub install_panic_hook: bool,
    /// Whether `init` installs the worker-thread panic reporting path
    pub install_thread_hook: bool,
}

impl Config {
    /// Create a configuration with defaults for everything but credentials.
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Config {
            token: token.into(),
            endpoint: endpoint.into(),
            environment: "production".to_string(),
            service_name: "default-service".to_string(),
            timeout: DEFAULT_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            install_panic_hook: true,
            install_thread_hook: true,
        }
    }

    /// Set the environment name.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the service name.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    /// Set the per-request delivery timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the pending-event queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Control installation of the process-wide crash reporting hook.
    pub fn with_panic_hook(mut self, install: bool) -> Self {
        self.install_panic_hook = install;
        self
    }

    /// Control installation of the worker-thread panic reporting path.
    pub fn with_thread_hook(mut self, install: bool) -> Self {
        self.install_thread_hook = install;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint is required".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
