//! Reporting client
//!
//! A [`Client`] owns its configuration and one [`Transport`]. It builds
//! events and hands them to the transport; every capture method is
//! fire-and-forget and infallible. Clients are self-contained: tests and
//! callers needing isolated configurations can construct as many as they
//! want without touching the process-wide slot (see [`crate::state`]).

use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::event::{Event, EventContext, ExceptionInfo, Extra, Tags};
use crate::transport::Transport;

/// Error/event reporting client
pub struct Client {
    config: Config,
    context: EventContext,
    transport: Transport,
}

impl Client {
    /// Validate the configuration and start the delivery transport.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = Transport::new(&config)?;
        let context = EventContext {
            environment: config.environment.clone(),
            service_name: config.service_name.clone(),
        };
        Ok(Client {
            config,
            context,
            transport,
        })
    }

    /// Report captured exception details with optional tags and extra data.
    pub fn capture_exception(&self, info: ExceptionInfo, tags: Option<Tags>, extra: Option<Extra>) {
        let event = Event::exception(&self.context, info, tags, extra);
        self.transport.send(event);
    }

    /// Report an error value.
    pub fn capture_error<E: std::error::Error + ?Sized>(&self, err: &E) {
        self.capture_error_with(err, None, None);
    }

    /// Report an error value with optional tags and extra data.
    pub fn capture_error_with<E: std::error::Error + ?Sized>(
        &self,
        err: &E,
        tags: Option<Tags>,
        extra: Option<Extra>,
    ) {
        self.capture_exception(ExceptionInfo::from_error(err), tags, extra);
    }

    /// Report a message event. `level` is free-form; see [`crate::event::level`].
    pub fn capture_message(&self, text: &str, level: &str) {
        self.capture_message_with(text, level, None, None);
    }

    /// Report a message event with optional tags and extra data.
    pub fn capture_message_with(
        &self,
        text: &str,
        level: &str,
        tags: Option<Tags>,
        extra: Option<Extra>,
    ) {
        let event = Event::message(&self.context, text, level, tags, extra);
        self.transport.send(event);
    }

    /// Best-effort drain of the pending queue; see [`Transport::flush`].
    pub fn flush(&self, timeout: Duration) -> bool {
        self.transport.flush(timeout)
    }

    /// Optional clean shutdown of the transport; see [`Transport::shutdown`].
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.transport.shutdown(timeout)
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of events this client's transport has dropped.
    pub fn dropped_events(&self) -> usize {
        self.transport.dropped_events()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint)
            .field("environment", &self.config.environment)
            .field("service_name", &self.config.service_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_valid_config() {
        let config = Config::new("tok", "");
        assert!(Client::new(config).is_err());
    }

    #[test]
    fn test_client_with_valid_config() {
        let config = Config::new("tok", "http://127.0.0.1:0/ingest");
        let client = Client::new(config).expect("client starts");
        assert_eq!(client.config().environment, "production");
        assert_eq!(client.dropped_events(), 0);
    }

    #[test]
    fn test_debug_hides_token() {
        let config = Config::new("secret-token", "http://127.0.0.1:0/ingest");
        let client = Client::new(config).expect("client starts");
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("secret-token"));
    }
}
