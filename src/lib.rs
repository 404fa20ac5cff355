//! # faultline
//!
//! Error and event reporting client: capture exceptions and messages from
//! application code, normalize them into events, and deliver them to a
//! remote collector without ever blocking the caller or changing how the
//! host process fails.
//!
//! This library provides:
//! - An immutable event model with exception and message kinds
//! - A bounded queue + background worker transport (non-blocking sends,
//!   drop-on-full, best-effort crash-time flush)
//! - Idempotent panic-hook installation that chains to the previous hook
//! - Call and scope wrappers that report a panic and let it continue
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! let _client = faultline::init(
//!     faultline::Config::new("token", "https://collector.example.com/ingest")
//!         .with_environment("staging")
//!         .with_service_name("billing"),
//! )
//! .expect("faultline init");
//!
//! faultline::capture_message("service started", faultline::level::INFO);
//!
//! if let Err(err) = std::fs::read("state.bin") {
//!     faultline::capture_error(&err);
//! }
//!
//! // Give queued events a chance to leave before exiting.
//! faultline::flush(Duration::from_secs(2));
//! ```
//!
//! Every capture entry point is a no-op until [`init`] has run; calling the
//! library uninitialized is safe by design.

// Re-export commonly used items at the crate root
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use event::{level, Event, EventKind, ExceptionInfo, Extra, Tags};
pub use hooks::{install_global_hook, install_thread_hook};
pub use scope::{capture_call, capture_result, capture_scope, CaptureScope};
pub use state::client;

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod hooks;
pub mod scope;
pub mod state;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

/// Initialize the process-wide client and install the panic hooks the
/// configuration asks for.
///
/// Call once, as early as possible. Calling again replaces the active
/// client (the old client's queue is neither drained nor transferred);
/// hooks stay installed from the first call.
pub fn init(config: Config) -> Result<Arc<Client>> {
    let install_global = config.install_panic_hook;
    let install_thread = config.install_thread_hook;

    let client = Arc::new(Client::new(config)?);
    state::set_client(Arc::clone(&client));

    if install_global {
        hooks::install_global_hook();
    }
    if install_thread {
        hooks::install_thread_hook();
    }
    Ok(client)
}

/// Report an error value through the active client, if any.
pub fn capture_error<E: std::error::Error + ?Sized>(err: &E) {
    if let Some(client) = state::client() {
        client.capture_error(err);
    }
}

/// Report an error value with tags and extra data through the active
/// client, if any.
pub fn capture_error_with<E: std::error::Error + ?Sized>(
    err: &E,
    tags: Option<Tags>,
    extra: Option<Extra>,
) {
    if let Some(client) = state::client() {
        client.capture_error_with(err, tags, extra);
    }
}

/// Report explicit exception details through the active client, if any.
pub fn capture_exception(info: ExceptionInfo, tags: Option<Tags>, extra: Option<Extra>) {
    if let Some(client) = state::client() {
        client.capture_exception(info, tags, extra);
    }
}

/// Report a message through the active client, if any.
pub fn capture_message(text: &str, level: &str) {
    if let Some(client) = state::client() {
        client.capture_message(text, level);
    }
}

/// Report a message with tags and extra data through the active client, if
/// any.
pub fn capture_message_with(text: &str, level: &str, tags: Option<Tags>, extra: Option<Extra>) {
    if let Some(client) = state::client() {
        client.capture_message_with(text, level, tags, extra);
    }
}

/// Best-effort drain of the active client's queue. With no active client
/// there is nothing pending and this returns `true`.
pub fn flush(timeout: Duration) -> bool {
    match state::client() {
        Some(client) => client.flush(timeout),
        None => true,
    }
}
