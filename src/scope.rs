//! Capture wrappers
//!
//! Convenience layers over the active client: run a closure or guard a
//! scope, report any panic that escapes it, and let the panic continue
//! unchanged. The wrappers observe failures; they never swallow or alter
//! them.

use std::panic::{self, UnwindSafe};

use crate::event::{payload_message, ExceptionInfo};
use crate::state;

/// Run `f`, reporting any panic through the active client before resuming
/// the unwind with the original payload.
///
/// On success the return value passes through untouched. With no active
/// client the panic still propagates unchanged.
pub fn capture_call<F, R>(f: F) -> R
where
    F: FnOnce() -> R + UnwindSafe,
{
    match panic::catch_unwind(f) {
        Ok(value) => value,
        Err(payload) => {
            if let Some(client) = state::client() {
                let message = payload_message(payload.as_ref());
                client.capture_exception(ExceptionInfo::panic(message, Vec::new()), None, None);
            }
            panic::resume_unwind(payload)
        }
    }
}

/// Pass a `Result` through, reporting the error through the active client
/// on the way.
pub fn capture_result<T, E>(result: Result<T, E>) -> Result<T, E>
where
    E: std::error::Error,
{
    if let Err(ref err) = result {
        if let Some(client) = state::client() {
            client.capture_error(err);
        }
    }
    result
}

/// Guard that reports a panic unwinding through its scope
///
/// Created by [`capture_scope`]. On normal exit the drop does nothing; when
/// the scope exits by panic the guard reports once, whatever the exit path.
/// The payload is not reachable mid-unwind, so the event carries a fixed
/// message; the panic hook (if installed) still reports the full details.
#[derive(Debug)]
pub struct CaptureScope {
    _private: (),
}

/// Guard the enclosing scope; see [`CaptureScope`].
#[must_use = "the guard reports only while it is alive"]
pub fn capture_scope() -> CaptureScope {
    CaptureScope { _private: () }
}

impl Drop for CaptureScope {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        // A second panic here would abort the process mid-unwind.
        let _ = panic::catch_unwind(|| {
            if let Some(client) = state::client() {
                client.capture_exception(
                    ExceptionInfo::panic("panic inside guarded scope".to_string(), Vec::new()),
                    None,
                    None,
                );
            }
        });
    }
}
