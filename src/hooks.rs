//! Panic reporting hooks
//!
//! Rust exposes one process-wide panic hook that runs on the panicking
//! thread, so the two logical hooks (crash reporting for the main thread,
//! panic reporting for worker threads) share a single installed hook and
//! dispatch on the current thread.
//!
//! Installation is idempotent and install-once-per-process: each logical
//! hook has its own first-writer-wins flag, and the underlying
//! `std::panic::set_hook` replacement happens exactly once no matter how
//! many times the installers run. The previously registered hook is
//! captured at that moment and is always invoked after reporting, so
//! pre-existing panic output is preserved.
//!
//! The reporting body must never panic itself; it runs under
//! `catch_unwind` and swallows everything.

use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread::ThreadId;
use std::time::Duration;

use crate::client::Client;
use crate::event::ExceptionInfo;
use crate::state;

static GLOBAL_INSTALLED: AtomicBool = AtomicBool::new(false);
static THREAD_INSTALLED: AtomicBool = AtomicBool::new(false);
static HOOK_SET: AtomicBool = AtomicBool::new(false);

/// Id of the thread that installed the hook. Installation happens during
/// `init`, which runs on the main thread, so this identifies the thread
/// whose panic means the process is exiting. Thread names are not used:
/// any thread can be named "main".
static MAIN_THREAD: OnceLock<ThreadId> = OnceLock::new();

/// How long the crash path waits for the queue to drain before the process
/// dies and takes the delivery worker with it.
const CRASH_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Install crash reporting for panics on the main thread.
///
/// Returns `false` if already installed. The hook reports through the
/// active client, flushes the transport with a short bound (the process is
/// about to terminate), and then forwards to the previous hook.
pub fn install_global_hook() -> bool {
    if GLOBAL_INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return false;
    }
    ensure_hook();
    true
}

/// Install panic reporting for threads other than main.
///
/// Returns `false` if already installed. Same reporting path as the global
/// hook but without the flush: a worker-thread panic does not end the
/// process, so the delivery worker survives to drain the queue normally.
pub fn install_thread_hook() -> bool {
    if THREAD_INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return false;
    }
    ensure_hook();
    true
}

/// Replace the process panic hook, once, chaining to whatever was there.
fn ensure_hook() {
    if HOOK_SET
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    let _ = MAIN_THREAD.set(std::thread::current().id());
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        // A failure while reporting must not mask the original panic.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| report_panic(info)));
        previous(info);
    }));
}

/// Dispatch a panic to whichever logical hook covers the current thread.
fn report_panic(info: &PanicHookInfo<'_>) {
    let on_main_thread = MAIN_THREAD.get().copied() == Some(std::thread::current().id());
    let enabled = if on_main_thread {
        GLOBAL_INSTALLED.load(Ordering::SeqCst)
    } else {
        THREAD_INSTALLED.load(Ordering::SeqCst)
    };
    if !enabled {
        return;
    }
    let Some(client) = state::client() else {
        return;
    };
    report_to(&client, info, on_main_thread);
}

/// Build and send the panic event; flush when the process is crashing.
fn report_to(client: &Client, info: &PanicHookInfo<'_>, crashing: bool) {
    client.capture_exception(ExceptionInfo::from_panic(info), None, None);
    if crashing {
        client.flush(CRASH_FLUSH_TIMEOUT);
    }
}
