//! Asynchronous event transport
//!
//! A bounded in-memory queue feeding a single background worker thread. The
//! worker owns a current-thread tokio runtime and drives one HTTP delivery
//! at a time, in FIFO order. Producers never block and never fail: a full
//! queue drops the event and the send call still returns normally.
//!
//! Delivery is at-most-once, best-effort. A failed send (non-2xx status,
//! network error, timeout) is logged and discarded; the worker never stops
//! and never re-enqueues.
//!
//! There is no implicit shutdown: absent a [`Transport::shutdown`] call the
//! worker runs until the process exits (or until the transport is dropped,
//! which closes the queue and lets the worker drain and finish on its own).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;

/// Queue + background worker responsible for delivering events
pub struct Transport {
    /// `None` once `shutdown` has run; sends are then counted as dropped.
    sender: Mutex<Option<mpsc::Sender<Event>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shared: Arc<Shared>,
}

/// State shared between producers and the worker thread.
struct Shared {
    /// Events enqueued but not yet through a delivery attempt.
    in_flight: Mutex<usize>,
    /// Signaled whenever `in_flight` reaches zero.
    drained: Condvar,
    /// Events discarded because the queue was full or closed.
    dropped: AtomicUsize,
}

impl Shared {
    fn lock_in_flight(&self) -> MutexGuard<'_, usize> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_one(&self) {
        *self.lock_in_flight() += 1;
    }

    fn complete_one(&self) {
        let mut in_flight = self.lock_in_flight();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.drained.notify_all();
        }
    }
}

impl Transport {
    /// Build the HTTP client, start the worker thread, and return.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = format!("Bearer {}", config.token);
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| Error::Config(format!("invalid token: {}", e)))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let shared = Arc::new(Shared {
            in_flight: Mutex::new(0),
            drained: Condvar::new(),
            dropped: AtomicUsize::new(0),
        });

        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let endpoint = config.endpoint.clone();
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("faultline-transport".to_string())
            .spawn(move || worker_loop(receiver, http_client, endpoint, worker_shared))
            .map_err(|e| Error::Transport(format!("failed to spawn delivery worker: {}", e)))?;

        Ok(Transport {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            shared,
        })
    }

    /// Enqueue an event for delivery without blocking.
    ///
    /// If the queue is at capacity (or the transport has been shut down) the
    /// event is dropped, the drop counter is bumped, and the call still
    /// returns normally.
    pub fn send(&self, event: Event) {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(event_id = %event.event_id, "transport closed, event dropped");
            return;
        };

        // Counted before the enqueue so the worker can never complete an
        // event that flush does not yet see.
        self.shared.begin_one();
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.shared.complete_one();
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(event_id = %event.event_id, "queue full, event dropped");
            }
            Err(TrySendError::Closed(event)) => {
                self.shared.complete_one();
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(event_id = %event.event_id, "worker gone, event dropped");
            }
        }
    }

    /// Wait up to `timeout` for every currently-enqueued event to finish a
    /// delivery attempt.
    ///
    /// Returns `true` if the queue drained, `false` if the timeout elapsed
    /// first. Never panics and never blocks past the timeout; meant for the
    /// crash path, where it is a soft deadline rather than a guarantee.
    pub fn flush(&self, timeout: Duration) -> bool {
        let in_flight = self.shared.lock_in_flight();
        match self
            .shared
            .drained
            .wait_timeout_while(in_flight, timeout, |pending| *pending > 0)
        {
            Ok((_, wait_result)) => !wait_result.timed_out(),
            Err(_) => false,
        }
    }

    /// Optional clean shutdown: stop accepting events, drain best-effort
    /// within `timeout`, then stop and join the worker.
    ///
    /// Returns the flush outcome. Calling this is never required; the
    /// baseline design lets the worker live for the process lifetime.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            // Already shut down.
            return true;
        }

        let drained = self.flush(timeout);
        // Dropping the last sender closes the queue; the worker exits after
        // draining whatever is still buffered.
        drop(sender);
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = worker {
            let _ = handle.join();
        }
        drained
    }

    /// Number of events dropped because the queue was full or closed.
    pub fn dropped_events(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

/// Drain the queue in FIFO order, delivering one event at a time.
fn worker_loop(
    mut receiver: mpsc::Receiver<Event>,
    http_client: reqwest::Client,
    endpoint: String,
    shared: Arc<Shared>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to build delivery runtime, discarding events");
            while receiver.blocking_recv().is_some() {
                shared.dropped.fetch_add(1, Ordering::Relaxed);
                shared.complete_one();
            }
            return;
        }
    };

    while let Some(event) = receiver.blocking_recv() {
        if let Err(e) = runtime.block_on(deliver(&http_client, &endpoint, &event)) {
            tracing::warn!(event_id = %event.event_id, error = %e, "event delivery failed");
        }
        shared.complete_one();
    }
}

/// POST one serialized event to the collector. Any 2xx status is success.
async fn deliver(http_client: &reqwest::Client, endpoint: &str, event: &Event) -> Result<()> {
    let response = http_client.post(endpoint).json(event).send().await?;
    let status = response.status();
    if status.is_success() {
        tracing::debug!(event_id = %event.event_id, status = %status, "event delivered");
        Ok(())
    } else {
        Err(Error::Transport(format!("collector returned {}", status)))
    }
}
