//! Process-wide active client slot
//!
//! A single slot holds the client that global capture functions report
//! through. Last writer wins; replacing the client does not drain or merge
//! the old one's queue. Readers see either nothing or a complete client,
//! never a partial write.
//!
//! Code that needs isolated configurations (tests, embedded libraries)
//! should construct [`Client`] instances directly and skip this slot.

use std::sync::{Arc, PoisonError, RwLock};

use crate::client::Client;

static ACTIVE: RwLock<Option<Arc<Client>>> = RwLock::new(None);

/// Install `client` as the process-wide active client.
pub fn set_client(client: Arc<Client>) {
    let mut slot = ACTIVE.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(client);
}

/// The currently active client, if one has been installed.
pub fn client() -> Option<Arc<Client>> {
    let slot = ACTIVE.read().unwrap_or_else(PoisonError::into_inner);
    slot.clone()
}
