//! In-memory holder for the short-lived access credential.
//!
//! The credential lives only in process memory: it is never written to disk and
//! a fresh holder always starts empty. Expiry is not predicted here; the request
//! client discovers it when the server answers `401`.

use secrecy::SecretString;
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Credential plus the write generation it was read at.
#[derive(Clone)]
pub struct CredentialSnapshot {
    pub credential: Option<SecretString>,
    pub generation: u64,
}

#[derive(Default)]
struct Slot {
    credential: Option<SecretString>,
    generation: u64,
}

/// Shared cell holding the current bearer credential (or none).
///
/// Clones share the same cell. Every write bumps a generation counter so a
/// caller can tell whether the credential changed while its request was in flight.
#[derive(Clone, Default)]
pub struct CredentialHolder {
    slot: Arc<RwLock<Slot>>,
}

impl CredentialHolder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.snapshot().credential
    }

    pub fn set(&self, credential: Option<SecretString>) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.credential = credential;
        slot.generation = slot.generation.wrapping_add(1);
    }

    pub fn clear(&self) {
        self.set(None);
    }

    /// Writes `credential` only if nothing was written since `generation` was
    /// read. Returns `false` and leaves the holder untouched otherwise.
    pub fn replace_if(&self, generation: u64, credential: Option<SecretString>) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.generation != generation {
            return false;
        }
        slot.credential = credential;
        slot.generation = slot.generation.wrapping_add(1);
        true
    }

    #[must_use]
    pub fn snapshot(&self) -> CredentialSnapshot {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        CredentialSnapshot {
            credential: slot.credential.clone(),
            generation: slot.generation,
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .credential
            .is_some()
    }
}

impl fmt::Debug for CredentialHolder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        formatter
            .debug_struct("CredentialHolder")
            .field("present", &snapshot.credential.is_some())
            .field("generation", &snapshot.generation)
            .finish()
    }
}
