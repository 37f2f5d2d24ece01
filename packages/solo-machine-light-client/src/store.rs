//! Client persistence.
//!
//! [`ClientStore`] serializes verifications per client: it holds a lock keyed
//! by client id for the whole load, verify and save sequence, while
//! verifications of different clients run in parallel. A lock entry lives only
//! as long as some caller holds or waits on it.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use ibc_solo_machine_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{
    client_state::ClientState,
    error::{SoloMachineError, StoreError},
    proof::{ProofCodec, DEFAULT_MAX_PROOF_SIZE},
};

/// Ordered key-value store the client state is persisted in.
pub trait KvStore: Send + Sync {
    /// Value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    /// Stores `value` under `key`.
    fn set(&self, key: &[u8], value: Vec<u8>);
}

/// In-memory [`KvStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &[u8], value: Vec<u8>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_vec(), value);
    }
}

/// Where and how client states are stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientStoreConfig {
    /// Key prefix under which all clients live
    pub key_prefix: String,
    /// Key of the client state below a client's prefix
    pub client_state_key: String,
    /// Largest accepted proof in bytes
    pub max_proof_size: usize,
}

impl Default for ClientStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "clients".to_string(),
            client_state_key: "clientState".to_string(),
            max_proof_size: DEFAULT_MAX_PROOF_SIZE,
        }
    }
}

impl ClientStoreConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Store key of the client state of `client_id`.
    #[must_use]
    pub fn client_state_key(&self, client_id: &str) -> Vec<u8> {
        format!("{}/{client_id}/{}", self.key_prefix, self.client_state_key).into_bytes()
    }
}

/// Loads, verifies and saves client states.
#[derive(Debug)]
pub struct ClientStore<S> {
    store: S,
    config: ClientStoreConfig,
    codec: ProofCodec,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: KvStore> ClientStore<S> {
    /// Wraps `store`.
    #[must_use]
    pub fn new(store: S, config: ClientStoreConfig) -> Self {
        Self {
            store,
            codec: ProofCodec::new(config.max_proof_size),
            config,
            locks: Mutex::default(),
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.store
    }

    /// The codec used for verification.
    #[must_use]
    pub const fn codec(&self) -> &ProofCodec {
        &self.codec
    }

    /// Validates and stores a new client.
    ///
    /// # Errors
    /// Returns a validation error, or [`StoreError::ClientExists`] if the id is taken.
    pub fn create_client(&self, client_state: &ClientState) -> Result<(), SoloMachineError> {
        client_state.validate()?;
        self.with_client_lock(&client_state.client_id, || {
            let key = self.config.client_state_key(&client_state.client_id);
            if self.store.get(&key).is_some() {
                return Err(StoreError::ClientExists {
                    client_id: client_state.client_id.clone(),
                }
                .into());
            }
            self.save(client_state)?;
            tracing::info!(client_id = %client_state.client_id, "created solo machine client");
            Ok(())
        })
    }

    /// Loads the client state of `client_id`.
    ///
    /// # Errors
    /// Returns [`StoreError::ClientNotFound`] or a decoding error.
    pub fn client_state(&self, client_id: &str) -> Result<ClientState, SoloMachineError> {
        let bytes = self
            .store
            .get(&self.config.client_state_key(client_id))
            .ok_or_else(|| StoreError::ClientNotFound {
                client_id: client_id.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::from(e).into())
    }

    /// Runs `verify` on the stored client and persists the state it returns.
    ///
    /// Holds the lock of `client_id` throughout, so concurrent verifications of
    /// the same client observe each other's sequence advances. The returned
    /// state must belong to `client_id` and advance its sequence by exactly one.
    /// Nothing is written if `verify` fails or its state is rejected.
    ///
    /// # Errors
    /// Returns the loading error, the error of `verify`, or
    /// [`SoloMachineError::InvalidClientState`] for a state that is not the
    /// direct successor of the stored one.
    pub fn verify<F>(&self, client_id: &str, verify: F) -> Result<ClientState, SoloMachineError>
    where
        F: FnOnce(&ClientState, &ProofCodec) -> Result<ClientState, SoloMachineError>,
    {
        self.with_client_lock(client_id, || {
            let current = self.client_state(client_id)?;
            let next = verify(&current, &self.codec)?;
            check_successor(&current, &next)?;
            self.save(&next)?;
            Ok(next)
        })
    }

    /// Freezes the client. Used by misbehaviour handling.
    ///
    /// # Errors
    /// Returns the loading error.
    pub fn freeze(&self, client_id: &str) -> Result<ClientState, SoloMachineError> {
        self.with_client_lock(client_id, || {
            let frozen = self.client_state(client_id)?.frozen();
            self.save(&frozen)?;
            tracing::warn!(client_id, "froze solo machine client");
            Ok(frozen)
        })
    }

    fn save(&self, client_state: &ClientState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(client_state)?;
        self.store
            .set(&self.config.client_state_key(&client_state.client_id), bytes);
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn with_client_lock<T>(
        &self,
        client_id: &str,
        f: impl FnOnce() -> Result<T, SoloMachineError>,
    ) -> Result<T, SoloMachineError> {
        let poisoned = || StoreError::LockPoisoned {
            client_id: client_id.to_string(),
        };

        let lock = {
            let mut locks = self.locks.lock().map_err(|_| poisoned())?;
            Arc::clone(locks.entry(client_id.to_string()).or_default())
        };
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(poisoned().into()),
        };
        self.release_lock(client_id, &lock);
        result
    }

    /// Drops the lock entry of `client_id` unless another caller holds or
    /// waits on it. Clones are only taken under the map lock, so the count
    /// cannot grow while it is inspected.
    fn release_lock(&self, client_id: &str, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(lock) == 2 {
            locks.remove(client_id);
        }
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn check_successor(current: &ClientState, next: &ClientState) -> Result<(), SoloMachineError> {
    ensure!(
        next.client_id == current.client_id,
        SoloMachineError::InvalidClientState {
            reason: format!(
                "verification of {} returned the state of {}",
                current.client_id, next.client_id
            ),
        }
    );
    let expected = current.latest_height().checked_add(1);
    ensure!(
        expected == Some(next.latest_height()),
        SoloMachineError::InvalidClientState {
            reason: format!(
                "sequence of {} must advance from {} by one, found {}",
                current.client_id,
                current.latest_height(),
                next.latest_height()
            ),
        }
    );
    Ok(())
}
