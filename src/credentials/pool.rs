use crate::credentials::state::{Credential, CredentialState};
use crate::ConfigError;
use std::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Result of asking the pool for a usable credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// A usable credential; the cursor has moved past it
    Ready(Credential),

    /// Every credential is suspended; the earliest one resumes at `next_resume`
    AllSuspended { next_resume: Instant },
}

#[derive(Debug)]
struct PoolEntry {
    credential: Credential,
    state: CredentialState,
}

#[derive(Debug)]
struct PoolInner {
    entries: Vec<PoolEntry>,
    cursor: usize,
}

/// Ordered set of API keys with a rotation cursor
///
/// All reads and writes of the cursor happen under one lock, so concurrent
/// callers never observe the same pre-advance position. The cursor itself is
/// never exposed.
#[derive(Debug)]
pub struct CredentialPool {
    inner: Mutex<PoolInner>,
}

impl CredentialPool {
    /// Creates a pool from configured keys
    ///
    /// # Returns
    ///
    /// * `Ok(CredentialPool)` - Pool with every key active
    /// * `Err(ConfigError)` - The key list was empty
    pub fn new<I, K>(keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = K>,
        K: Into<Credential>,
    {
        let entries: Vec<PoolEntry> = keys
            .into_iter()
            .map(|k| PoolEntry {
                credential: k.into(),
                state: CredentialState::Active,
            })
            .collect();

        if entries.is_empty() {
            return Err(ConfigError::Validation(
                "credential pool requires at least one API key".to_string(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(PoolInner { entries, cursor: 0 }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // The guarded data has no invariant a panicking holder could break
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Always false; an empty pool cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns every credential in pool order
    pub fn credentials(&self) -> Vec<Credential> {
        self.lock()
            .entries
            .iter()
            .map(|e| e.credential.clone())
            .collect()
    }

    /// Returns the credential at the cursor and advances the cursor by one
    ///
    /// Suspension state is ignored.
    pub fn acquire_next(&self) -> Credential {
        let mut inner = self.lock();
        let index = inner.cursor;
        inner.cursor = (index + 1) % inner.entries.len();
        inner.entries[index].credential.clone()
    }

    /// Returns the next credential that may be used at `now`
    ///
    /// Suspended credentials are skipped; a suspension that has expired is
    /// cleared and the credential returned. The cursor ends one past the
    /// returned credential. When every credential is suspended the cursor is
    /// left where it was.
    pub fn acquire_available(&self, now: Instant) -> Acquisition {
        let mut inner = self.lock();
        let len = inner.entries.len();
        let start = inner.cursor;

        for offset in 0..len {
            let index = (start + offset) % len;
            let entry = &mut inner.entries[index];

            if entry.state.is_available(now) {
                if let CredentialState::Suspended { .. } = entry.state {
                    tracing::info!("Credential {} resumed after quota back-off", entry.credential);
                    entry.state = CredentialState::Active;
                }
                let credential = entry.credential.clone();
                inner.cursor = (index + 1) % len;
                return Acquisition::Ready(credential);
            }
        }

        let next_resume = inner
            .entries
            .iter()
            .filter_map(|e| e.state.resume_at())
            .min()
            .unwrap_or(now);

        Acquisition::AllSuspended { next_resume }
    }

    /// Parks a credential until `resume_at`
    ///
    /// Every entry holding the same key is parked. Returns false if the
    /// credential is not part of this pool.
    pub fn suspend(&self, credential: &Credential, resume_at: Instant) -> bool {
        let mut inner = self.lock();
        let mut found = false;
        for entry in inner
            .entries
            .iter_mut()
            .filter(|e| &e.credential == credential)
        {
            entry.state = CredentialState::Suspended { resume_at };
            found = true;
        }
        found
    }

    /// Returns the state of a credential, clearing an expired suspension
    ///
    /// A key listed more than once reports the latest suspension of any of
    /// its entries.
    pub fn state_of(&self, credential: &Credential, now: Instant) -> Option<CredentialState> {
        let mut inner = self.lock();
        let mut found = false;
        let mut latest: Option<Instant> = None;

        for entry in inner
            .entries
            .iter_mut()
            .filter(|e| &e.credential == credential)
        {
            found = true;
            if !entry.state.is_available(now) {
                if let Some(resume_at) = entry.state.resume_at() {
                    latest = Some(latest.map_or(resume_at, |l| l.max(resume_at)));
                }
            } else if matches!(entry.state, CredentialState::Suspended { .. }) {
                entry.state = CredentialState::Active;
            }
        }

        if !found {
            return None;
        }
        Some(match latest {
            Some(resume_at) => CredentialState::Suspended { resume_at },
            None => CredentialState::Active,
        })
    }

    /// Counts credentials that are currently suspended
    pub fn suspended_count(&self, now: Instant) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|e| !e.state.is_available(now))
            .count()
    }
}
