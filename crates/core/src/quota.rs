//! Local usage quota.
//!
//! Credits are a soft usage nudge, not an access-control boundary: the refill
//! code is a compiled-in constant that anyone with the binary can find.

use crate::error::{AppError, Result};
use crate::storage::Storage;

/// Credits granted on first start and by every refill.
pub const MAX_QUOTA: u32 = 200;

/// Code that restores the quota to [`MAX_QUOTA`]. Compared case-sensitively.
pub const REFILL_CODE: &str = "ENIE2025";

/// Storage key holding the remaining credits as a decimal string.
pub const QUOTA_KEY: &str = "enie_quota";

/// Snapshot of the quota. `remaining` never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub remaining: u32,
    pub max: u32,
}

impl QuotaState {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Quota counter persisted through a [`Storage`].
pub struct QuotaStore<S: Storage> {
    storage: S,
    state: QuotaState,
}

impl<S: Storage> QuotaStore<S> {
    /// Reads the persisted count. Absent or unparsable values start at the
    /// maximum; values above the maximum are clamped.
    pub fn load(storage: S) -> Self {
        let remaining = match storage.get(QUOTA_KEY) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) => value.min(MAX_QUOTA),
                Err(err) => {
                    tracing::warn!(%raw, %err, "stored quota is unparsable; resetting");
                    MAX_QUOTA
                }
            },
            None => MAX_QUOTA,
        };

        let mut store = Self {
            storage,
            state: QuotaState {
                remaining,
                max: MAX_QUOTA,
            },
        };
        store.persist_best_effort();
        store
    }

    pub fn state(&self) -> QuotaState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.state.remaining
    }

    pub fn can_generate(&self) -> bool {
        self.state.remaining > 0
    }

    /// Writes the current count to storage.
    pub fn persist(&mut self) -> Result<()> {
        self.storage.set(QUOTA_KEY, &self.state.remaining.to_string())
    }

    /// Uses up one credit, never going below zero.
    pub fn consume(&mut self) -> QuotaState {
        self.state.remaining = self.state.remaining.saturating_sub(1);
        tracing::debug!(remaining = self.state.remaining, "credit consumed");
        self.persist_best_effort();
        self.state
    }

    /// Restores the maximum when `code` matches [`REFILL_CODE`] exactly.
    pub fn refill(&mut self, code: &str) -> bool {
        if code != REFILL_CODE {
            tracing::info!("rejected refill code");
            return false;
        }

        self.state.remaining = self.state.max;
        tracing::info!(remaining = self.state.remaining, "credits refilled");
        self.persist_best_effort();
        true
    }

    /// Like [`refill`](Self::refill) but reports a mismatch as an error.
    pub fn try_refill(&mut self, code: &str) -> Result<QuotaState> {
        if self.refill(code) {
            Ok(self.state)
        } else {
            Err(AppError::InvalidRefillCode)
        }
    }

    fn persist_best_effort(&mut self) {
        if let Err(err) = self.persist() {
            tracing::warn!(%err, "failed to persist quota");
        }
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage_with(value: &str) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        storage.set(QUOTA_KEY, value).unwrap();
        storage
    }

    #[test]
    fn missing_value_starts_at_max() {
        let store = QuotaStore::load(MemoryStorage::new());
        assert_eq!(store.remaining(), MAX_QUOTA);
        assert_eq!(store.storage().get(QUOTA_KEY).as_deref(), Some("200"));
    }

    #[test]
    fn unparsable_value_starts_at_max() {
        let store = QuotaStore::load(storage_with("lots"));
        assert_eq!(store.remaining(), MAX_QUOTA);
    }

    #[test]
    fn stored_value_is_loaded_and_clamped() {
        assert_eq!(QuotaStore::load(storage_with("42")).remaining(), 42);
        assert_eq!(QuotaStore::load(storage_with("9000")).remaining(), MAX_QUOTA);
        assert_eq!(QuotaStore::load(storage_with("-3")).remaining(), MAX_QUOTA);
    }

    #[test]
    fn consume_never_leaves_bounds() {
        let mut store = QuotaStore::load(storage_with("3"));
        for _ in 0..10 {
            let state = store.consume();
            assert!(state.remaining <= state.max);
        }
        assert_eq!(store.remaining(), 0);
        assert!(!store.can_generate());
        assert_eq!(store.storage().get(QUOTA_KEY).as_deref(), Some("0"));
    }

    #[test]
    fn correct_code_restores_max() {
        let mut store = QuotaStore::load(storage_with("0"));
        assert!(store.refill(REFILL_CODE));
        assert_eq!(store.remaining(), MAX_QUOTA);
        assert_eq!(store.storage().get(QUOTA_KEY).as_deref(), Some("200"));
    }

    #[test]
    fn wrong_codes_change_nothing() {
        let mut store = QuotaStore::load(storage_with("5"));
        for code in ["", "enie2025", "ENIE2025 ", "ENIE2024", "ENIE"] {
            assert!(!store.refill(code));
            assert_eq!(store.remaining(), 5);
        }
        assert!(matches!(
            store.try_refill("nope"),
            Err(AppError::InvalidRefillCode)
        ));
    }

    #[test]
    fn quota_survives_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let mut first = QuotaStore::load(crate::storage::FileStorage::at(&path));
        first.consume();
        first.consume();

        let second = QuotaStore::load(crate::storage::FileStorage::at(&path));
        assert_eq!(second.remaining(), MAX_QUOTA - 2);
    }
}
