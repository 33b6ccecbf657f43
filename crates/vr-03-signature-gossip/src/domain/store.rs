//! Collected signatures, keyed by `(epoch, message_hash)`.
//!
//! Anything that verifies against its own key may be stored, so every level
//! of the map is capped: epochs tracked, digests per epoch and signatures per
//! digest. A full level rejects new entries instead of evicting old ones.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use relay_types::{Epoch, Hash, SignatureMessage};

type Bucket = BTreeMap<Vec<u8>, SignatureMessage>;

/// Size limits for a [`SignatureStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_epochs: usize,
    pub max_digests_per_epoch: usize,
    pub max_signatures_per_digest: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_epochs: 16,
            max_digests_per_epoch: 16,
            max_signatures_per_digest: 10_000,
        }
    }
}

/// Result of [`SignatureStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    /// The key already signed this bucket
    Duplicate,
    /// A limit was reached
    Full,
}

/// Thread-safe signature store.
///
/// Each bucket holds at most one message per public key; the first one wins.
#[derive(Debug, Default)]
pub struct SignatureStore {
    limits: StoreLimits,
    inner: RwLock<BTreeMap<Epoch, HashMap<Hash, Bucket>>>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            inner: RwLock::default(),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    pub fn insert(&self, message: SignatureMessage) -> InsertOutcome {
        let mut inner = self.inner.write();
        if !inner.contains_key(&message.epoch) && inner.len() >= self.limits.max_epochs {
            return InsertOutcome::Full;
        }
        let digests = inner.entry(message.epoch).or_default();
        if !digests.contains_key(&message.message_hash)
            && digests.len() >= self.limits.max_digests_per_epoch
        {
            return InsertOutcome::Full;
        }
        let bucket = digests.entry(message.message_hash).or_default();
        if bucket.contains_key(&message.public_key) {
            return InsertOutcome::Duplicate;
        }
        if bucket.len() >= self.limits.max_signatures_per_digest {
            return InsertOutcome::Full;
        }
        bucket.insert(message.public_key.clone(), message);
        InsertOutcome::Stored
    }

    /// Consistent copy of one bucket, ordered by public key.
    pub fn snapshot(&self, epoch: Epoch, message_hash: &Hash) -> Vec<SignatureMessage> {
        self.inner
            .read()
            .get(&epoch)
            .and_then(|digests| digests.get(message_hash))
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, epoch: Epoch, message_hash: &Hash) -> usize {
        self.inner
            .read()
            .get(&epoch)
            .and_then(|digests| digests.get(message_hash))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Drop every bucket with `epoch <= through`. Returns messages removed.
    pub fn prune_through(&self, through: Epoch) -> usize {
        let mut inner = self.inner.write();
        let kept = match through.checked_add(1) {
            Some(first_kept) => inner.split_off(&first_kept),
            None => BTreeMap::new(),
        };
        let removed = std::mem::replace(&mut *inner, kept);
        removed.values().map(digest_total).sum()
    }

    /// Drop every bucket with `epoch > after`. Returns messages removed.
    pub fn prune_after(&self, after: Epoch) -> usize {
        let Some(first_dropped) = after.checked_add(1) else {
            return 0;
        };
        let removed = self.inner.write().split_off(&first_dropped);
        removed.values().map(digest_total).sum()
    }

    /// Total messages across all buckets.
    pub fn len(&self) -> usize {
        self.inner.read().values().map(digest_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn digest_total(digests: &HashMap<Hash, Bucket>) -> usize {
    digests.values().map(BTreeMap::len).sum()
}
