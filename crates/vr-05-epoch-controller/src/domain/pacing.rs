//! Rebroadcast pacing.

use std::collections::HashMap;

use relay_types::{Epoch, Hash, Timestamp};

/// Remembers when each `(epoch, hash)` signature was last broadcast.
#[derive(Debug, Default)]
pub struct RebroadcastPacer {
    interval_secs: u64,
    last: HashMap<(Epoch, Hash), Timestamp>,
}

impl RebroadcastPacer {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            last: HashMap::new(),
        }
    }

    pub fn is_due(&self, epoch: Epoch, hash: &Hash, now: Timestamp) -> bool {
        match self.last.get(&(epoch, *hash)) {
            None => true,
            Some(last) => now.saturating_sub(*last) >= self.interval_secs,
        }
    }

    pub fn record(&mut self, epoch: Epoch, hash: Hash, now: Timestamp) {
        self.last.insert((epoch, hash), now);
    }

    pub fn prune_through(&mut self, through: Epoch) {
        self.last.retain(|(epoch, _), _| *epoch > through);
    }

    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
