// src/engine/registry.rs

//! In-flight registry: which pages are currently owned by a page task.
//!
//! Membership is the only dedupe and cancellation signal. Each successful
//! acquire hands out a [`Lease`] stamped with a fresh epoch, so a task can
//! tell whether it still owns its page or was cancelled/superseded while it
//! was suspended on a remote call.

use std::collections::BTreeMap;

use tracing::debug;

use crate::types::PageIndex;

/// Proof of ownership of one page by one task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lease {
    pub page: PageIndex,
    pub epoch: u64,
}

#[derive(Debug, Default)]
pub struct InFlightRegistry {
    held: BTreeMap<PageIndex, u64>,
    /// Monotonic for the life of the registry, including across `clear`.
    last_epoch: u64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dedupe gate: `None` if the page is already held, otherwise mark it
    /// held and return the new lease.
    pub fn try_acquire(&mut self, page: PageIndex) -> Option<Lease> {
        if self.held.contains_key(&page) {
            debug!(page, "page already in flight; acquire refused");
            return None;
        }
        self.last_epoch += 1;
        let lease = Lease {
            page,
            epoch: self.last_epoch,
        };
        self.held.insert(page, lease.epoch);
        debug!(page, epoch = lease.epoch, "page acquired");
        Some(lease)
    }

    /// Unconditionally clear membership. Returns whether the page was held.
    ///
    /// Used by cancel and re-ink; the owning task finds out at its next
    /// commit check.
    pub fn release(&mut self, page: PageIndex) -> bool {
        let was_held = self.held.remove(&page).is_some();
        if was_held {
            debug!(page, "page released");
        }
        was_held
    }

    /// Release only if `lease` is still the holder of its page.
    pub fn release_lease(&mut self, lease: &Lease) -> bool {
        if self.is_current(lease) {
            self.held.remove(&lease.page);
            debug!(page = lease.page, epoch = lease.epoch, "lease released");
            true
        } else {
            false
        }
    }

    /// Whether `lease` still owns its page.
    pub fn is_current(&self, lease: &Lease) -> bool {
        self.held.get(&lease.page) == Some(&lease.epoch)
    }

    pub fn contains(&self, page: PageIndex) -> bool {
        self.held.contains_key(&page)
    }

    /// Held pages, ascending.
    pub fn pages(&self) -> Vec<PageIndex> {
        self.held.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Drop all membership (session reset). Epochs keep counting up.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}
