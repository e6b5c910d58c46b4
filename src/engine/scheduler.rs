// src/engine/scheduler.rs

//! Decides which pages need work for the current viewport, and in what order.
//!
//! Story pages depend on each other through the history log: page `n` must be
//! scripted against every earlier story page's beat. The scheduler therefore
//! keeps at most one story task of its own in flight and starts queued story
//! pages strictly in increasing index order. Covers have no such dependency
//! and are started as soon as a pass finds them.
//!
//! Re-ink tasks are not scheduler-driven and do not occupy the story slot.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::engine::registry::{InFlightRegistry, Lease};
use crate::pages::{PageStatus, PageStore};
use crate::types::{PageIndex, PageKind};

/// Result of one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassPlan {
    pub pass_id: u64,
    /// Cover/back-cover pages to start right away.
    pub immediate: Vec<PageIndex>,
    /// Story pages added to the ordered queue by this pass.
    pub queued: Vec<PageIndex>,
}

impl PassPlan {
    pub fn is_empty(&self) -> bool {
        self.immediate.is_empty() && self.queued.is_empty()
    }
}

#[derive(Debug)]
pub struct Scheduler {
    back_cover: PageIndex,
    prefetch_story_pages: usize,
    /// Story pages waiting for the slot, smallest first.
    queue: BTreeSet<PageIndex>,
    /// The scheduler's own story task, if any.
    active_story: Option<Lease>,
    pass_counter: u64,
}

impl Scheduler {
    pub fn new(story_pages: usize, prefetch_story_pages: usize) -> Self {
        Self {
            back_cover: story_pages + 1,
            prefetch_story_pages,
            queue: BTreeSet::new(),
            active_story: None,
            pass_counter: 0,
        }
    }

    pub fn back_cover_index(&self) -> PageIndex {
        self.back_cover
    }

    /// Last sheet of the book (the one showing the back cover).
    pub fn max_sheet(&self) -> usize {
        self.back_cover.div_ceil(2)
    }

    /// Highest page index exposed at `sheet`. Each sheet exposes two more
    /// story pages; sheet 0 (closed book) exposes only the cover.
    pub fn upper_bound(&self, sheet: usize) -> PageIndex {
        sheet.saturating_mul(2).min(self.back_cover)
    }

    /// Bound for the launch prefetch window: the cover plus the first
    /// `prefetch_story_pages` story pages.
    pub fn prefetch_bound(&self) -> PageIndex {
        self.prefetch_story_pages.min(self.back_cover)
    }

    /// `{ i <= bound : status(i) = idle, i not in flight, i not queued }`,
    /// ascending.
    pub fn needed_pages(
        &self,
        store: &PageStore,
        registry: &InFlightRegistry,
        bound: PageIndex,
    ) -> Vec<PageIndex> {
        let bound = bound.min(self.back_cover);
        store
            .iter()
            .take_while(|r| r.index <= bound)
            .filter(|r| r.status == PageStatus::Idle)
            .filter(|r| !registry.contains(r.index) && !self.queue.contains(&r.index))
            .map(|r| r.index)
            .collect()
    }

    /// Compute the needed set and split it: covers are returned for
    /// immediate start, story pages join the ordered queue.
    ///
    /// Performs no store writes.
    pub fn plan_pass(
        &mut self,
        store: &PageStore,
        registry: &InFlightRegistry,
        bound: PageIndex,
    ) -> PassPlan {
        let needed = self.needed_pages(store, registry, bound);
        if needed.is_empty() {
            debug!(bound, "scheduler pass found nothing to do");
            return PassPlan::default();
        }

        self.pass_counter += 1;
        let mut plan = PassPlan {
            pass_id: self.pass_counter,
            ..PassPlan::default()
        };

        for page in needed {
            match store.get(page).map(|r| r.kind) {
                Some(PageKind::Story) => {
                    self.queue.insert(page);
                    plan.queued.push(page);
                }
                Some(_) => plan.immediate.push(page),
                None => {}
            }
        }

        info!(
            pass = plan.pass_id,
            bound,
            immediate = ?plan.immediate,
            queued = ?plan.queued,
            "scheduler pass planned"
        );
        plan
    }

    /// Next story page to start, if the slot is free.
    ///
    /// A slot whose lease was cancelled or superseded counts as free. Queued
    /// pages that stopped being idle, or got picked up by a re-ink in the
    /// meantime, are dropped from the queue.
    pub fn next_story(
        &mut self,
        store: &PageStore,
        registry: &InFlightRegistry,
    ) -> Option<PageIndex> {
        if let Some(active) = self.active_story {
            if registry.is_current(&active) {
                return None;
            }
            debug!(page = active.page, epoch = active.epoch, "story slot freed");
            self.active_story = None;
        }

        while let Some(page) = self.queue.pop_first() {
            let idle = store.status_of(page) == Some(PageStatus::Idle);
            if idle && !registry.contains(page) {
                return Some(page);
            }
            debug!(page, "queued story page no longer needs the scheduler; skipping");
        }

        None
    }

    /// Record the lease of the story task the scheduler just started.
    pub fn occupy(&mut self, lease: Lease) {
        self.active_story = Some(lease);
    }

    pub fn active_story(&self) -> Option<Lease> {
        self.active_story
    }

    pub fn queued(&self) -> Vec<PageIndex> {
        self.queue.iter().copied().collect()
    }

    /// Nothing queued and no live story task of the scheduler's own.
    pub fn is_idle(&self, registry: &InFlightRegistry) -> bool {
        self.queue.is_empty()
            && self
                .active_story
                .is_none_or(|lease| !registry.is_current(&lease))
    }

    /// Forget all queued work (session reset).
    pub fn reset(&mut self) {
        self.queue.clear();
        self.active_story = None;
    }
}
