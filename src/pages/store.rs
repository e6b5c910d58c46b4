// src/pages/store.rs

//! Single source of truth for page status and artifacts.

use thiserror::Error;
use tracing::{debug, trace};

use crate::pages::record::{PageRecord, PageStatus, PageUpdate};
use crate::types::{Beat, ImageArtifact, PageIndex, PageKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageStoreError {
    #[error("page {0} does not exist in this session")]
    UnknownPage(PageIndex),

    #[error("page {index}: invalid status transition {from} -> {to}")]
    InvalidTransition {
        index: PageIndex,
        from: PageStatus,
        to: PageStatus,
    },

    #[error("page {0} cannot be complete without an artifact")]
    MissingArtifact(PageIndex),

    #[error("story page {0} cannot be complete without a beat")]
    MissingBeat(PageIndex),
}

/// A complete page handed to the exporter, in index order.
#[derive(Debug, Clone)]
pub struct ExportPage<'a> {
    pub index: PageIndex,
    pub kind: PageKind,
    pub beat: Option<&'a Beat>,
    pub artifact: &'a ImageArtifact,
}

/// One record per page index, addressed by position.
///
/// The store does not dedupe tasks; that is the in-flight registry's job.
#[derive(Debug, Clone, Default)]
pub struct PageStore {
    records: Vec<PageRecord>,
}

impl PageStore {
    /// Store with `page_count` idle records (see [`PageStore::initialize`]).
    pub fn with_pages(page_count: usize) -> Self {
        let mut store = Self::default();
        store.initialize(page_count);
        store
    }

    /// Reset every record to `Idle`, deriving kinds from the index:
    /// 0 is the cover, the last index the back cover, the rest are story pages.
    pub fn initialize(&mut self, page_count: usize) {
        let back_cover = page_count.saturating_sub(1);
        self.records = (0..page_count)
            .map(|index| PageRecord::idle(index, PageKind::for_index(index, back_cover)))
            .collect();
        debug!(page_count, "page store initialised");
    }

    pub fn get(&self, index: PageIndex) -> Option<&PageRecord> {
        self.records.get(index)
    }

    pub fn status_of(&self, index: PageIndex) -> Option<PageStatus> {
        self.get(index).map(|r| r.status)
    }

    /// Merge `update` into the record at `index`.
    ///
    /// The merged record is validated before anything is written: the status
    /// transition must be legal and a `Complete` record must carry an artifact
    /// (and a beat, for story pages). On error the record is unchanged.
    pub fn upsert(&mut self, index: PageIndex, update: PageUpdate) -> Result<&PageRecord, PageStoreError> {
        let current = self
            .records
            .get(index)
            .ok_or(PageStoreError::UnknownPage(index))?;

        let next = update.merged_into(current);

        if next.status != current.status && !current.status.can_transition_to(next.status) {
            return Err(PageStoreError::InvalidTransition {
                index,
                from: current.status,
                to: next.status,
            });
        }

        if next.status == PageStatus::Complete {
            if next.artifact.is_none() {
                return Err(PageStoreError::MissingArtifact(index));
            }
            if next.kind.needs_beat() && next.beat.is_none() {
                return Err(PageStoreError::MissingBeat(index));
            }
        }

        trace!(page = index, from = %current.status, to = %next.status, "page record updated");
        self.records[index] = next;
        Ok(&self.records[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the back cover, or `None` for an uninitialised store.
    pub fn back_cover_index(&self) -> Option<PageIndex> {
        self.records.len().checked_sub(1)
    }

    /// Number of pages that can be displayed right now.
    pub fn ready_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_ready()).count()
    }

    /// Ordered, filtered list of complete pages for the exporter.
    pub fn completed_pages(&self) -> Vec<ExportPage<'_>> {
        self.records
            .iter()
            .filter(|r| r.status == PageStatus::Complete)
            .filter_map(|r| {
                r.artifact.as_ref().map(|artifact| ExportPage {
                    index: r.index,
                    kind: r.kind,
                    beat: r.beat.as_ref(),
                    artifact,
                })
            })
            .collect()
    }
}
