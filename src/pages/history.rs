// src/pages/history.rs

//! Narrative context derived from the page store.
//!
//! The log is never written directly: it reflects whatever beats the page
//! tasks have committed to the store. A request for page `n` only ever sees
//! story pages with index `< n`.

use std::fmt;

use crate::pages::store::PageStore;
use crate::types::{PageIndex, PageKind};

/// Caption/dialogue pair of one earlier story page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: PageIndex,
    pub caption: String,
    pub dialogue: Option<String>,
}

/// Ordered (index-ascending) view of story pages whose beat is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Every story page with a beat, in index order.
    pub fn from_store(store: &PageStore) -> Self {
        Self::collect(store, PageIndex::MAX)
    }

    /// Story pages with a beat and index strictly below `page`.
    pub fn before(store: &PageStore, page: PageIndex) -> Self {
        Self::collect(store, page)
    }

    fn collect(store: &PageStore, limit: PageIndex) -> Self {
        // The store iterates in index order, so entries come out sorted.
        let entries = store
            .iter()
            .filter(|r| r.kind == PageKind::Story && r.index < limit)
            .filter_map(|r| {
                r.beat.as_ref().map(|beat| HistoryEntry {
                    index: r.index,
                    caption: beat.caption.clone(),
                    dialogue: beat.dialogue.clone(),
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn indices(&self) -> Vec<PageIndex> {
        self.entries.iter().map(|e| e.index).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for HistoryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("This is the first page.");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "[Page {}] (Caption: \"{}\") (Dialogue: \"{}\")",
                entry.index,
                entry.caption,
                entry.dialogue.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}
