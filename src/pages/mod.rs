// src/pages/mod.rs

//! Page records and the views derived from them.
//!
//! - [`record`] defines a single page's record and its status state machine.
//! - [`store`] holds one record per page index (the single source of truth).
//! - [`history`] is the ordered narrative context derived from the store.

pub mod history;
pub mod record;
pub mod store;

pub use history::{HistoryEntry, HistoryLog};
pub use record::{PageRecord, PageStatus, PageUpdate};
pub use store::{ExportPage, PageStore, PageStoreError};
