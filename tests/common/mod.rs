#![allow(dead_code, unused_imports)]

pub use inkflow_test_utils::builders;
pub use inkflow_test_utils::harness;
pub use inkflow_test_utils::{init_tracing, with_timeout};

use inkflow::engine::{CoreRuntime, CoreStep, RuntimeEvent};
use inkflow::pages::PageStatus;
use inkflow::types::PageIndex;

/// Launched core for the given builder.
pub fn launched(builder: builders::SessionBuilder) -> (CoreRuntime, CoreStep) {
    let mut core = CoreRuntime::new(builder.build());
    let step = core.step(RuntimeEvent::Launch);
    (core, step)
}

pub fn status(core: &CoreRuntime, page: PageIndex) -> PageStatus {
    core.store().status_of(page).expect("page exists")
}

/// Registry membership matches the set of busy pages.
pub fn assert_registry_matches_busy(core: &CoreRuntime) {
    let busy: Vec<PageIndex> = core
        .store()
        .iter()
        .filter(|r| r.status.is_busy())
        .map(|r| r.index)
        .collect();
    assert_eq!(core.registry().pages(), busy, "registry vs busy pages");
}
