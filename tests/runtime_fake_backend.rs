// tests/runtime_fake_backend.rs

mod common;
use crate::common::builders::SessionBuilder;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use inkflow::engine::{CoreRuntime, Runtime, RuntimeEvent, SessionNotice};
use inkflow::errors::{GenerationError, InkflowError};
use inkflow::exec::CollaboratorBackend;
use inkflow::pages::PageStatus;
use inkflow_test_utils::fake_backend::RecordingBackend;
use inkflow_test_utils::fake_studio::FakeStudio;

type TestResult = Result<(), Box<dyn Error>>;

fn studio_backend(
    studio: &FakeStudio,
    tx: mpsc::Sender<RuntimeEvent>,
    timeout: Duration,
) -> CollaboratorBackend {
    let studio = Arc::new(studio.clone());
    CollaboratorBackend::new(studio.clone(), studio.clone(), studio, tx, timeout)
}

async fn send_batch(tx: &mpsc::Sender<RuntimeEvent>, core: &CoreRuntime) -> TestResult {
    tx.send(RuntimeEvent::Launch).await?;
    tx.send(RuntimeEvent::ViewportChanged {
        sheet: core.scheduler().max_sheet(),
    })
    .await?;
    Ok(())
}

#[tokio::test]
async fn batch_run_completes_every_page() -> TestResult {
    init_tracing();
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(4).exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let backend = RecordingBackend::new(tx.clone(), Arc::clone(&dispatched));

    send_batch(&tx, &core).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).run()).await?;

    assert_eq!(core.store().ready_count(), 6);
    assert!(core.registry().is_empty());
    let dispatched = dispatched.lock().unwrap().clone();
    let scripted: Vec<usize> = dispatched
        .iter()
        .filter(|(_, stage)| *stage == "script")
        .map(|(page, _)| *page)
        .collect();
    assert_eq!(scripted, vec![1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn narrative_requests_see_every_earlier_page() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(5).exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_secs(5));

    send_batch(&tx, &core).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).run()).await?;

    assert_eq!(studio.scripted_pages(), vec![1, 2, 3, 4, 5]);
    for request in studio.script_requests() {
        let expected: Vec<usize> = (1..request.page).collect();
        assert_eq!(request.history.indices(), expected, "page {}", request.page);
    }
    assert_eq!(studio.render_requests().len(), 7);
    assert_eq!(core.store().completed_pages().len(), 7);
    Ok(())
}

#[tokio::test]
async fn failed_pages_do_not_stop_the_batch() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    studio.fail_ink(2, GenerationError::MissingImage);
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(3).exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_secs(5));

    send_batch(&tx, &core).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).run()).await?;

    assert_eq!(core.store().status_of(2), Some(PageStatus::Error));
    assert_eq!(core.store().ready_count(), 4);
    // Page 3 still got page 2's beat: only the artwork failed.
    let page3 = studio
        .script_requests()
        .into_iter()
        .find(|r| r.page == 3)
        .unwrap();
    assert_eq!(page3.history.indices(), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn slow_collaborator_times_out_into_page_error() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    let _gate = studio.hold_script(1);
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(1).exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_millis(50));

    send_batch(&tx, &core).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).run()).await?;

    assert_eq!(core.store().status_of(1), Some(PageStatus::Error));
    assert_eq!(core.store().status_of(0), Some(PageStatus::Complete));
    assert_eq!(core.store().status_of(2), Some(PageStatus::Complete));
    Ok(())
}

#[tokio::test]
async fn cancel_while_waiting_discards_the_late_result() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    let gate = studio.hold_script(1);
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(2).build());
    let (tx, rx) = mpsc::channel(64);
    let (notice_tx, mut notice_rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_secs(5));
    let handle = tokio::spawn(Runtime::new(core, rx, backend).with_notices(notice_tx).run());

    tx.send(RuntimeEvent::Launch).await?;
    with_timeout(async {
        while let Some(notice) = notice_rx.recv().await {
            if notice == (SessionNotice::PageChanged { page: 1, status: PageStatus::Scripting }) {
                break;
            }
        }
    })
    .await;

    tx.send(RuntimeEvent::Cancel { page: 1 }).await?;
    with_timeout(async {
        while let Some(notice) = notice_rx.recv().await {
            if notice == (SessionNotice::PageChanged { page: 1, status: PageStatus::Error }) {
                break;
            }
        }
    })
    .await;

    // Let the held call finish; its beat must be dropped.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    let core = with_timeout(handle).await??;
    let record = core.store().get(1).unwrap();
    assert_eq!(record.status, PageStatus::Error);
    assert!(record.beat.is_none());
    assert!(core.registry().is_empty());
    Ok(())
}

#[tokio::test]
async fn premium_batch_launch_fails_when_probe_rejects() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    studio.reject_credentials();
    let core = CoreRuntime::new(SessionBuilder::new().premium().exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_secs(5));

    send_batch(&tx, &core).await?;
    let result = with_timeout(Runtime::new(core, rx, backend).run()).await;

    assert!(matches!(result, Err(InkflowError::CredentialsRejected(_))));
    assert_eq!(studio.probe_count(), 1);
    assert!(studio.script_requests().is_empty());
    assert!(studio.render_requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn interactive_premium_launch_is_dropped_with_notice() -> TestResult {
    init_tracing();
    let core = CoreRuntime::new(SessionBuilder::new().premium().build());
    let (tx, rx) = mpsc::channel(64);
    let (notice_tx, mut notice_rx) = mpsc::channel(64);
    let dispatched = Arc::new(Mutex::new(Vec::new()));
    let backend = RecordingBackend::new(tx.clone(), Arc::clone(&dispatched)).rejecting_credentials();

    tx.send(RuntimeEvent::Launch).await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).with_notices(notice_tx).run()).await?;

    assert!(!core.is_launched());
    assert!(dispatched.lock().unwrap().is_empty());
    let notice = notice_rx.recv().await;
    assert!(matches!(
        notice,
        Some(SessionNotice::CredentialsRejected { page: None, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn non_premium_launch_skips_the_probe() -> TestResult {
    init_tracing();
    let studio = FakeStudio::new();
    studio.reject_credentials();
    let core = CoreRuntime::new(SessionBuilder::new().story_pages(1).exit_when_idle(true).build());
    let (tx, rx) = mpsc::channel(64);
    let backend = studio_backend(&studio, tx.clone(), Duration::from_secs(5));

    send_batch(&tx, &core).await?;
    let core = with_timeout(Runtime::new(core, rx, backend).run()).await?;

    assert_eq!(studio.probe_count(), 0);
    assert_eq!(core.store().ready_count(), 3);
    Ok(())
}
