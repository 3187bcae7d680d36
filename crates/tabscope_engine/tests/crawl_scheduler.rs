mod support;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tabscope_core::{
    CrawlState, LinkResult, LinkTarget, ProbeFailure, StartStatus, StateKey, TabId,
};
use tabscope_engine::{CrawlScheduler, MemorySessionStore, SessionRecords};

use support::{init_logging, test_settings, FakeProber, ProbeReply};

fn scheduler(prober: Arc<FakeProber>) -> (CrawlScheduler, SessionRecords) {
    init_logging();
    let records = SessionRecords::new(Arc::new(MemorySessionStore::new()));
    let scheduler = CrawlScheduler::new(records.clone(), prober, &test_settings());
    (scheduler, records)
}

fn links(hrefs: &[&str]) -> Vec<LinkTarget> {
    hrefs.iter().map(|href| LinkTarget::new(*href)).collect()
}

async fn wait_until_finished(scheduler: &CrawlScheduler, tab_id: TabId) -> CrawlState {
    for _ in 0..200 {
        let state = scheduler.status(tab_id).await;
        if !state.is_running {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("crawl for tab {tab_id} never finished");
}

fn failure(label: &str) -> LinkResult {
    LinkResult {
        status: None,
        error: Some(label.to_string()),
    }
}

fn success(status: u16) -> LinkResult {
    LinkResult {
        status: Some(status),
        error: None,
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_link_is_recorded_and_crawl_finishes() {
    let prober = FakeProber::new(&[("https://b.test/", ProbeReply::Hang)]);
    let (scheduler, _) = scheduler(prober.clone());
    let targets = links(&["https://a.test/", "https://b.test/", "https://c.test/"]);

    assert_eq!(scheduler.start(1, &targets).await, StartStatus::Started);
    let state = wait_until_finished(&scheduler, 1).await;

    assert_eq!(state.results.len(), 3);
    assert_eq!(state.results["https://a.test/"], success(200));
    assert_eq!(state.results["https://b.test/"], failure("Timeout"));
    assert_eq!(state.results["https://c.test/"], success(200));
    assert_eq!(state.current_index, 3);
    assert!(!state.is_running);
    assert!(!scheduler.is_active(1));
}

#[tokio::test(start_paused = true)]
async fn probe_failures_use_fixed_labels_and_redirects_are_not_followed() {
    let prober = FakeProber::new(&[
        ("https://moved.test/", ProbeReply::Status(301)),
        ("https://dns.test/", ProbeReply::Fail(ProbeFailure::Network)),
        ("https://odd.test/", ProbeReply::Fail(ProbeFailure::Other)),
    ]);
    let (scheduler, _) = scheduler(prober.clone());
    let targets = links(&["https://moved.test/", "https://dns.test/", "https://odd.test/"]);

    scheduler.start(2, &targets).await;
    let state = wait_until_finished(&scheduler, 2).await;

    assert_eq!(state.results["https://moved.test/"], success(301));
    assert_eq!(state.results["https://dns.test/"], failure("Net/URL Err"));
    assert_eq!(state.results["https://odd.test/"], failure("Fetch Err"));
    assert_eq!(
        prober.calls(),
        vec![
            "https://moved.test/".to_string(),
            "https://dns.test/".to_string(),
            "https://odd.test/".to_string()
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn probes_are_spaced_by_crawl_delay() {
    let prober = FakeProber::new(&[]);
    let (scheduler, _) = scheduler(prober.clone());
    let targets = links(&["https://a.test/1", "https://a.test/2", "https://a.test/3"]);

    scheduler.start(3, &targets).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(prober.calls().len(), 1);

    tokio::time::sleep(Duration::from_millis(750)).await;
    assert_eq!(prober.calls().len(), 2);

    let state = wait_until_finished(&scheduler, 3).await;
    assert_eq!(state.current_index, 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_crawl_stops_probing() {
    let prober = FakeProber::new(&[]);
    let (scheduler, _) = scheduler(prober.clone());
    let targets = links(&["https://a.test/1", "https://a.test/2", "https://a.test/3"]);

    scheduler.start(4, &targets).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scheduler.is_active(4));

    assert!(scheduler.cancel(4));
    assert!(!scheduler.cancel(4));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(prober.calls().len(), 1);
    assert_eq!(scheduler.status(4).await.current_index, 1);
}

#[tokio::test(start_paused = true)]
async fn orphaned_running_crawl_resumes_at_stored_cursor() {
    let prober = FakeProber::new(&[]);
    let (scheduler, records) = scheduler(prober.clone());
    let mut seeded = CrawlState::start(None, &links(&["https://a.test/1", "https://a.test/2"]))
        .expect("valid links");
    seeded.record_probe(Ok(204));
    records.save(StateKey::crawl(5), &seeded).await;

    let status = scheduler.start(5, &links(&["https://other.test/"])).await;
    assert_eq!(status, StartStatus::AlreadyRunning);

    let state = wait_until_finished(&scheduler, 5).await;
    assert_eq!(state.current_index, 2);
    assert_eq!(state.results["https://a.test/1"], success(204));
    assert_eq!(state.results["https://a.test/2"], success(200));
    assert_eq!(prober.calls(), vec!["https://a.test/2".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn finished_crawl_can_be_restarted() {
    let prober = FakeProber::new(&[]);
    let (scheduler, _) = scheduler(prober.clone());

    scheduler.start(6, &links(&["https://a.test/"])).await;
    wait_until_finished(&scheduler, 6).await;

    assert_eq!(
        scheduler.start(6, &links(&["https://b.test/"])).await,
        StartStatus::Started
    );
    let state = wait_until_finished(&scheduler, 6).await;
    assert_eq!(state.links, links(&["https://b.test/"]));
    assert_eq!(state.results.len(), 1);
}

#[tokio::test]
async fn status_of_unknown_tab_is_idle() {
    let (scheduler, _) = scheduler(FakeProber::new(&[]));

    assert_eq!(scheduler.status(99).await, CrawlState::idle());
    assert!(!scheduler.is_active(99));
}
