use pretty_assertions::assert_eq;
use tabscope_core::{crawlable_links, CrawlState, LinkResult, LinkTarget, ProbeFailure, StartStatus};

fn links(hrefs: &[&str]) -> Vec<LinkTarget> {
    hrefs.iter().map(|href| LinkTarget::new(*href)).collect()
}

#[test]
fn only_absolute_http_links_are_crawlable() {
    let input = links(&[
        "https://a.test/",
        "mailto:someone@a.test",
        "/relative/path",
        "javascript:void(0)",
        "http://b.test/page",
        "ftp://c.test/file",
        "",
    ]);

    assert_eq!(
        crawlable_links(&input),
        links(&["https://a.test/", "http://b.test/page"])
    );
}

#[test]
fn start_rejects_when_nothing_is_crawlable() {
    let result = CrawlState::start(None, &links(&["mailto:x@y.test", "#top"]));
    assert_eq!(result, Err(StartStatus::NoValidLinks));
}

#[test]
fn start_rejects_while_running_and_keeps_cursor() {
    let mut running = CrawlState::start(None, &links(&["https://a.test/", "https://b.test/"]))
        .expect("started");
    assert!(running.record_probe(Ok(200)));

    let again = CrawlState::start(Some(&running), &links(&["https://c.test/"]));
    assert_eq!(again, Err(StartStatus::AlreadyRunning));
    assert_eq!(running.current_index, 1);
}

#[test]
fn finished_crawl_can_be_restarted() {
    let mut state = CrawlState::start(None, &links(&["https://a.test/"])).unwrap();
    state.record_probe(Ok(204));
    assert!(!state.is_running);

    let restarted = CrawlState::start(Some(&state), &links(&["https://b.test/"])).unwrap();
    assert!(restarted.is_running);
    assert_eq!(restarted.current_index, 0);
    assert!(restarted.results.is_empty());
}

#[test]
fn probes_advance_cursor_and_finish() {
    let mut state = CrawlState::start(
        None,
        &links(&["https://a.test/", "https://b.test/", "https://c.test/"]),
    )
    .unwrap();

    assert!(state.record_probe(Ok(200)));
    assert!(state.record_probe(Err(ProbeFailure::Timeout)));
    assert!(state.is_running);
    assert!(state.record_probe(Ok(301)));

    assert_eq!(state.current_index, 3);
    assert!(!state.is_running);
    assert_eq!(state.results.len(), 3);
    assert_eq!(
        state.results["https://b.test/"],
        LinkResult {
            status: None,
            error: Some("Timeout".into())
        }
    );
    assert_eq!(state.results["https://c.test/"].status, Some(301));

    assert!(!state.record_probe(Ok(200)));
    assert_eq!(state.current_index, 3);
}

#[test]
fn halted_crawl_accepts_no_more_results() {
    let mut state = CrawlState::start(None, &links(&["https://a.test/", "https://b.test/"])).unwrap();
    state.halt();

    assert_eq!(state.current_link(), None);
    assert!(!state.record_probe(Ok(200)));
    assert_eq!(state.current_index, 0);
}

#[test]
fn failure_labels_match_ui_vocabulary() {
    assert_eq!(ProbeFailure::Timeout.to_string(), "Timeout");
    assert_eq!(ProbeFailure::Network.to_string(), "Net/URL Err");
    assert_eq!(ProbeFailure::Other.to_string(), "Fetch Err");
}
