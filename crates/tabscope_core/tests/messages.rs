use serde_json::json;
use tabscope_core::{reconstruct, CrawlState, LinkTarget, Request, Response, StartStatus, TabNavigationState};

#[test]
fn requests_parse_from_action_tagged_json() {
    let raw = json!({
        "action": "startCrawlingForTab",
        "tabId": 12,
        "links": [{"href": "https://a.test/"}, {"href": "https://b.test/"}]
    });
    let request: Request = serde_json::from_value(raw).unwrap();
    assert_eq!(
        request,
        Request::StartCrawlingForTab {
            tab_id: 12,
            links: vec![LinkTarget::new("https://a.test/"), LinkTarget::new("https://b.test/")],
        }
    );
    assert_eq!(request.action(), "startCrawlingForTab");

    let ping: Request = serde_json::from_value(json!({"action": "contentScriptLoaded"})).unwrap();
    assert_eq!(ping, Request::ContentScriptLoaded);

    let psi: Request = serde_json::from_value(json!({
        "action": "savePsiDataForTab",
        "tabId": 3,
        "psiData": {"score": 0.93}
    }))
    .unwrap();
    assert_eq!(
        psi,
        Request::SavePsiDataForTab {
            tab_id: 3,
            psi_data: json!({"score": 0.93}),
        }
    );
}

#[test]
fn unknown_actions_are_rejected() {
    let result = serde_json::from_value::<Request>(json!({"action": "selfDestruct", "tabId": 1}));
    assert!(result.is_err());
}

#[test]
fn responses_serialize_to_ui_shapes() {
    let started = Response::CrawlStarted {
        status: StartStatus::AlreadyRunning,
    };
    assert_eq!(
        serde_json::to_value(&started).unwrap(),
        json!({"status": "already_running"})
    );

    let idle = Response::CrawlStatus(CrawlState::idle());
    assert_eq!(
        serde_json::to_value(&idle).unwrap(),
        json!({"isRunning": false, "links": [], "currentIndex": 0, "results": {}, "error": null})
    );

    let chain = Response::RedirectChain(reconstruct(Some(&TabNavigationState::begin(
        "http://a.test/",
    ))));
    assert_eq!(
        serde_json::to_value(&chain).unwrap(),
        json!({
            "chain": [{"url": "http://a.test/", "status": 0, "error": null}],
            "completed": false,
            "error": null,
            "finalStatus": 0
        })
    );

    assert_eq!(
        serde_json::to_value(Response::PsiData { psi_data: None }).unwrap(),
        json!({"psiData": null})
    );
    assert_eq!(
        serde_json::to_value(Response::status("psi_saved")).unwrap(),
        json!({"status": "psi_saved"})
    );
}

#[test]
fn persisted_navigation_state_round_trips_through_json() {
    let stored = json!({
        "firstUrl": "http://a.test/",
        "requestDetails": {
            "http://a.test/": {"statusCode": 301, "redirectUrl": "http://b.test/", "error": null},
            "http://b.test/": {"statusCode": 0, "redirectUrl": null, "error": null}
        },
        "completed": false,
        "error": null
    });
    let state: TabNavigationState = serde_json::from_value(stored.clone()).unwrap();
    assert_eq!(state.step("http://a.test/").unwrap().status_code, 301);
    assert_eq!(serde_json::to_value(&state).unwrap(), stored);
}
