use std::sync::{Arc, Mutex};

use clanker_frame_lib::{
    frame::{FrameController, FrameView, LifecycleStatus, PriceCard, Presenter},
    sdk::{FrameEvent, HeadlessSdk, SessionContext},
    settings::FrameSettings,
};
use mockito::{Matcher, Server};
use serde_json::json;
use tokio::time::{sleep, Duration, Instant};

const CONTRACT: &str = "0xABCDEF0000000000000000000000000000000042";

#[derive(Default)]
struct ViewLog {
    views: Mutex<Vec<FrameView>>,
}

impl ViewLog {
    fn len(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    fn saw(&self, predicate: impl Fn(&FrameView) -> bool) -> bool {
        self.views.lock().unwrap().iter().any(predicate)
    }
}

impl Presenter for ViewLog {
    fn present(&self, view: &FrameView) {
        self.views.lock().unwrap().push(view.clone());
    }
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn full_view_lifecycle() {
    let mut server = Server::new_async().await;
    let _price = server
        .mock("GET", "/simple/token_price/base")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("contract_addresses".into(), CONTRACT.into()),
            Matcher::UrlEncoded("vs_currencies".into(), "usd".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ CONTRACT.to_lowercase(): { "usd": 123.45 } }).to_string())
        .create_async()
        .await;

    let settings = FrameSettings {
        contract_address: CONTRACT.into(),
        api_url: format!("{}/simple/token_price/base", server.url()),
        title: "$CLANKER Price Tracker".into(),
        poll_interval_ms: 25,
        ..FrameSettings::default()
    };
    let sdk = HeadlessSdk::new(Some(SessionContext::with_added(false)));
    let views = Arc::new(ViewLog::default());
    let frame = FrameController::new(settings, Arc::new(sdk.clone()), views.clone()).unwrap();

    assert_eq!(frame.status(), LifecycleStatus::Uninitialized);
    frame.mount().await.unwrap();

    eventually("ready", || frame.status() == LifecycleStatus::Ready).await;
    eventually("registration", || frame.is_added()).await;
    eventually("price", || frame.price_reading().value == Some(123.45)).await;

    assert!(views.saw(|view| *view == FrameView::Loading));
    assert!(views.saw(|view| matches!(
        view,
        FrameView::Ready(ready) if ready.card == (PriceCard::Price { value: 123.45 })
    )));
    assert_eq!(sdk.add_frame_calls(), 1);
    assert_eq!(frame.add_frame_result().as_deref(), Some("Added"));

    sdk.emit(FrameEvent::FrameRemoved);
    assert!(!frame.is_added());

    frame.unmount().await.unwrap();
    let seen = views.len();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(views.len(), seen);
    assert_eq!(sdk.listener_count(), 0);
}

#[tokio::test]
async fn price_outage_degrades_gracefully() {
    let mut server = Server::new_async().await;
    let healthy = server
        .mock("GET", Matcher::Any)
        .with_status(200)
        .with_body(json!({ CONTRACT.to_lowercase(): { "usd": 0.061 } }).to_string())
        .create_async()
        .await;

    let settings = FrameSettings {
        contract_address: CONTRACT.into(),
        api_url: server.url(),
        poll_interval_ms: 60_000,
        ..FrameSettings::default()
    };
    let sdk = HeadlessSdk::new(Some(SessionContext::with_added(true)));
    let views = Arc::new(ViewLog::default());
    let frame = FrameController::new(settings, Arc::new(sdk), views).unwrap();

    frame.mount().await.unwrap();
    eventually("first price", || {
        let reading = frame.price_reading();
        reading.value.is_some() && !reading.loading
    })
    .await;

    healthy.remove_async().await;
    let _outage = server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    frame.refresh_price().await;
    let reading = frame.price_reading();
    assert_eq!(reading.error.as_deref(), Some("Failed to fetch price"));
    assert_eq!(reading.value, Some(0.061));
    assert!(!reading.loading);

    match frame.view() {
        FrameView::Ready(view) => assert_eq!(
            view.card,
            PriceCard::Error {
                message: "Failed to fetch price".into()
            }
        ),
        other => panic!("expected ready view, got {other:?}"),
    }

    frame.unmount().await.unwrap();
}
