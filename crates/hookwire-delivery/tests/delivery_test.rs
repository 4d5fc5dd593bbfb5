//! End-to-end delivery tests against a mock HTTP endpoint.
//!
//! Covers the success path, retry exhaustion, signing behavior, and the
//! byte-stability of the transmitted payload across retries.

use std::sync::Arc;

use anyhow::Result;
use hookwire_core::{Clock, DeliveryStatus, EventKind, ScopeId, Subscription, TestClock};
use hookwire_delivery::{
    client::{HEADER_RETRY_COUNT, HEADER_SIGNATURE},
    sign, DeliveryConfig, Dispatcher, InMemorySubscriptionStore,
};
use serde_json::json;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

struct TestHarness {
    server: MockServer,
    dispatcher: Dispatcher,
    scope: ScopeId,
    clock: TestClock,
}

async fn harness_with(subscription_for: impl FnOnce(String) -> Subscription) -> TestHarness {
    let server = MockServer::start().await;
    let store = Arc::new(InMemorySubscriptionStore::new());
    let scope = ScopeId::new();

    store.insert(scope, subscription_for(format!("{}/hook", server.uri()))).await;

    let clock = TestClock::new();
    let dispatcher =
        Dispatcher::with_clock(store, DeliveryConfig::default(), Arc::new(clock.clone()))
            .expect("dispatcher should build");

    TestHarness { server, dispatcher, scope, clock }
}

#[tokio::test]
async fn successful_delivery_on_first_attempt() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("crm sync", url).with_events([EventKind::ClientCreated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .and(matchers::path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&harness.server)
        .await;

    let records = harness
        .dispatcher
        .client_created(harness.scope, &json!({ "name": "Acme" }))
        .await;

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.status, DeliveryStatus::Success);
    assert_eq!(record.retry_count, 0);
    assert_eq!(record.status_code, Some(200));
    assert_eq!(record.response_body.as_deref(), Some("ok"));
    assert!(record.error_message.is_none());

    Ok(())
}

#[tokio::test]
async fn persistent_server_error_exhausts_retries() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("flaky endpoint", url).with_events([EventKind::ClientCreated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("nope"))
        .expect(4)
        .mount(&harness.server)
        .await;

    let started = harness.clock.now_utc();
    let records = harness
        .dispatcher
        .client_created(harness.scope, &json!({ "name": "Acme" }))
        .await;

    let record = &records[0];
    assert_eq!(record.status, DeliveryStatus::Failed);
    assert_eq!(record.retry_count, 3);
    assert_eq!(record.max_retries, 3);
    assert_eq!(record.status_code, Some(500));

    // Exactly 4 outbound requests: 1 initial + 3 retries, with the
    // retry-count header increasing per attempt.
    let requests = harness.server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 4);
    for (i, request) in requests.iter().enumerate() {
        let retry_count = request.headers.get(HEADER_RETRY_COUNT).unwrap().to_str()?;
        assert_eq!(retry_count, i.to_string());
    }

    // Backoff slept 1s + 2s + 4s of virtual time, each jittered by ±25%.
    let slept_ms = (harness.clock.now_utc() - started).num_milliseconds();
    assert!(slept_ms >= 5_250, "expected at least 5.25s of backoff, got {slept_ms}ms");
    assert!(slept_ms <= 8_750, "expected at most 8.75s of backoff, got {slept_ms}ms");

    Ok(())
}

#[tokio::test]
async fn success_on_retry_stops_consuming_budget() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("recovers", url).with_events([EventKind::TaskCompleted])
    })
    .await;

    // First attempt fails, second succeeds; no further requests follow.
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&harness.server)
        .await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let records =
        harness.dispatcher.task_completed(harness.scope, &json!({ "id": 7 })).await;

    let record = &records[0];
    assert_eq!(record.status, DeliveryStatus::Success);
    assert_eq!(record.retry_count, 1);
    assert_eq!(record.status_code, Some(204));

    Ok(())
}

#[tokio::test]
async fn unsigned_subscription_sends_no_signature_header() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("no secret", url).with_events([EventKind::ClientCreated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&harness.server)
        .await;

    harness.dispatcher.client_created(harness.scope, &json!({ "name": "Acme" })).await;

    let requests = harness.server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get(HEADER_SIGNATURE).is_none());

    Ok(())
}

#[tokio::test]
async fn signature_matches_transmitted_bytes() -> Result<()> {
    let secret = "whsec_test_key";
    let harness = harness_with(move |url| {
        Subscription::new("signed", url)
            .with_secret(secret)
            .with_events([EventKind::ClientCreated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&harness.server)
        .await;

    harness.dispatcher.client_created(harness.scope, &json!({ "name": "Acme" })).await;

    let requests = harness.server.received_requests().await.expect("recording enabled");
    let request = &requests[0];
    let signature = request.headers.get(HEADER_SIGNATURE).expect("signature header").to_str()?;

    // Recomputing the HMAC over the exact received body must match.
    assert!(sign::verify(&request.body, signature, secret));

    // Any altered byte invalidates it.
    let mut tampered = request.body.clone();
    tampered[0] ^= 0x01;
    assert!(!sign::verify(&tampered, signature, secret));

    Ok(())
}

#[tokio::test]
async fn body_is_byte_identical_across_retries() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("signed flaky", url)
            .with_secret("whsec_retry")
            .with_events([EventKind::ProjectUpdated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&harness.server)
        .await;

    harness
        .dispatcher
        .project_updated(
            harness.scope,
            &json!({ "status": "active" }),
            &json!({ "status": "done" }),
        )
        .await;

    let requests = harness.server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 4);

    let first_body = &requests[0].body;
    for request in &requests[1..] {
        assert_eq!(&request.body, first_body);
        // The signature rides along unchanged, matching the stable body.
        assert_eq!(
            request.headers.get(HEADER_SIGNATURE),
            requests[0].headers.get(HEADER_SIGNATURE)
        );
    }

    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_records_network_failure() -> Result<()> {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let scope = ScopeId::new();
    store
        .insert(
            scope,
            // Nothing listens on this port.
            Subscription::new("dead endpoint", "http://127.0.0.1:49151/hook")
                .with_events([EventKind::ClientCreated]),
        )
        .await;

    let dispatcher = Dispatcher::with_clock(
        store,
        DeliveryConfig::default(),
        Arc::new(TestClock::new()),
    )?;

    let records = dispatcher.client_created(scope, &json!({ "name": "Acme" })).await;

    let record = &records[0];
    assert_eq!(record.status, DeliveryStatus::Failed);
    assert_eq!(record.retry_count, 3);
    assert!(record.status_code.is_none());
    assert!(record.error_message.as_deref().unwrap_or_default().contains("network error"));

    Ok(())
}

#[tokio::test]
async fn shutdown_interrupts_pending_deliveries() -> Result<()> {
    let harness = harness_with(|url| {
        Subscription::new("cancelled", url).with_events([EventKind::ClientCreated])
    })
    .await;

    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;

    harness.dispatcher.shutdown();

    let records = harness
        .dispatcher
        .client_created(harness.scope, &json!({ "name": "Acme" }))
        .await;

    let record = &records[0];
    assert_eq!(record.status, DeliveryStatus::Failed);
    assert!(record.error_message.as_deref().unwrap_or_default().contains("cancelled"));

    Ok(())
}
