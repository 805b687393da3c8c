mod support;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::{raw_event, test_config, RecordingTransport, EVENTS_URL, GROUPS_URL};
use tokio::sync::RwLock;
use vrc_event_relay::components::vrchat::models::EventDetail;
use vrc_event_relay::components::vrchat::{EventRecord, GroupRecord};
use vrc_event_relay::components::website::{Delivery, Forwarder, HttpMethod};
use vrc_event_relay::config::Config;

fn record(event_id: &str) -> EventRecord {
    EventRecord::from_listing("grp_1", raw_event(event_id, "Meetup"), EventDetail::default())
}

fn forwarder(config: Config, transport: &Arc<RecordingTransport>) -> Forwarder {
    Forwarder::new(Arc::new(RwLock::new(config)), transport.clone())
}

#[tokio::test]
async fn test_batch_counts_only_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::with_statuses(&[201, 500, 200, 202]));
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    let events = vec![record("e1"), record("e2"), record("e3"), record("e4")];
    let outcome = forwarder.send_batch(&events).await;

    assert_eq!(outcome.attempted, 4);
    assert!(!outcome.skipped);
    assert_eq!(outcome.sent(), 2);
    assert_eq!(outcome.accepted, vec!["e1 from grp_1", "e3 from grp_1"]);

    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    for request in &requests {
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, EVENTS_URL);
        assert_eq!(request.api_key, "secret");
        assert_eq!(request.contact, "ops@example.com");
    }
}

#[tokio::test]
async fn test_event_payload_shape() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    forwarder.send_batch(&[record("e1")]).await;

    let body = transport.requests()[0].body.clone().unwrap();
    assert_eq!(
        body,
        json!({
            "group_id": "grp_1",
            "event_id": "e1",
            "title": "Meetup",
            "description": "Meetup description",
            "starts_at": "2099-01-01T20:00:00Z",
            "ends_at": "2099-01-01T22:00:00Z",
            "category": "hangout",
            "access_type": "public",
            "platforms": [],
            "image_url": null,
            "tags": []
        })
    );
}

#[tokio::test]
async fn test_unconfigured_forwarding_makes_no_calls() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let mut config = test_config(dir.path(), &[]);
    config.api_key = None;
    let forwarder = forwarder(config, &transport);

    let outcome = forwarder.send_batch(&[record("e1"), record("e2")]).await;

    assert!(outcome.skipped);
    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.sent(), 2);
    assert_eq!(forwarder.delete_event("123").await, Delivery::Skipped);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    let outcome = forwarder.send_batch(&[]).await;

    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.sent(), 0);
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_batch_is_paced_between_items() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let mut config = test_config(dir.path(), &[]);
    config.forward_pacing_ms = 2000;
    let forwarder = forwarder(config, &transport);

    let start = tokio::time::Instant::now();
    forwarder
        .send_batch(&[record("e1"), record("e2"), record("e3")])
        .await;
    let elapsed = start.elapsed();

    // Two gaps for three items, none after the last
    assert!(elapsed >= Duration::from_secs(4));
    assert!(elapsed < Duration::from_secs(6));
}

#[tokio::test]
async fn test_single_item_routes() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::with_statuses(&[
        200, 201, 404, 200, 200, 204,
    ]));
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);
    let group = GroupRecord {
        group_id: "grp_9".to_string(),
        name: "Chill Club".to_string(),
        description: "Evenings".to_string(),
    };

    assert_eq!(forwarder.create_event(&record("e1")).await, Delivery::Accepted);
    assert_eq!(forwarder.update_event("123", &record("e1")).await, Delivery::Accepted);
    assert_eq!(forwarder.delete_event("123").await, Delivery::Rejected(404));
    assert_eq!(forwarder.create_group(&group).await, Delivery::Accepted);
    assert_eq!(forwarder.update_group(&group).await, Delivery::Accepted);
    assert_eq!(forwarder.delete_group("grp_9").await, Delivery::Rejected(204));

    let calls: Vec<(HttpMethod, String)> = transport
        .requests()
        .into_iter()
        .map(|r| (r.method, r.url))
        .collect();
    assert_eq!(
        calls,
        vec![
            (HttpMethod::Post, EVENTS_URL.to_string()),
            (HttpMethod::Post, format!("{}/123/update", EVENTS_URL)),
            (HttpMethod::Post, format!("{}/123/delete", EVENTS_URL)),
            (HttpMethod::Post, GROUPS_URL.to_string()),
            (HttpMethod::Put, format!("{}/grp_9", GROUPS_URL)),
            (HttpMethod::Delete, format!("{}/grp_9", GROUPS_URL)),
        ]
    );

    let requests = transport.requests();
    assert_eq!(requests[2].body, None);
    assert_eq!(
        requests[3].body,
        Some(json!({
            "vrc_group_id": "grp_9",
            "name": "Chill Club",
            "description": "Evenings"
        }))
    );
}

#[tokio::test]
async fn test_transport_error_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let replies = [None, Some(201), Some(200)];
    let transport = Arc::new(RecordingTransport::with_replies(&replies));
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    let outcome = forwarder
        .send_batch(&[record("e1"), record("e2"), record("e3")])
        .await;

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.sent(), 2);
    assert_eq!(outcome.accepted, vec!["e2 from grp_1", "e3 from grp_1"]);
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_transport_error_on_single_item() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::with_replies(&[None]));
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    let delivery = forwarder.delete_event("123").await;

    assert!(matches!(delivery, Delivery::Failed(_)));
    assert!(!delivery.is_success());
}

#[tokio::test]
async fn test_ids_are_escaped_as_one_path_segment() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let forwarder = forwarder(test_config(dir.path(), &[]), &transport);

    forwarder.delete_event("12?force=1#x").await;
    forwarder.delete_event("../../admin").await;
    forwarder.update_event("a b", &record("e1")).await;
    forwarder.delete_group("grp 1/x").await;

    assert_eq!(
        transport.urls(),
        vec![
            format!("{}/12%3Fforce=1%23x/delete", EVENTS_URL),
            format!("{}/..%2F..%2Fadmin/delete", EVENTS_URL),
            format!("{}/a%20b/update", EVENTS_URL),
            format!("{}/grp%201%2Fx", GROUPS_URL),
        ]
    );
}

#[tokio::test]
async fn test_unparseable_endpoint_fails_without_sending() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(RecordingTransport::new());
    let mut config = test_config(dir.path(), &[]);
    config.event_endpoint = Some("not a url".to_string());
    let forwarder = forwarder(config, &transport);

    let outcome = forwarder.send_batch(&[record("e1")]).await;
    assert!(!outcome.skipped);
    assert!(outcome.accepted.is_empty());

    assert!(matches!(
        forwarder.delete_event("123").await,
        Delivery::Failed(_)
    ));
    assert!(transport.requests().is_empty());
}
