use std::time::{Duration, Instant};

use bankid_rp::{CancellationToken, HintCode, OrderHandle, Status};
use tokio_stream::StreamExt;

use super::test_utils::{client_for, collect_body, init_logging, mount_collect, request_count};

#[tokio::test]
async fn pending_pending_complete_yields_three_states_two_seconds_apart() {
    init_logging();
    let server = wiremock::MockServer::start().await;
    mount_collect(
        &server,
        collect_body("ref-1", "pending", Some("outstandingTransaction")),
        2,
    )
    .await;
    mount_collect(&server, collect_body("ref-1", "complete", None), 10).await;

    let mut updates = client_for(&server).poll(OrderHandle::new("ref-1"), CancellationToken::new());
    let mut states = Vec::new();
    let mut arrivals = Vec::new();
    while let Some(update) = updates.next().await {
        arrivals.push(Instant::now());
        states.push(update.expect("collect state"));
    }

    let statuses: Vec<Status> = states.iter().map(|state| state.status).collect();
    assert_eq!(statuses, vec![Status::Pending, Status::Pending, Status::Complete]);
    assert_eq!(
        states[0].hint_code,
        Some(HintCode::OutstandingTransaction)
    );
    let gap = arrivals[1].duration_since(arrivals[0]);
    assert!(gap >= Duration::from_millis(1_900), "polled too early: {gap:?}");
    assert!(gap < Duration::from_millis(3_500), "polled too late: {gap:?}");

    let completion = states[2].completion_data.as_ref().expect("completion data");
    assert_eq!(completion.user.name, "Karl Karlsson");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(request_count(&server, "/collect").await, 3);
}

#[tokio::test]
async fn wait_for_completion_returns_terminal_state() {
    let server = wiremock::MockServer::start().await;
    mount_collect(&server, collect_body("ref-2", "failed", Some("expiredTransaction")), 10).await;

    let outcome = client_for(&server)
        .wait_for_completion(OrderHandle::new("ref-2"), CancellationToken::new())
        .await
        .expect("poll outcome")
        .expect("terminal state");
    assert_eq!(outcome.status, Status::Failed);
    assert_eq!(outcome.hint_code, Some(HintCode::ExpiredTransaction));
    assert!(outcome.user_message().is_some());
}

#[tokio::test]
async fn cancelling_between_polls_stops_network_calls() {
    let server = wiremock::MockServer::start().await;
    mount_collect(&server, collect_body("ref-3", "pending", Some("noClient")), 100).await;

    let cancel = CancellationToken::new();
    let mut updates = client_for(&server).poll(OrderHandle::new("ref-3"), cancel.clone());
    let first = updates.next().await.expect("first state").expect("pending");
    assert_eq!(first.status, Status::Pending);

    cancel.cancel();
    assert!(updates.next().await.is_none());

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(request_count(&server, "/collect").await, 1);
}

#[tokio::test]
async fn dropping_the_stream_stops_polling() {
    let server = wiremock::MockServer::start().await;
    mount_collect(&server, collect_body("ref-4", "pending", Some("started")), 100).await;

    let mut updates = client_for(&server).poll(OrderHandle::new("ref-4"), CancellationToken::new());
    updates.next().await.expect("first state").expect("pending");
    drop(updates);

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(request_count(&server, "/collect").await, 1);
}

#[tokio::test]
async fn cancelled_wait_returns_none() {
    let server = wiremock::MockServer::start().await;
    mount_collect(&server, collect_body("ref-5", "pending", None), 100).await;

    let cancel = CancellationToken::new();
    let client = client_for(&server);
    let waiter = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            client
                .wait_for_completion(OrderHandle::new("ref-5"), cancel)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    cancel.cancel();

    let outcome = waiter.await.expect("join").expect("no error");
    assert!(outcome.is_none());
}
