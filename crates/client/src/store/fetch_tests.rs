// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use fm_core::{message_type, Envelope, RecordId, DEFAULT_FOLDER, DEFAULT_SENDER, DEFAULT_SUBJECT};
use serde_json::json;

use super::*;
use crate::api::ApiError;
use crate::test_support::{mailbox_server, settle, spawn_store, MockApi, MockConnector};

fn ids(store: &MailboxStore) -> Vec<i64> {
    store.state().emails.iter().map(|e| e.id).collect()
}

#[tokio::test(start_paused = true)]
async fn fetch_all_over_channel() {
    let connector = MockConnector::new();
    let server = connector.accept_with(mailbox_server(
        json!([{ "id": 1, "email": "a@example.com" }, { "id": "2", "email": "b@example.com" }]),
        json!([]),
    ));
    let api = MockApi::new();
    let store = spawn_store(&connector, &api);

    store.fetch_all().await.unwrap();

    assert_eq!(ids(&store), vec![1, 2]);
    let state = store.state();
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert!(api.calls().is_empty());
    assert_eq!(server.count_sent(message_type::GET_ALL_EMAILS), 1);
}

#[tokio::test(start_paused = true)]
async fn fetch_all_falls_back_after_channel_attempts() {
    let connector = MockConnector::new();
    let api = MockApi::new();
    api.respond("GET /emails", Ok(json!([{ "id": 1 }])));
    let store = spawn_store(&connector, &api);

    store.fetch_all().await.unwrap();

    assert_eq!(ids(&store), vec![1]);
    assert_eq!(store.state().error, None);
    assert_eq!(api.routes(), vec!["GET /emails"]);
    assert!(connector.attempts() >= 1);
}

#[tokio::test(start_paused = true)]
async fn silent_server_costs_three_attempts_before_fallback() {
    let connector = MockConnector::new();
    let first = connector.accept_authenticating();
    let api = MockApi::new();
    api.respond("GET /emails", Ok(json!([])));
    let store = spawn_store(&connector, &api);
    let started = tokio::time::Instant::now();

    store.fetch_all().await.unwrap();

    assert_eq!(first.count_sent(message_type::GET_ALL_EMAILS), 1);
    assert!(first.closed_by_client());
    assert_eq!(api.routes(), vec!["GET /emails"]);
    // One full timeout on the live socket, two more while reconnecting.
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn failure_on_both_paths_keeps_previous_collection() {
    let connector = MockConnector::new();
    let api = MockApi::new();
    api.respond("GET /emails", Ok(json!([{ "id": 1 }, { "id": 2 }])));
    api.respond("GET /emails", Err(ApiError::Network("connection refused".into())));
    let store = spawn_store(&connector, &api);
    store.fetch_all().await.unwrap();
    store.toggle_select(2);

    let err = store.fetch_all().await.unwrap_err();

    assert_eq!(err.to_string(), FETCH_LIST_FAILED);
    let state = store.state();
    assert_eq!(ids(&store), vec![1, 2]);
    assert_eq!(state.selected, vec![2]);
    assert_eq!(state.error.as_deref(), Some("failed to fetch mailbox list"));
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn undecodable_fallback_body_is_an_error() {
    let connector = MockConnector::new();
    let api = MockApi::new();
    api.respond("GET /emails", Ok(json!({ "unexpected": true })));
    let store = spawn_store(&connector, &api);

    let err = store.fetch_all().await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Api {
            source: ApiError::Decode(_),
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn fetch_records_normalizes_and_sets_current() {
    let connector = MockConnector::new();
    connector.accept_with(mailbox_server(json!([]), json!([{ "id": 5 }])));
    let api = MockApi::new();
    let store = spawn_store(&connector, &api);

    store.fetch_records_for(42).await.unwrap();

    let state = store.state();
    assert_eq!(state.current_email_id, Some(42));
    assert_eq!(state.current_records.len(), 1);
    let record = &state.current_records[0];
    assert_eq!(record.id, RecordId::Server(5));
    assert_eq!(record.subject, DEFAULT_SUBJECT);
    assert_eq!(record.sender, DEFAULT_SENDER);
    assert_eq!(record.folder, DEFAULT_FOLDER);
    assert!(record.is_read);
    assert!(api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fetch_records_ignores_replies_for_other_mailboxes() {
    let connector = MockConnector::new();
    let server = connector.accept_authenticating();
    let api = MockApi::new();
    let store = spawn_store(&connector, &api);
    store.channel().connect();
    settle(Duration::from_millis(300)).await;

    let task = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_records_for(42).await }
    });
    settle(Duration::from_millis(10)).await;
    server.push(Envelope::with_payload(
        message_type::MAIL_RECORDS,
        json!({ "email_id": 99, "data": [{ "id": 1 }] }),
    ));
    settle(Duration::from_millis(10)).await;
    assert!(!task.is_finished());
    server.push(Envelope::with_payload(
        message_type::MAIL_RECORDS,
        json!({ "email_id": 42, "data": [{ "id": 2 }, { "id": 3 }] }),
    ));

    task.await.unwrap().unwrap();

    let records = store.state().current_records;
    let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![RecordId::Server(2), RecordId::Server(3)]);
}

#[tokio::test(start_paused = true)]
async fn records_fallback_with_non_array_body_is_empty() {
    let connector = MockConnector::new();
    let api = MockApi::new();
    api.respond("GET /emails/7/mail_records", Ok(json!({ "message": "none" })));
    let store = spawn_store(&connector, &api);

    store.fetch_records_for(7).await.unwrap();

    let state = store.state();
    assert_eq!(state.current_email_id, Some(7));
    assert!(state.current_records.is_empty());
    assert_eq!(state.error, None);
}

#[tokio::test(start_paused = true)]
async fn records_fallback_failure_sets_error() {
    let connector = MockConnector::new();
    let api = MockApi::new();
    api.respond(
        "GET /emails/7/mail_records",
        Err(ApiError::Status {
            code: 500,
            message: "boom".into(),
        }),
    );
    let store = spawn_store(&connector, &api);

    let err = store.fetch_records_for(7).await.unwrap_err();

    assert_eq!(err.to_string(), FETCH_RECORDS_FAILED);
    assert_eq!(store.state().error.as_deref(), Some(FETCH_RECORDS_FAILED));
}

#[tokio::test(start_paused = true)]
async fn stale_records_are_discarded() {
    let connector = MockConnector::new();
    let server = connector.accept_authenticating();
    let api = MockApi::new();
    let store = spawn_store(&connector, &api);
    store.channel().connect();
    settle(Duration::from_millis(300)).await;

    let task = tokio::spawn({
        let store = store.clone();
        async move { store.fetch_records_for(42).await }
    });
    settle(Duration::from_millis(10)).await;
    store.update(|s| s.current_email_id = Some(99));
    server.push(Envelope::with_payload(
        message_type::MAIL_RECORDS,
        json!({ "email_id": 42, "data": [{ "id": 1 }] }),
    ));

    task.await.unwrap().unwrap();

    let state = store.state();
    assert_eq!(state.current_email_id, Some(99));
    assert!(state.current_records.is_empty());
}
