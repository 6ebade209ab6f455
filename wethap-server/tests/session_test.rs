use std::collections::BTreeSet;
use std::time::Duration;

use wethap_api::message::{CLOSE_INTERNAL_ERROR, CLOSE_POLICY_VIOLATION, CLOSE_SUPERSEDED};
use wethap_api::{Handshake, Info, ReadingReport, ServerPush};
use wethap_server::errors::RenameError;
use wethap_server::services::{Outbound, RenameTarget, SessionEnd};

mod common;
use common::mock_app::{MockApp, MockSender};

fn report(lab_id: &str, num_gen: Option<u32>) -> ReadingReport {
    ReadingReport {
        info: Info {
            lab_id: lab_id.to_string(),
            date: Some("2024-05-01".to_string()),
            time: Some("09:25:00".to_string()),
            num_gen,
            temperature: 23.5,
            humidity: 41.0,
            pressure: 1009.8,
        },
    }
}

async fn wait_for_reading(app: &MockApp, lab_id: &str, num_gen: i64) -> wethap_server::models::Info {
    for _ in 0..100 {
        if let Some(info) = app
            .context
            .info_repository
            .find_one(lab_id, "2024-05-01", num_gen)
            .await
            .unwrap()
        {
            return info;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("reading {num_gen} for {lab_id} never stored");
}

#[tokio::test]
async fn test_first_connect_then_wrong_guess_keeps_label() {
    let app = MockApp::new().await;

    let (sender, lab_id) = app.connect_as("dev-1", "Lab1").await;
    assert_eq!(lab_id, "Lab1");
    assert_eq!(sender.close().await, SessionEnd::Closed);
    app.wait_until_empty().await;

    let (sender, lab_id) = app.connect_as("dev-1", "WrongGuess").await;
    assert_eq!(lab_id, "Lab1");
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["Lab1".to_string()])
    );
    sender.close().await;

    let senders = app.context.sender_repository.find_all().await.unwrap();
    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0].lab_id, "Lab1");
}

#[tokio::test]
async fn test_taken_label_falls_back_to_placeholder() {
    let app = MockApp::new().await;

    let (first, first_label) = app.connect_as("dev-a", "Lab1").await;
    let (second, second_label) = app.connect_as("dev-b", "Lab1").await;

    assert_eq!(first_label, "Lab1");
    assert_eq!(second_label, "dummy2");
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["Lab1".to_string(), "dummy2".to_string()])
    );

    first.close().await;
    second.close().await;
}

#[tokio::test]
async fn test_disconnect_removes_room() {
    let app = MockApp::new().await;

    let (sender, _) = app.connect_as("dev-1", "Lab1").await;
    assert_eq!(app.context.registry.len().await, 1);

    // Dropping the inbound side is a read failure for the session
    let MockSender { inbound, task, .. } = sender;
    drop(inbound);
    assert_eq!(task.await.unwrap(), SessionEnd::Closed);

    assert!(app.context.registry.active_rooms().await.is_empty());
    assert_eq!(app.context.registry.find_session_by_room("Lab1").await, None);
}

#[tokio::test]
async fn test_malformed_handshake_closes_with_policy_violation() {
    let app = MockApp::new().await;

    let mut sender = app.connect();
    sender.send_text("{not json");

    assert_eq!(sender.recv().await, Outbound::Close(CLOSE_POLICY_VIOLATION));
    assert_eq!(sender.task.await.unwrap(), SessionEnd::ProtocolViolation);
    assert!(app.context.sender_repository.find_all().await.unwrap().is_empty());
    app.wait_until_empty().await;
}

#[tokio::test]
async fn test_handshake_without_uuid_is_rejected() {
    let app = MockApp::new().await;

    let mut sender = app.connect();
    sender.send_text(r#"{"labID": "Lab1"}"#);

    assert_eq!(sender.recv().await, Outbound::Close(CLOSE_POLICY_VIOLATION));
    assert_eq!(sender.task.await.unwrap(), SessionEnd::ProtocolViolation);
    assert!(app.context.registry.active_rooms().await.is_empty());
}

#[tokio::test]
async fn test_silent_connection_times_out() {
    let app = MockApp::new().await;

    let mut sender = app.connect();

    assert_eq!(sender.recv().await, Outbound::Close(CLOSE_POLICY_VIOLATION));
    assert_eq!(sender.task.await.unwrap(), SessionEnd::HandshakeTimeout);
    app.wait_until_empty().await;
}

#[tokio::test]
async fn test_close_during_handshake() {
    let app = MockApp::new().await;

    let sender = app.connect();
    assert_eq!(sender.close().await, SessionEnd::ClosedDuringHandshake);
    app.wait_until_empty().await;
}

#[tokio::test]
async fn test_reconnect_supersedes_live_session() {
    let app = MockApp::new().await;

    let (mut old, _) = app.connect_as("dev-1", "Lab1").await;
    let (new, lab_id) = app.connect_as("dev-1", "Lab1").await;

    assert_eq!(lab_id, "Lab1");
    assert_eq!(old.recv().await, Outbound::Close(CLOSE_SUPERSEDED));
    assert_eq!(app.context.registry.len().await, 1);

    old.close().await;
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["Lab1".to_string()])
    );
    new.close().await;
}

#[tokio::test]
async fn test_scheduled_report_is_stored() {
    let app = MockApp::new().await;

    let (sender, _) = app.connect_as("dev-1", "Lab1").await;
    sender.send_json(&report("Lab1", Some(1)));

    let info = wait_for_reading(&app, "Lab1", 1).await;
    assert_eq!(info.temperature, 23.5);
    assert_eq!(info.weather, "sunny");
    assert_eq!(info.time.as_deref(), Some("09:25:00"));

    sender.close().await;
}

#[tokio::test]
async fn test_manual_report_goes_to_manual_readings() {
    let app = MockApp::new().await;

    let (sender, _) = app.connect_as("dev-1", "Lab1").await;
    sender.send_json(&report("Lab1", None));
    sender.send_json(&report("Lab1", Some(2)));
    wait_for_reading(&app, "Lab1", 2).await;

    let manual = app
        .context
        .manual_info_repository
        .find_latest_by_lab_id("Lab1", 10)
        .await
        .unwrap();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].pressure, 1009.8);

    sender.close().await;
}

#[tokio::test]
async fn test_malformed_report_keeps_session() {
    let app = MockApp::new().await;

    let (sender, _) = app.connect_as("dev-1", "Lab1").await;
    sender.send_text("garbage");
    sender.send_text(r#"{"info": {"labID": "Lab1"}}"#);
    sender.send_json(&report("Lab1", Some(1)));

    wait_for_reading(&app, "Lab1", 1).await;
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["Lab1".to_string()])
    );

    sender.close().await;
}

#[tokio::test]
async fn test_report_after_rename_uses_new_label() {
    let app = MockApp::new().await;

    let (mut sender, _) = app.connect_as("dev-1", "Lab1").await;

    let outcome = app
        .context
        .rename_coordinator
        .rename(&RenameTarget::Label("Lab1".to_string()), "Lab7")
        .await
        .unwrap();
    assert!(outcome.notified);
    assert_eq!(
        sender.recv().await,
        Outbound::Push(ServerPush::ChangeLabId {
            new_lab_id: "Lab7".to_string()
        })
    );

    // The device has not caught up yet and still reports the old label
    sender.send_json(&report("Lab1", Some(1)));
    wait_for_reading(&app, "Lab7", 1).await;

    assert!(
        app.context
            .info_repository
            .find_one("Lab1", "2024-05-01", 1)
            .await
            .unwrap()
            .is_none()
    );

    sender.close().await;
}

#[tokio::test]
async fn test_handshake_identifier_rebinds_new_key() {
    let app = MockApp::new().await;
    app.create_test_sender("old-key", Some("pico-7"), "T4").await;

    let mut sender = app.connect();
    sender.send_json(&Handshake::new("new-key", Some("pico-7".to_string()), "Elsewhere"));

    match sender.recv().await {
        Outbound::Ack(ack) => assert_eq!(ack.lab_id, "T4"),
        other => panic!("unexpected {other:?}"),
    }

    let stored = app
        .context
        .sender_repository
        .find_by_identifier("pico-7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.uuid, "new-key");

    sender.close().await;
}

#[tokio::test]
async fn test_identifier_of_connected_device_is_refused() {
    let app = MockApp::new().await;
    app.create_test_sender("old-key", Some("pico-7"), "T4").await;

    let mut owner = app.connect();
    owner.send_json(&Handshake::new("old-key", Some("pico-7".to_string()), "T4"));
    assert!(matches!(owner.recv().await, Outbound::Ack(_)));

    let mut intruder = app.connect();
    intruder.send_json(&Handshake::new("new-key", Some("pico-7".to_string()), "T4"));

    assert_eq!(intruder.recv().await, Outbound::Close(CLOSE_POLICY_VIOLATION));
    assert_eq!(intruder.task.await.unwrap(), SessionEnd::ProtocolViolation);

    let stored = app
        .context
        .sender_repository
        .find_by_identifier("pico-7")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.uuid, "old-key");
    assert!(owner.outbound.try_recv().is_err());
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["T4".to_string()])
    );

    owner.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rename_during_handshake_settles_on_new_label() {
    let app = MockApp::new().await;
    app.create_test_sender("dev-1", None, "A").await;

    let target = RenameTarget::Label("A".to_string());
    let rename = app.context.rename_coordinator.rename(&target, "B");
    let ((mut sender, acked), outcome) = tokio::join!(app.connect_as("dev-1", "A"), rename);
    let outcome = outcome.unwrap();

    // Either the rename landed first and the ack already carries B, or the
    // session attached first and is told about B right after the ack
    if acked == "A" {
        assert!(outcome.notified);
        assert_eq!(
            sender.recv().await,
            Outbound::Push(ServerPush::ChangeLabId {
                new_lab_id: "B".to_string()
            })
        );
    } else {
        assert_eq!(acked, "B");
        assert!(!outcome.notified);
    }

    let stored = app.context.sender_repository.find_by_uuid("dev-1").await.unwrap().unwrap();
    assert_eq!(stored.lab_id, "B");
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["B".to_string()])
    );

    sender.close().await;
}

#[tokio::test]
async fn test_failed_insert_closes_with_internal_error() {
    let app = MockApp::new().await;
    app.execute(
        "CREATE TRIGGER reject_insert BEFORE INSERT ON senders BEGIN SELECT RAISE(ABORT, 'read only'); END;",
    )
    .await;

    let mut sender = app.connect();
    sender.send_json(&Handshake::new("dev-1", None, "Lab1"));

    assert_eq!(sender.recv().await, Outbound::Close(CLOSE_INTERNAL_ERROR));
    assert_eq!(sender.task.await.unwrap(), SessionEnd::StorageFailure);
    assert!(app.context.registry.active_rooms().await.is_empty());
    app.wait_until_empty().await;
}

#[tokio::test]
async fn test_failed_rename_keeps_live_label() {
    let app = MockApp::new().await;
    let (mut sender, _) = app.connect_as("dev-1", "Lab1").await;
    app.execute(
        "CREATE TRIGGER reject_update BEFORE UPDATE ON senders BEGIN SELECT RAISE(ABORT, 'read only'); END;",
    )
    .await;

    let err = app
        .context
        .rename_coordinator
        .rename(&RenameTarget::Label("Lab1".to_string()), "Lab7")
        .await
        .unwrap_err();

    assert!(matches!(err, RenameError::Storage(_)));
    assert_eq!(
        app.context.registry.active_rooms().await,
        BTreeSet::from(["Lab1".to_string()])
    );
    assert!(sender.outbound.try_recv().is_err());

    let stored = app.context.sender_repository.find_by_uuid("dev-1").await.unwrap().unwrap();
    assert_eq!(stored.lab_id, "Lab1");

    sender.close().await;
}

#[tokio::test]
async fn test_session_ends_when_writer_is_gone() {
    let app = MockApp::new().await;

    let (sender, _) = app.connect_as("dev-1", "Lab1").await;
    let MockSender {
        inbound: _inbound,
        outbound,
        task,
    } = sender;
    drop(outbound);

    assert_eq!(app.context.registry.broadcast(&ServerPush::KeepAlive, None).await, 0);
    assert_eq!(task.await.unwrap(), SessionEnd::Evicted);
    assert!(app.context.registry.is_empty().await);
}
