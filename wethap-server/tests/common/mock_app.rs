use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures::channel::mpsc as stream_mpsc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wethap_api::Handshake;
use wethap_server::app::AppContext;
use wethap_server::configs::{
    Connection, Database, Logger, SchemaManager, Schedule, Server, Settings, Storage, Weather,
};
use wethap_server::models::Sender;
use wethap_server::services::{Inbound, Outbound, SessionEnd, StaticWeather, run_sender_session};

pub struct MockApp {
    pub context: AppContext,
    pub router: Router,
}

/// One fake sender connection driven through the session loop.
pub struct MockSender {
    pub inbound: stream_mpsc::UnboundedSender<Inbound>,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    pub task: JoinHandle<SessionEnd>,
}

impl MockSender {
    pub fn send_text(&self, text: impl Into<String>) {
        self.inbound.unbounded_send(Inbound::Text(text.into())).unwrap();
    }

    pub fn send_json(&self, value: &impl serde::Serialize) {
        self.send_text(serde_json::to_string(value).unwrap());
    }

    pub async fn recv(&mut self) -> Outbound {
        tokio::time::timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .expect("timed out waiting for outbound frame")
            .expect("outbound channel closed")
    }

    pub async fn close(self) -> SessionEnd {
        self.inbound.unbounded_send(Inbound::Closed).unwrap();
        self.task.await.unwrap()
    }
}

pub fn test_settings() -> Settings {
    Settings {
        server: Server {
            host: "127.0.0.1".to_string(),
            port: 0,
            prefix: String::new(),
        },
        logger: Logger {
            level: "debug".to_string(),
        },
        database: Database {
            migration_path: None,
            clean_start: true,
            url: String::from("sqlite::memory:"),
        },
        schedule: Schedule {
            fire_times: vec!["09:25".to_string(), "10:10".to_string()],
            utc_offset_hours: 9,
            max_lateness_secs: 60,
        },
        connection: Connection {
            handshake_timeout_secs: 2,
            keep_alive_secs: 30,
        },
        weather: Weather {
            url: None,
            pointer: "/weather".to_string(),
            fallback: "sunny".to_string(),
            timeout_secs: 1,
        },
    }
}

impl MockApp {
    pub async fn new() -> Self {
        let settings = Arc::new(test_settings());
        let storage = Arc::new(
            Storage::new(settings.database.clone(), SchemaManager::default())
                .await
                .unwrap(),
        );

        let context = AppContext::new(
            settings,
            storage,
            Arc::new(StaticWeather("sunny".to_string())),
        )
        .unwrap();
        let router = context.router();

        Self { context, router }
    }

    /// Opens a session without sending anything yet.
    pub fn connect(&self) -> MockSender {
        let (inbound_tx, inbound_rx) = stream_mpsc::unbounded();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let context = self.context.session_context();

        let task = tokio::spawn(async move {
            run_sender_session(&context, inbound_rx, outbound_tx).await
        });

        MockSender {
            inbound: inbound_tx,
            outbound: outbound_rx,
            task,
        }
    }

    /// Opens a session and completes the handshake, returning the resolved label.
    pub async fn connect_as(&self, uuid: &str, lab_id: &str) -> (MockSender, String) {
        let mut sender = self.connect();
        sender.send_json(&Handshake::new(uuid, None, lab_id));

        match sender.recv().await {
            Outbound::Ack(ack) => (sender, ack.lab_id),
            other => panic!("expected handshake ack, got {other:?}"),
        }
    }

    pub async fn create_test_sender(&self, uuid: &str, identifier: Option<&str>, lab_id: &str) -> Sender {
        sqlx::query_as::<_, Sender>(
            r#"
            INSERT INTO senders (uuid, identifier, lab_id, create_at, update_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING *;
            "#,
        )
        .bind(uuid)
        .bind(identifier)
        .bind(lab_id)
        .bind(time::OffsetDateTime::now_utc())
        .fetch_one(self.context.storage.get_pool())
        .await
        .unwrap()
    }

    /// Runs raw SQL against the test database, e.g. to install failing triggers.
    pub async fn execute(&self, sql: &str) {
        sqlx::query(sql)
            .execute(self.context.storage.get_pool())
            .await
            .unwrap();
    }

    /// Polls until the registry reports no sessions, so disconnect handling can be asserted.
    pub async fn wait_until_empty(&self) {
        for _ in 0..100 {
            if self.context.registry.is_empty().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("registry still has sessions");
    }
}
