use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// A device known to the server, keyed by its persistent device key (`uuid`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sender {
    pub id: i64,
    pub uuid: String,
    pub identifier: Option<String>,
    pub lab_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub create_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub update_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct SenderTable;

impl Table for SenderTable {
    fn name(&self) -> &'static str {
        "senders"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS senders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid VARCHAR(64) NOT NULL UNIQUE,
                identifier VARCHAR(255) UNIQUE,
                lab_id VARCHAR(255) NOT NULL UNIQUE,
                create_at TIMESTAMP NOT NULL,
                update_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS senders;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
