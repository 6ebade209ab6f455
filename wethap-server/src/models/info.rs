use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// A reading taken in answer to a scheduled "request info" push.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Info {
    pub id: i64,
    pub lab_id: String,
    pub date: String,
    pub time: Option<String>,
    pub num_gen: Option<i64>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub weather: String,
    #[serde(with = "time::serde::rfc3339")]
    pub create_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub update_at: OffsetDateTime,
}

/// Column values for a reading that has not been stored yet. Also used for manual readings.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInfo {
    pub lab_id: String,
    pub date: String,
    pub time: Option<String>,
    pub num_gen: Option<i64>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub weather: String,
}

#[derive(Clone)]
pub struct InfoTable;

impl Table for InfoTable {
    fn name(&self) -> &'static str {
        "infos"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS infos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lab_id VARCHAR(255) NOT NULL,
                date VARCHAR(10) NOT NULL,
                time VARCHAR(8),
                num_gen INTEGER,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                pressure REAL NOT NULL,
                weather VARCHAR(255) NOT NULL,
                create_at TIMESTAMP NOT NULL,
                update_at TIMESTAMP NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS infos_schedule_slot
                ON infos (lab_id, date, num_gen) WHERE num_gen IS NOT NULL;
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS infos;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
