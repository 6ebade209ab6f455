use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// A reading the device sent on its own initiative, outside the schedule.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ManualInfo {
    pub id: i64,
    pub lab_id: String,
    pub date: String,
    pub time: Option<String>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub weather: String,
    #[serde(with = "time::serde::rfc3339")]
    pub create_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub update_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct ManualInfoTable;

impl Table for ManualInfoTable {
    fn name(&self) -> &'static str {
        "manual_infos"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS manual_infos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                lab_id VARCHAR(255) NOT NULL,
                date VARCHAR(10) NOT NULL,
                time VARCHAR(8),
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                pressure REAL NOT NULL,
                weather VARCHAR(255) NOT NULL,
                create_at TIMESTAMP NOT NULL,
                update_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS manual_infos;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
