use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{ManualInfo, NewInfo};

pub struct ManualInfoRepository {
    storage: Arc<Storage>,
}

impl ManualInfoRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl ManualInfoRepository {
    /// Stores a manual reading. `item.num_gen` is ignored.
    pub async fn create(
        &self,
        item: &NewInfo,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO manual_infos (lab_id, date, time, temperature, humidity, pressure, weather, create_at, update_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&item.lab_id)
        .bind(&item.date)
        .bind(&item.time)
        .bind(item.temperature)
        .bind(item.humidity)
        .bind(item.pressure)
        .bind(&item.weather)
        .bind(now)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_latest_by_lab_id(
        &self,
        lab_id: &str,
        limit: i64,
    ) -> Result<Vec<ManualInfo>, Error> {
        let infos: Vec<ManualInfo> = sqlx::query_as(
            "SELECT * FROM manual_infos WHERE lab_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(lab_id)
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(infos)
    }
}
