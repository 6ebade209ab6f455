use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{Info, NewInfo};

pub struct InfoRepository {
    storage: Arc<Storage>,
}

impl InfoRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl InfoRepository {
    pub async fn create(
        &self,
        item: &NewInfo,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO infos (lab_id, date, time, num_gen, temperature, humidity, pressure, weather, create_at, update_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&item.lab_id)
        .bind(&item.date)
        .bind(&item.time)
        .bind(item.num_gen)
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

    pub async fn find_one(
        &self,
        lab_id: &str,
        date: &str,
        num_gen: i64,
    ) -> Result<Option<Info>, Error> {
        let info: Option<Info> = sqlx::query_as(
            "SELECT * FROM infos WHERE lab_id = $1 AND date = $2 AND num_gen = $3",
        )
        .bind(lab_id)
        .bind(date)
        .bind(num_gen)
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(info)
    }

    pub async fn find_all(&self) -> Result<Vec<Info>, Error> {
        let infos: Vec<Info> = sqlx::query_as("SELECT * FROM infos ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(infos)
    }

    pub async fn find_lab_ids(&self) -> Result<Vec<String>, Error> {
        let lab_ids: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT lab_id FROM infos ORDER BY lab_id")
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(lab_ids)
    }

    pub async fn exists_for_lab_id(&self, lab_id: &str) -> Result<bool, Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM infos WHERE lab_id = $1)")
                .bind(lab_id)
                .fetch_one(self.storage.get_pool())
                .await?;

        Ok(exists)
    }
}
