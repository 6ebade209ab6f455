use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::Sender;

pub struct SenderRepository {
    storage: Arc<Storage>,
}

impl SenderRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl SenderRepository {
    pub async fn create(
        &self,
        uuid: &str,
        identifier: Option<&str>,
        lab_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query(
            r#"
            INSERT INTO senders (uuid, identifier, lab_id, create_at, update_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(uuid)
        .bind(identifier)
        .bind(lab_id)
        .bind(now)
        .bind(now)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_all(&self) -> Result<Vec<Sender>, Error> {
        let senders: Vec<Sender> = sqlx::query_as("SELECT * FROM senders ORDER BY id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(senders)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Sender>, Error> {
        let sender: Option<Sender> = sqlx::query_as("SELECT * FROM senders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(sender)
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<Option<Sender>, Error> {
        let sender: Option<Sender> = sqlx::query_as("SELECT * FROM senders WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(sender)
    }

    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Sender>, Error> {
        let sender: Option<Sender> =
            sqlx::query_as("SELECT * FROM senders WHERE identifier = $1")
                .bind(identifier)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(sender)
    }

    pub async fn find_by_lab_id(&self, lab_id: &str) -> Result<Option<Sender>, Error> {
        let sender: Option<Sender> = sqlx::query_as("SELECT * FROM senders WHERE lab_id = $1")
            .bind(lab_id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(sender)
    }

    pub async fn find_lab_ids(&self) -> Result<Vec<String>, Error> {
        let lab_ids: Vec<String> = sqlx::query_scalar("SELECT lab_id FROM senders ORDER BY lab_id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(lab_ids)
    }

    /// Highest id ever stored, or 0 for an empty table.
    pub async fn max_id(&self) -> Result<i64, Error> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM senders")
            .fetch_one(self.storage.get_pool())
            .await?;

        Ok(max.unwrap_or(0))
    }

    pub async fn update_lab_id(
        &self,
        id: i64,
        lab_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE senders SET lab_id = $1, update_at = $2 WHERE id = $3")
            .bind(lab_id)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    /// Rebinds a stored device to a new device key, used when a known identifier shows up with a fresh key.
    pub async fn update_uuid(
        &self,
        id: i64,
        uuid: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE senders SET uuid = $1, update_at = $2 WHERE id = $3")
            .bind(uuid)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }
}
