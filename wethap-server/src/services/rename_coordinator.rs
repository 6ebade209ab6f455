use std::sync::Arc;

use wethap_api::label;
use wethap_api::models::RenameSenderRequest;

use crate::configs::Storage;
use crate::errors::RenameError;
use crate::models::Sender;
use crate::repositories::{SenderRepository, is_unique_violation};
use crate::services::connection_registry::ConnectionRegistry;

/// Selects the sender a rename applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameTarget {
    Id(i64),
    Identifier(String),
    Label(String),
}

impl RenameTarget {
    /// Exactly one selector must be present.
    pub fn from_selectors(
        id: Option<i64>,
        identifier: Option<&str>,
        before: Option<&str>,
    ) -> Result<Self, RenameError> {
        match (id, identifier, before) {
            (Some(id), None, None) => Ok(RenameTarget::Id(id)),
            (None, Some(identifier), None) => Ok(RenameTarget::Identifier(identifier.to_string())),
            (None, None, Some(before)) => Ok(RenameTarget::Label(before.to_string())),
            _ => Err(RenameError::AmbiguousTarget),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub id: i64,
    pub before: String,
    pub after: String,
    /// A live session was told about the new label.
    pub notified: bool,
}

pub struct RenameCoordinator {
    storage: Arc<Storage>,
    senders: Arc<SenderRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl RenameCoordinator {
    pub fn new(
        storage: Arc<Storage>,
        senders: Arc<SenderRepository>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            storage,
            senders,
            registry,
        }
    }

    pub async fn rename_request(
        &self,
        request: &RenameSenderRequest,
    ) -> Result<RenameOutcome, RenameError> {
        let target = RenameTarget::from_selectors(
            request.id,
            request.identifier.as_deref(),
            request.before.as_deref(),
        )?;

        self.rename(&target, &request.after).await
    }

    pub async fn rename(
        &self,
        target: &RenameTarget,
        after: &str,
    ) -> Result<RenameOutcome, RenameError> {
        let after = label::normalize(after).ok_or(RenameError::InvalidLabel)?;

        // Held through the relabel: a handshake sees the old binding or the new one
        let _guard = self.registry.lock_identities().await;

        let sender = self.find_target(target).await?;
        let holder = self.senders.find_by_lab_id(after).await?;

        if let Some(holder) = holder {
            if sender.as_ref().map(|s| s.id) != Some(holder.id) {
                return Err(RenameError::LabelCollision(after.to_string()));
            }
        }

        let sender = sender.ok_or(RenameError::UnknownDevice)?;

        if sender.lab_id == after {
            return Ok(RenameOutcome {
                id: sender.id,
                before: sender.lab_id,
                after: after.to_string(),
                notified: false,
            });
        }

        let mut tx = self.storage.get_pool().begin().await?;
        self.senders
            .update_lab_id(sender.id, after, &mut tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "senders", "lab_id") {
                    RenameError::LabelCollision(after.to_string())
                } else {
                    RenameError::Storage(e)
                }
            })?;
        tx.commit().await?;

        let notified = self.registry.relabel(&sender.lab_id, after).await.is_some();

        tracing::info!(id = sender.id, before = %sender.lab_id, after, notified, "sender renamed");

        Ok(RenameOutcome {
            id: sender.id,
            before: sender.lab_id,
            after: after.to_string(),
            notified,
        })
    }

    async fn find_target(&self, target: &RenameTarget) -> Result<Option<Sender>, sqlx::Error> {
        match target {
            RenameTarget::Id(id) => self.senders.find_by_id(*id).await,
            RenameTarget::Identifier(identifier) => self.senders.find_by_identifier(identifier).await,
            RenameTarget::Label(label) => self.senders.find_by_lab_id(label).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_selector() {
        assert_eq!(
            RenameTarget::from_selectors(Some(1), None, None).unwrap(),
            RenameTarget::Id(1)
        );
        assert_eq!(
            RenameTarget::from_selectors(None, None, Some("T4")).unwrap(),
            RenameTarget::Label("T4".to_string())
        );
        assert!(matches!(
            RenameTarget::from_selectors(None, None, None),
            Err(RenameError::AmbiguousTarget)
        ));
        assert!(matches!(
            RenameTarget::from_selectors(Some(1), Some("pico-1"), None),
            Err(RenameError::AmbiguousTarget)
        ));
    }
}
