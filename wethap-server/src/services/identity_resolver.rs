use std::sync::Arc;

use wethap_api::{HandshakeAck, label};

use crate::configs::Storage;
use crate::errors::ResolveError;
use crate::repositories::{SenderRepository, is_unique_violation};
use crate::services::connection_registry::{ConnectionHandle, ConnectionRegistry, Outbound, SessionToken};

const MAX_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// The device key was already stored.
    Known,
    /// The device key was new but its identifier matched a stored record.
    Rebound,
    /// The requested label was free and is now owned by this device.
    Claimed,
    /// The requested label was taken, a placeholder was issued instead.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub sender_id: i64,
    pub lab_id: String,
    pub kind: ResolutionKind,
}

/// Maps a device key and the label it asks for to the label it will use.
pub struct IdentityResolver {
    storage: Arc<Storage>,
    senders: Arc<SenderRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl IdentityResolver {
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

    /// Resolves the device, completes the handshake of `token` and queues the
    /// acknowledgement under one identity lock. A rename can only land before
    /// all three or after the ack is queued.
    pub async fn attach(
        &self,
        token: SessionToken,
        outbound: &ConnectionHandle,
        device_key: &str,
        candidate: &str,
        identifier: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let _guard = self.registry.lock_identities().await;

        let resolution = self.resolve_locked(device_key, candidate, identifier).await?;
        self.registry
            .complete_handshake(token, device_key, &resolution.lab_id)
            .await?;

        let ack = HandshakeAck {
            lab_id: resolution.lab_id.clone(),
        };
        if outbound.send(Outbound::Ack(ack)).is_err() {
            tracing::debug!(%token, "writer gone before the handshake ack");
        }

        Ok(resolution)
    }

    pub async fn resolve(
        &self,
        device_key: &str,
        candidate: &str,
        identifier: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let _guard = self.registry.lock_identities().await;
        self.resolve_locked(device_key, candidate, identifier).await
    }

    async fn resolve_locked(
        &self,
        device_key: &str,
        candidate: &str,
        identifier: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let identifier = identifier.and_then(label::normalize);
        let mut next_placeholder: Option<i64> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(sender) = self.senders.find_by_uuid(device_key).await? {
                if label::is_placeholder(&sender.lab_id) {
                    tracing::debug!(device_key, lab_id = %sender.lab_id, "known device still on a placeholder label");
                }
                return Ok(Resolution {
                    sender_id: sender.id,
                    lab_id: sender.lab_id,
                    kind: ResolutionKind::Known,
                });
            }

            if let Some(identifier) = identifier {
                if let Some(sender) = self.senders.find_by_identifier(identifier).await? {
                    if self.registry.is_device_attached(&sender.uuid).await {
                        tracing::warn!(device_key, identifier, holder = %sender.uuid, "identifier claimed while its device is connected");
                        return Err(ResolveError::IdentifierInUse(identifier.to_string()));
                    }

                    let mut tx = self.storage.get_pool().begin().await?;
                    self.senders.update_uuid(sender.id, device_key, &mut tx).await?;
                    tx.commit().await?;

                    tracing::info!(device_key, identifier, lab_id = %sender.lab_id, "device key rebound by identifier");
                    return Ok(Resolution {
                        sender_id: sender.id,
                        lab_id: sender.lab_id,
                        kind: ResolutionKind::Rebound,
                    });
                }
            }

            let (lab_id, kind) = match next_placeholder {
                None if self.senders.find_by_lab_id(candidate).await?.is_none() => {
                    (candidate.to_string(), ResolutionKind::Claimed)
                }
                _ => {
                    let mut sequence = match next_placeholder {
                        Some(sequence) => sequence,
                        None => self.senders.max_id().await? + 1,
                    };
                    while self.senders.find_by_lab_id(&label::placeholder(sequence)).await?.is_some() {
                        sequence += 1;
                    }
                    next_placeholder = Some(sequence);
                    (label::placeholder(sequence), ResolutionKind::Placeholder)
                }
            };

            match self.insert(device_key, identifier, &lab_id).await {
                Ok(sender_id) => {
                    tracing::info!(device_key, candidate, lab_id, ?kind, "device registered");
                    return Ok(Resolution {
                        sender_id,
                        lab_id,
                        kind,
                    });
                }
                Err(e) if is_unique_violation(&e, "senders", "uuid") => {
                    tracing::debug!(device_key, attempt, "device key stored concurrently, re-reading");
                }
                Err(e) if is_unique_violation(&e, "senders", "identifier") => {
                    tracing::debug!(device_key, attempt, "identifier stored concurrently, re-reading");
                }
                Err(e) if is_unique_violation(&e, "senders", "lab_id") => {
                    tracing::debug!(device_key, lab_id, attempt, "room label claimed concurrently");
                    next_placeholder = match next_placeholder {
                        Some(sequence) => Some(sequence + 1),
                        None => Some(self.senders.max_id().await? + 1),
                    };
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ResolveError::Exhausted(MAX_ATTEMPTS))
    }

    async fn insert(
        &self,
        device_key: &str,
        identifier: Option<&str>,
        lab_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.storage.get_pool().begin().await?;
        let id = self.senders.create(device_key, identifier, lab_id, &mut tx).await?;
        tx.commit().await?;

        Ok(id)
    }
}
