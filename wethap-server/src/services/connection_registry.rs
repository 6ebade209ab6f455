use std::collections::{BTreeSet, HashMap};
use std::fmt;

use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard, RwLock, mpsc};
use uuid::Uuid;
use wethap_api::message::CLOSE_SUPERSEDED;
use wethap_api::{HandshakeAck, ServerPush};

use crate::errors::RegistryError;

/// Opaque handle for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Ack(HandshakeAck),
    Push(ServerPush),
    Close(u16),
}

pub type ConnectionHandle = mpsc::UnboundedSender<Outbound>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub device_key: String,
    pub room_label: String,
    pub attached_at: OffsetDateTime,
}

struct Session {
    handle: ConnectionHandle,
    identity: Option<SessionIdentity>,
}

/// Every live sender connection, keyed by session token.
///
/// Each operation takes the lock once and never awaits while holding it, so
/// handshake completion, relabeling and removal are observed atomically by
/// `active_rooms` and `broadcast`.
///
/// `lock_identities` serializes the longer sequences that bind a device to a
/// label across storage and the registry: handshake attachment and renames.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<SessionToken, Session>>,
    identities: Mutex<()>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held while a stored binding is read, changed and published here.
    pub async fn lock_identities(&self) -> MutexGuard<'_, ()> {
        self.identities.lock().await
    }

    pub async fn register(&self, handle: ConnectionHandle) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.write().await.insert(
            token,
            Session {
                handle,
                identity: None,
            },
        );

        tracing::debug!(%token, "session registered");
        token
    }

    /// Attaches a resolved identity. An older session of the same device is
    /// evicted as a reconnect and asked to close.
    pub async fn complete_handshake(
        &self,
        token: SessionToken,
        device_key: &str,
        room_label: &str,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(&token) {
            None => return Err(RegistryError::UnknownSession(token)),
            Some(session) if session.identity.is_some() => {
                return Err(RegistryError::HandshakeRepeated(token));
            }
            Some(_) => {}
        }

        let label_taken = sessions.iter().any(|(other, session)| {
            *other != token
                && session.identity.as_ref().is_some_and(|identity| {
                    identity.room_label == room_label && identity.device_key != device_key
                })
        });
        if label_taken {
            return Err(RegistryError::LabelInUse(room_label.to_string()));
        }

        let superseded: Vec<SessionToken> = sessions
            .iter()
            .filter(|(other, session)| {
                **other != token
                    && session
                        .identity
                        .as_ref()
                        .is_some_and(|identity| identity.device_key == device_key)
            })
            .map(|(other, _)| *other)
            .collect();

        for old in superseded {
            if let Some(session) = sessions.remove(&old) {
                let _ = session.handle.send(Outbound::Close(CLOSE_SUPERSEDED));
                tracing::info!(token = %old, device_key, "session superseded by reconnect");
            }
        }

        if let Some(session) = sessions.get_mut(&token) {
            session.identity = Some(SessionIdentity {
                device_key: device_key.to_string(),
                room_label: room_label.to_string(),
                attached_at: OffsetDateTime::now_utc(),
            });
        }

        tracing::info!(%token, device_key, room_label, "handshake completed");
        Ok(())
    }

    /// Returns whether the session was still present.
    pub async fn unregister(&self, token: SessionToken) -> bool {
        let removed = self.sessions.write().await.remove(&token);

        if let Some(session) = &removed {
            let room_label = session.identity.as_ref().map(|identity| identity.room_label.as_str());
            tracing::info!(%token, room_label, "session unregistered");
        }

        removed.is_some()
    }

    pub async fn active_rooms(&self) -> BTreeSet<String> {
        self.sessions
            .read()
            .await
            .values()
            .filter_map(|session| session.identity.as_ref())
            .map(|identity| identity.room_label.clone())
            .collect()
    }

    pub async fn find_session_by_room(&self, room_label: &str) -> Option<SessionToken> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|(_, session)| {
                session
                    .identity
                    .as_ref()
                    .is_some_and(|identity| identity.room_label == room_label)
            })
            .map(|(token, _)| *token)
    }

    /// Whether a handshake-completed session currently speaks for `device_key`.
    pub async fn is_device_attached(&self, device_key: &str) -> bool {
        self.sessions.read().await.values().any(|session| {
            session
                .identity
                .as_ref()
                .is_some_and(|identity| identity.device_key == device_key)
        })
    }

    pub async fn identity(&self, token: SessionToken) -> Option<SessionIdentity> {
        self.sessions
            .read()
            .await
            .get(&token)
            .and_then(|session| session.identity.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Best-effort delivery to every handshake-completed session except
    /// `exclude`. Sessions whose channel is gone are dropped from the registry.
    pub async fn broadcast(&self, event: &ServerPush, exclude: Option<SessionToken>) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut delivered = 0;
        let mut failed = Vec::new();

        for (token, session) in sessions.iter() {
            if Some(*token) == exclude || session.identity.is_none() {
                continue;
            }

            match session.handle.send(Outbound::Push(event.clone())) {
                Ok(()) => delivered += 1,
                Err(_) => failed.push(*token),
            }
        }

        for token in failed {
            sessions.remove(&token);
            tracing::warn!(%token, "delivery failed, session dropped");
        }

        delivered
    }

    /// Pushes `event` to the session holding `room_label`. Returns whether it was delivered.
    pub async fn send_to_room(&self, room_label: &str, event: &ServerPush) -> bool {
        let mut sessions = self.sessions.write().await;

        let Some(token) = sessions
            .iter()
            .find(|(_, session)| {
                session
                    .identity
                    .as_ref()
                    .is_some_and(|identity| identity.room_label == room_label)
            })
            .map(|(token, _)| *token)
        else {
            return false;
        };

        let delivered = sessions
            .get(&token)
            .is_some_and(|session| session.handle.send(Outbound::Push(event.clone())).is_ok());

        if !delivered {
            sessions.remove(&token);
            tracing::warn!(%token, room_label, "delivery failed, session dropped");
        }

        delivered
    }

    /// Tells the session holding `old` about its new label and rewrites the
    /// label in the same step. Returns the session that was relabeled.
    pub async fn relabel(&self, old: &str, new: &str) -> Option<SessionToken> {
        let mut sessions = self.sessions.write().await;

        let token = sessions
            .iter()
            .find(|(_, session)| {
                session
                    .identity
                    .as_ref()
                    .is_some_and(|identity| identity.room_label == old)
            })
            .map(|(token, _)| *token)?;

        let session = sessions.get_mut(&token)?;
        let push = ServerPush::ChangeLabId {
            new_lab_id: new.to_string(),
        };

        if session.handle.send(Outbound::Push(push)).is_err() {
            sessions.remove(&token);
            tracing::warn!(%token, old, "delivery failed, session dropped");
            return None;
        }

        if let Some(identity) = session.identity.as_mut() {
            identity.room_label = new.to_string();
        }

        tracing::info!(%token, old, new, "session relabeled");
        Some(token)
    }

}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;

    fn channel() -> (ConnectionHandle, UnboundedReceiver<Outbound>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_handshake_makes_room_active() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();

        let token = registry.register(tx).await;
        assert!(registry.active_rooms().await.is_empty());
        assert_eq!(registry.find_session_by_room("Lab1").await, None);
        assert!(!registry.is_device_attached("dev-1").await);

        registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap();

        assert_eq!(registry.active_rooms().await, BTreeSet::from(["Lab1".to_string()]));
        assert_eq!(registry.find_session_by_room("Lab1").await, Some(token));
        assert!(registry.is_device_attached("dev-1").await);
    }

    #[tokio::test]
    async fn test_handshake_rejected_twice() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let token = registry.register(tx).await;

        registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap();
        let err = registry.complete_handshake(token, "dev-1", "Lab2").await.unwrap_err();

        assert_eq!(err, RegistryError::HandshakeRepeated(token));
        assert_eq!(registry.active_rooms().await, BTreeSet::from(["Lab1".to_string()]));
    }

    #[tokio::test]
    async fn test_handshake_unknown_token() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let token = registry.register(tx).await;
        registry.unregister(token).await;

        let err = registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap_err();
        assert_eq!(err, RegistryError::UnknownSession(token));
    }

    #[tokio::test]
    async fn test_label_held_by_other_device() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = channel();
        let (tx_b, _rx_b) = channel();
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;

        registry.complete_handshake(a, "dev-a", "Lab1").await.unwrap();
        let err = registry.complete_handshake(b, "dev-b", "Lab1").await.unwrap_err();

        assert_eq!(err, RegistryError::LabelInUse("Lab1".to_string()));
        assert_eq!(registry.find_session_by_room("Lab1").await, Some(a));
        assert_eq!(registry.identity(b).await, None);
    }

    #[tokio::test]
    async fn test_reconnect_evicts_older_session() {
        let registry = ConnectionRegistry::new();
        let (tx_old, mut rx_old) = channel();
        let (tx_new, _rx_new) = channel();
        let old = registry.register(tx_old).await;
        let new = registry.register(tx_new).await;

        registry.complete_handshake(old, "dev-1", "Lab1").await.unwrap();
        registry.complete_handshake(new, "dev-1", "Lab1").await.unwrap();

        assert_eq!(rx_old.recv().await, Some(Outbound::Close(CLOSE_SUPERSEDED)));
        assert_eq!(registry.find_session_by_room("Lab1").await, Some(new));
        assert_eq!(registry.len().await, 1);
        assert!(!registry.unregister(old).await);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = channel();
        let token = registry.register(tx).await;
        registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap();

        assert!(registry.unregister(token).await);
        assert!(!registry.unregister(token).await);
        assert!(registry.active_rooms().await.is_empty());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_pending_and_excluded() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        let (tx_pending, mut rx_pending) = channel();
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;
        registry.register(tx_pending).await;
        registry.complete_handshake(a, "dev-a", "Lab1").await.unwrap();
        registry.complete_handshake(b, "dev-b", "Lab2").await.unwrap();

        let delivered = registry.broadcast(&ServerPush::KeepAlive, Some(b)).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx_a.try_recv().unwrap(), Outbound::Push(ServerPush::KeepAlive));
        assert!(rx_b.try_recv().is_err());
        assert!(rx_pending.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_drops_dead_session() {
        let registry = ConnectionRegistry::new();
        let (tx_live, mut rx_live) = channel();
        let (tx_dead, rx_dead) = channel();
        let live = registry.register(tx_live).await;
        let dead = registry.register(tx_dead).await;
        registry.complete_handshake(live, "dev-a", "Lab1").await.unwrap();
        registry.complete_handshake(dead, "dev-b", "Lab2").await.unwrap();
        drop(rx_dead);

        let push = ServerPush::RequestInfo { num_gen: Some(3) };
        let delivered = registry.broadcast(&push, None).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx_live.try_recv().unwrap(), Outbound::Push(push));
        assert_eq!(registry.active_rooms().await, BTreeSet::from(["Lab1".to_string()]));
    }

    #[tokio::test]
    async fn test_send_to_room() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        let token = registry.register(tx).await;
        registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap();

        let push = ServerPush::RequestInfo { num_gen: None };
        assert!(registry.send_to_room("Lab1", &push).await);
        assert!(!registry.send_to_room("Lab9", &push).await);
        assert_eq!(rx.try_recv().unwrap(), Outbound::Push(push));
    }

    #[tokio::test]
    async fn test_relabel_pushes_and_rewrites() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = channel();
        let token = registry.register(tx).await;
        registry.complete_handshake(token, "dev-1", "Lab1").await.unwrap();

        assert_eq!(registry.relabel("Lab1", "Lab7").await, Some(token));
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Push(ServerPush::ChangeLabId {
                new_lab_id: "Lab7".to_string()
            })
        );
        assert_eq!(registry.active_rooms().await, BTreeSet::from(["Lab7".to_string()]));
        assert_eq!(registry.relabel("Lab1", "Lab8").await, None);
    }
}
