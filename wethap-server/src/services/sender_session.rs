use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use wethap_api::message::{CLOSE_INTERNAL_ERROR, CLOSE_POLICY_VIOLATION};
use wethap_api::{Handshake, JsonProtocol, Protocol, ReadingReport};

use crate::services::connection_registry::{ConnectionHandle, ConnectionRegistry, Outbound, SessionToken};
use crate::services::identity_resolver::IdentityResolver;
use crate::services::reading_service::ReadingService;

/// What the transport hands to a session. A disconnect is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Closed,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer went away before finishing the handshake.
    ClosedDuringHandshake,
    HandshakeTimeout,
    ProtocolViolation,
    StorageFailure,
    /// The peer went away after a completed handshake.
    Closed,
    /// The registry dropped the session after its writer stopped accepting frames.
    Evicted,
}

pub struct SessionContext {
    pub registry: Arc<ConnectionRegistry>,
    pub resolver: Arc<IdentityResolver>,
    pub readings: Arc<ReadingService>,
    pub handshake_timeout: Duration,
}

/// Runs one sender connection from registration to removal.
///
/// The session is always unregistered before this returns.
pub async fn run_sender_session<S>(
    context: &SessionContext,
    inbound: S,
    outbound: ConnectionHandle,
) -> SessionEnd
where
    S: Stream<Item = Inbound> + Unpin + Send,
{
    let token = context.registry.register(outbound.clone()).await;
    let end = drive(context, token, inbound, &outbound).await;
    context.registry.unregister(token).await;

    tracing::info!(%token, ?end, "sender session ended");
    end
}

async fn drive<S>(
    context: &SessionContext,
    token: SessionToken,
    mut inbound: S,
    outbound: &ConnectionHandle,
) -> SessionEnd
where
    S: Stream<Item = Inbound> + Unpin + Send,
{
    let first = match tokio::time::timeout(context.handshake_timeout, inbound.next()).await {
        Ok(Some(Inbound::Text(text))) => text,
        Ok(Some(Inbound::Closed)) | Ok(None) => return SessionEnd::ClosedDuringHandshake,
        Err(_) => {
            tracing::warn!(%token, "no handshake before timeout");
            let _ = outbound.send(Outbound::Close(CLOSE_POLICY_VIOLATION));
            return SessionEnd::HandshakeTimeout;
        }
    };

    let handshake = match JsonProtocol.decode_text::<Handshake>(&first) {
        Ok(handshake) if handshake.is_complete() => handshake,
        Ok(_) => {
            tracing::warn!(%token, "handshake without uuid or labID");
            let _ = outbound.send(Outbound::Close(CLOSE_POLICY_VIOLATION));
            return SessionEnd::ProtocolViolation;
        }
        Err(e) => {
            tracing::warn!(%token, "malformed handshake: {}", e);
            let _ = outbound.send(Outbound::Close(CLOSE_POLICY_VIOLATION));
            return SessionEnd::ProtocolViolation;
        }
    };

    let device_key = handshake.uuid.trim();
    let attached = context
        .resolver
        .attach(
            token,
            outbound,
            device_key,
            handshake.lab_id.trim(),
            handshake.identifier.as_deref(),
        )
        .await;
    if let Err(e) = attached {
        return if e.is_internal() {
            tracing::error!(%token, device_key, status = %e.code(), "identity resolution failed: {}", e);
            let _ = outbound.send(Outbound::Close(CLOSE_INTERNAL_ERROR));
            SessionEnd::StorageFailure
        } else {
            tracing::warn!(%token, device_key, status = %e.code(), "handshake rejected: {}", e);
            let _ = outbound.send(Outbound::Close(CLOSE_POLICY_VIOLATION));
            SessionEnd::ProtocolViolation
        };
    }

    if outbound.is_closed() {
        return SessionEnd::Closed;
    }

    loop {
        let frame = tokio::select! {
            frame = inbound.next() => frame,
            _ = outbound.closed() => return SessionEnd::Evicted,
        };
        let Some(Inbound::Text(text)) = frame else {
            return SessionEnd::Closed;
        };
        if !handle_report(context, token, &text).await {
            return SessionEnd::Evicted;
        }
    }
}

/// Returns `false` once the registry no longer holds this session.
async fn handle_report(context: &SessionContext, token: SessionToken, text: &str) -> bool {
    let report = match JsonProtocol.decode_text::<ReadingReport>(text) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(%token, "ignoring malformed frame: {}", e);
            return true;
        }
    };

    // The label the registry holds wins over whatever the device still believes
    let Some(identity) = context.registry.identity(token).await else {
        tracing::info!(%token, "session dropped by the registry, ending it");
        return false;
    };
    if identity.room_label != report.info.lab_id {
        tracing::debug!(%token, reported = %report.info.lab_id, current = %identity.room_label, "report carries a stale label");
    }

    if let Err(e) = context.readings.record(&identity.room_label, &report.info).await {
        tracing::warn!(%token, lab_id = %identity.room_label, status = %e.code(), "reading dropped: {}", e);
    }

    true
}
