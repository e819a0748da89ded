//! Connection handling logic for WebSocket clients.
//!
//! This module contains the core connection handling logic that manages the
//! lifecycle of individual client connections: WebSocket handshaking, the
//! session gate, room routing, lifecycle hooks, message processing, and
//! cleanup.

use crate::{
    auth::{self, GateError},
    connection::SessionManager,
    error::ServerError,
    lifecycle,
    messaging::route_client_event,
    rooms::Room,
    store::FleetStore,
};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::handshake::server::{ErrorResponse, Request, Response},
    tungstenite::protocol::frame::coding::CloseCode,
    tungstenite::protocol::CloseFrame,
    tungstenite::Message,
};
use tracing::{debug, error, trace, warn};

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Perform WebSocket handshake, capturing the `token` query parameter
/// 2. Run the session gate; on rejection, surface the reason and close
///    before any session state exists
/// 3. Register the session, attach the identity, join the role room
/// 4. Fire the admission lifecycle hook (presence -> working for agents)
/// 5. Run incoming and outgoing tasks until the connection ends
/// 6. Remove the session (revoking room membership) and fire the
///    disconnect hook exactly once, whatever ended the connection
///
/// # Ordering
///
/// The incoming task processes this connection's frames strictly in arrival
/// order. There is no ordering guarantee across different connections.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session_manager: Arc<SessionManager>,
    store: Arc<dyn FleetStore>,
    max_connections: usize,
) -> Result<(), ServerError> {
    // Perform WebSocket handshake, pulling the credential off the upgrade
    // request. The callback runs before the handshake response is sent.
    let mut token: Option<String> = None;
    let ws_stream = accept_hdr_async(stream, |request: &Request, response: Response| {
        token = auth::token_from_query(request.uri().query());
        Ok::<Response, ErrorResponse>(response)
    })
    .await
    .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;

    let (ws_sender, mut ws_receiver) = ws_stream.split();
    let ws_sender = Arc::new(tokio::sync::Mutex::new(ws_sender));

    if session_manager.session_count().await >= max_connections {
        warn!("🚦 Connection from {} refused: server full", addr);
        reject(&ws_sender, "server full").await;
        return Ok(());
    }

    // Session gate: runs exactly once, before any session state exists.
    // No event handler is reachable on a connection that fails here.
    let identity = match auth::authenticate(store.as_ref(), token.as_deref()).await {
        Ok(identity) => identity,
        Err(e @ GateError::MissingCredential) | Err(e @ GateError::Unauthorized) => {
            warn!("🚫 Connection from {} rejected: {}", addr, e);
            reject(&ws_sender, &e.to_string()).await;
            return Ok(());
        }
    };

    let connection_id = session_manager.add_session(addr).await;
    session_manager
        .register_ws_sender(connection_id, ws_sender.clone())
        .await;
    session_manager
        .set_identity(connection_id, identity.clone())
        .await;

    // Room routing: once per session, never re-evaluated
    if let Some(room) = Room::for_role(&identity.role) {
        session_manager.join_room(connection_id, room).await;
        debug!("🚪 Session {} joined {:?}", connection_id, room);
    }

    lifecycle::on_session_admitted(store.as_ref(), &identity).await;

    let mut message_receiver = session_manager.subscribe();
    let ws_sender_incoming = ws_sender.clone();
    let ws_sender_outgoing = ws_sender.clone();

    // Incoming message task - routes frames to the channels in order
    let incoming_task = {
        let session_manager = session_manager.clone();
        let store = store.clone();

        async move {
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = route_client_event(
                            &text,
                            connection_id,
                            &session_manager,
                            store.as_ref(),
                        )
                        .await
                        {
                            trace!("❌ Frame routing error: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("🔌 Client {} requested close", connection_id);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        let mut ws_sender = ws_sender_incoming.lock().await;
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Err(e) => {
                        error!("WebSocket error for session {}: {}", connection_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    };

    // Outgoing message task
    let outgoing_task = {
        let ws_sender = ws_sender_outgoing;
        async move {
            while let Ok((target_connection_id, message)) = message_receiver.recv().await {
                if target_connection_id == connection_id {
                    let message_text = String::from_utf8_lossy(&message);
                    let mut ws_sender = ws_sender.lock().await;
                    if let Err(e) = ws_sender
                        .send(Message::Text(message_text.to_string().into()))
                        .await
                    {
                        error!("Failed to send message: {}", e);
                        break;
                    }
                }
            }
        }
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    // Cleanup fires exactly once per session regardless of what ended the
    // connection: room membership is revoked with the session, then the
    // disconnect hook flips presence off.
    session_manager.remove_session(connection_id).await;
    session_manager.remove_ws_sender(connection_id).await;
    lifecycle::on_session_closed(store.as_ref(), &identity).await;

    Ok(())
}

/// Surfaces a textual rejection reason, then closes the connection.
async fn reject(
    ws_sender: &Arc<
        tokio::sync::Mutex<
            futures_util::stream::SplitSink<
                tokio_tungstenite::WebSocketStream<TcpStream>,
                Message,
            >,
        >,
    >,
    reason: &str,
) {
    let mut sender = ws_sender.lock().await;
    let _ = sender.send(Message::Text(reason.to_string().into())).await;
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: reason.to_string().into(),
        })))
        .await;
}
