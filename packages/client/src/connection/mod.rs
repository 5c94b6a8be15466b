//! Reconnecting WebSocket connection management.
//!
//! One logical connection is one spawned task owning the socket, its
//! timers, and the state channel. The task walks the lifecycle
//! `Connecting → Authenticating → Ready` and, on any unexpected drop,
//! schedules a bounded exponential-backoff reconnect. The handle talks
//! to the task over a command channel; because the backoff sleep races
//! the command channel inside the same `select!`, a `close` cancels any
//! pending reconnect timer before it can fire — no timer outlives its
//! handle.

pub mod backoff;
mod scope;
mod state;

pub use scope::ConnectionScope;
pub use state::{ConnectionFailure, ConnectionState};

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    credentials::CredentialProvider,
    dispatch::Dispatcher,
    error::ClientError,
    protocol::{ClientEnvelope, codec},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands from the handle to the connection task
enum Command {
    Send(ClientEnvelope),
    Close,
}

/// How one transport session ended
enum SessionEnd {
    /// `close()` was called (or every handle was dropped)
    Manual,
    /// The server closed with a normal close code
    Normal,
    /// Anything else; goes through the retry path
    Retryable(ClientError),
}

/// Entry point for opening realtime connections.
pub struct Connection;

impl Connection {
    /// Start a connection for the given scope.
    ///
    /// Validates the credential pair before any socket work: a missing or
    /// empty token, or a missing identity, fails immediately with
    /// [`ClientError::MissingCredential`] and no transport connection is
    /// attempted. Returns as soon as the connection task is spawned;
    /// callers observe progress through [`ConnectionHandle::state_watch`].
    pub fn open(
        config: &ClientConfig,
        scope: ConnectionScope,
        credentials: &dyn CredentialProvider,
        dispatcher: Dispatcher,
    ) -> Result<ConnectionHandle, ClientError> {
        if !config.realtime_enabled {
            return Err(ClientError::RealtimeDisabled);
        }

        let token = credentials
            .token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ClientError::MissingCredential)?;
        let user = credentials
            .identity()
            .ok_or(ClientError::MissingCredential)?;

        let ctx = SessionContext {
            scope,
            url: scope.endpoint_url(&config.ws_base_url, &token),
            token,
            user_id: user.id,
            dispatcher,
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_base_interval: config.reconnect_base_interval,
            handshake_timeout: config.handshake_timeout,
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        tokio::spawn(run_connection(ctx, command_rx, state_tx));

        Ok(ConnectionHandle {
            id: Uuid::new_v4(),
            scope,
            command_tx,
            state_rx,
        })
    }
}

/// Handle to one logical connection.
///
/// Dropping every clone of the handle shuts the connection down the same
/// way `close` does.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    scope: ConnectionScope,
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionHandle {
    /// Identity of this handle, for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The stream this connection serves
    pub fn scope(&self) -> ConnectionScope {
        self.scope
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A watch receiver for observing state transitions
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Attempt to send an envelope.
    ///
    /// Writes only in the `Ready` state; in every other state the message
    /// is dropped with a warning and `false` is returned. The caller
    /// decides whether to queue or discard.
    pub fn try_send(&self, envelope: ClientEnvelope) -> bool {
        let state = self.state();
        if !state.can_send() {
            tracing::warn!(
                "Dropping outbound message for stream '{}': connection is {}",
                self.scope,
                state
            );
            return false;
        }
        if self.command_tx.send(Command::Send(envelope)).is_err() {
            tracing::warn!(
                "Dropping outbound message for stream '{}': connection task ended",
                self.scope
            );
            return false;
        }
        true
    }

    /// Request shutdown.
    ///
    /// Idempotent and safe to call from any state, including mid-handshake
    /// and after the connection already ended. This is the only path that
    /// does not trigger a reconnect: a pending backoff timer is cancelled
    /// before it can fire.
    pub fn close(&self) {
        let _ = self.command_tx.send(Command::Close);
    }
}

/// Everything the connection task needs, owned for its whole life
struct SessionContext {
    scope: ConnectionScope,
    url: String,
    token: String,
    user_id: i64,
    dispatcher: Dispatcher,
    max_reconnect_attempts: u32,
    reconnect_base_interval: Duration,
    handshake_timeout: Duration,
}

async fn run_connection(
    ctx: SessionContext,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
) {
    let mut failed_attempts: u32 = 0;

    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        tracing::info!(
            "Connecting realtime stream '{}' (attempt {}/{})",
            ctx.scope,
            failed_attempts + 1,
            ctx.max_reconnect_attempts
        );

        let connected = tokio::select! {
            result = tokio::time::timeout(ctx.handshake_timeout, connect_async(ctx.url.as_str())) => {
                match result {
                    Ok(Ok((stream, _response))) => Ok(stream),
                    Ok(Err(e)) => Err(ClientError::Transport(e.to_string())),
                    Err(_elapsed) => Err(ClientError::HandshakeTimeout),
                }
            }
            _ = wait_for_close(&mut command_rx) => {
                let _ = state_tx.send(ConnectionState::Closing);
                let _ = state_tx.send(ConnectionState::Closed);
                tracing::info!("Realtime stream '{}' closed while connecting", ctx.scope);
                return;
            }
        };

        let end = match connected {
            Ok(stream) => {
                run_session(&ctx, stream, &mut command_rx, &state_tx, &mut failed_attempts).await
            }
            Err(error) => SessionEnd::Retryable(error),
        };

        match end {
            SessionEnd::Manual => {
                let _ = state_tx.send(ConnectionState::Closed);
                tracing::info!("Realtime stream '{}' closed", ctx.scope);
                return;
            }
            SessionEnd::Normal => {
                let _ = state_tx.send(ConnectionState::Closed);
                tracing::info!("Server ended realtime stream '{}' normally", ctx.scope);
                return;
            }
            SessionEnd::Retryable(error) => {
                tracing::warn!("Realtime stream '{}' lost: {}", ctx.scope, error);
                failed_attempts += 1;

                if !backoff::should_reconnect(failed_attempts, ctx.max_reconnect_attempts) {
                    tracing::error!(
                        "Giving up on realtime stream '{}' after {} attempts",
                        ctx.scope,
                        failed_attempts
                    );
                    let _ =
                        state_tx.send(ConnectionState::Failed(ConnectionFailure::MaxRetriesExceeded));
                    return;
                }

                // Reconnect pending counts as connecting for observers
                let _ = state_tx.send(ConnectionState::Connecting);
                let delay = backoff::reconnect_delay(failed_attempts, ctx.reconnect_base_interval);
                tracing::info!(
                    "Reconnecting realtime stream '{}' in {:?} (attempt {}/{})",
                    ctx.scope,
                    delay,
                    failed_attempts + 1,
                    ctx.max_reconnect_attempts
                );

                // The sleep races the command channel: close() lands here
                // and cancels the pending reconnect before it fires
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = wait_for_close(&mut command_rx) => {
                        let _ = state_tx.send(ConnectionState::Closed);
                        tracing::info!(
                            "Realtime stream '{}' closed while waiting to reconnect",
                            ctx.scope
                        );
                        return;
                    }
                }
            }
        }
    }
}

/// Drive one transport session from handshake to its end.
async fn run_session(
    ctx: &SessionContext,
    stream: WsStream,
    command_rx: &mut mpsc::UnboundedReceiver<Command>,
    state_tx: &watch::Sender<ConnectionState>,
    failed_attempts: &mut u32,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();

    let _ = state_tx.send(ConnectionState::Authenticating);
    let auth = codec::encode(&ClientEnvelope::Auth {
        token: ctx.token.clone(),
    });
    if let Err(e) = write.send(Message::Text(auth.into())).await {
        return SessionEnd::Retryable(ClientError::Transport(e.to_string()));
    }
    tracing::debug!("Sent auth handshake for user {}", ctx.user_id);

    let mut authenticated = false;

    loop {
        tokio::select! {
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match codec::decode(&text) {
                            Ok(envelope) => {
                                if !authenticated {
                                    // auth_success, or any first decodable
                                    // frame from a server that skips the ack
                                    authenticated = true;
                                    *failed_attempts = 0;
                                    let _ = state_tx.send(ConnectionState::Ready);
                                    tracing::info!("Realtime stream '{}' ready", ctx.scope);
                                }
                                ctx.dispatcher.dispatch(envelope);
                            }
                            Err(e) => {
                                tracing::warn!("Dropping undecodable frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!("Ignoring {} bytes of binary data", data.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let close_code = frame.as_ref().map(|f| u16::from(f.code));
                        if backoff::is_normal_closure(close_code) {
                            return SessionEnd::Normal;
                        }
                        let rendered = close_code
                            .map_or_else(|| "none".to_string(), |c| c.to_string());
                        return SessionEnd::Retryable(ClientError::Transport(format!(
                            "abnormal close (code {})",
                            rendered
                        )));
                    }
                    Some(Ok(_)) => {
                        // Ping/pong frames are answered by the transport
                    }
                    Some(Err(e)) => {
                        return SessionEnd::Retryable(ClientError::Transport(e.to_string()));
                    }
                    None => {
                        return SessionEnd::Retryable(ClientError::Transport(
                            "stream ended without close frame".to_string(),
                        ));
                    }
                }
            }
            command = command_rx.recv() => {
                match command {
                    Some(Command::Send(envelope)) => {
                        let json = codec::encode(&envelope);
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            tracing::warn!("Failed to send message: {}", e);
                            return SessionEnd::Retryable(ClientError::Transport(e.to_string()));
                        }
                    }
                    Some(Command::Close) | None => {
                        let _ = state_tx.send(ConnectionState::Closing);
                        let _ = write.send(Message::Close(None)).await;
                        return SessionEnd::Manual;
                    }
                }
            }
        }
    }
}

/// Wait until a close is requested, discarding stray send commands.
async fn wait_for_close(command_rx: &mut mpsc::UnboundedReceiver<Command>) {
    loop {
        match command_rx.recv().await {
            Some(Command::Close) | None => return,
            Some(Command::Send(_)) => {
                tracing::warn!("Dropping outbound message, connection not ready");
            }
        }
    }
}
