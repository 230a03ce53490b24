use crate::api::{ConnectionRegistry, InboundMessage, OutboundMessage, ProtocolError, SessionInfo};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Buffer size for the per-session outbound and inbound channels.
const SESSION_CHANNEL_BUFFER: usize = 64;

/// How long queued replies may take to flush once the session is closing.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, Open) | (Connecting, Closing) | (Open, Closing) | (Closing, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Produces the reply for one dialogue message. Must always answer.
#[async_trait]
pub trait DialogueHandler: Send + Sync {
    async fn handle_dialogue(&self, speaker: &str, content: &str) -> OutboundMessage;
}

/// Called once when a session opens; `None` sends nothing.
pub type GreetingHook = Arc<dyn Fn(&SessionInfo) -> Option<OutboundMessage> + Send + Sync>;

/// Everything a session needs from the server that spawned it.
#[derive(Clone)]
pub struct SessionContext {
    pub npc_id: String,
    pub registry: Arc<ConnectionRegistry>,
    pub handler: Arc<dyn DialogueHandler>,
    pub greeting: Option<GreetingHook>,
}

enum InboundFrame {
    Text(String),
    Binary,
}

struct SessionLifecycle {
    session_id: Uuid,
    state: SessionState,
    registry: Arc<ConnectionRegistry>,
}

impl SessionLifecycle {
    async fn advance(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::debug!(session_id = %self.session_id, from = %self.state, to = %next, "Session state change");
        self.state = next;
        self.registry.set_state(self.session_id, next).await;
        Ok(())
    }
}

/// Drives one client connection from Connecting to Closed.
///
/// Inbound frames are handled strictly in arrival order by a single processor task. Closing
/// the session (disconnect, transport fault or `shutdown`) cancels any in-flight reply.
pub async fn run_session<S>(
    socket: WebSocketStream<S>,
    peer_addr: Option<SocketAddr>,
    context: SessionContext,
    shutdown: CancellationToken,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let info = SessionInfo::new(context.npc_id.clone(), peer_addr);
    let session_id = info.session_id;
    context.registry.register(info.clone()).await;

    let mut lifecycle = SessionLifecycle {
        session_id,
        state: SessionState::Connecting,
        registry: context.registry.clone(),
    };

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<OutboundMessage>(SESSION_CHANNEL_BUFFER);
    let (in_tx, in_rx) = mpsc::channel::<InboundFrame>(SESSION_CHANNEL_BUFFER);
    let cancel = shutdown.child_token();

    let mut writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to serialize outbound message"),
            }
        }
        let _ = ws_sender.close().await;
    });

    lifecycle.advance(SessionState::Open).await?;
    tracing::info!(session_id = %session_id, npc_id = %context.npc_id, peer = ?peer_addr, "Session open");

    if let Some(hook) = &context.greeting {
        if let Some(greeting) = hook(&info) {
            if out_tx.send(greeting).await.is_err() {
                tracing::warn!(session_id = %session_id, "Failed to queue greeting");
            }
        }
    }

    let processor = tokio::spawn(process_inbound(
        session_id,
        in_rx,
        out_tx,
        context.handler.clone(),
        cancel.clone(),
    ));

    let mut fault = None;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(session_id = %session_id, "Session closed by server shutdown");
                break;
            }
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if in_tx.send(InboundFrame::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    if in_tx.send(InboundFrame::Binary).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(session_id = %session_id, "Client disconnected");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Transport fault");
                    fault = Some(e.to_string());
                    break;
                }
            }
        }
    }

    lifecycle.advance(SessionState::Closing).await?;
    cancel.cancel();
    drop(in_tx);
    let _ = processor.await;

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }

    lifecycle.advance(SessionState::Closed).await?;
    context.registry.unregister(session_id).await;
    tracing::info!(session_id = %session_id, "Session closed");

    match fault {
        Some(message) => Err(SessionError::Transport(message)),
        None => Ok(()),
    }
}

async fn process_inbound(
    session_id: Uuid,
    mut inbound: mpsc::Receiver<InboundFrame>,
    outbound: mpsc::Sender<OutboundMessage>,
    handler: Arc<dyn DialogueHandler>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = inbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(session_id = %session_id, "Reply cancelled, session closing");
                break;
            }
            reply = handle_frame(session_id, frame, handler.as_ref()) => reply,
        };

        if let Some(reply) = reply {
            if cancel.is_cancelled() || outbound.send(reply).await.is_err() {
                break;
            }
        }
    }
}

async fn handle_frame(session_id: Uuid, frame: InboundFrame, handler: &dyn DialogueHandler) -> Option<OutboundMessage> {
    let parsed = match frame {
        InboundFrame::Text(text) => InboundMessage::parse(&text),
        InboundFrame::Binary => Err(ProtocolError::BinaryFrame),
    };

    match parsed {
        Ok(InboundMessage::Dialogue { speaker, content, .. }) => {
            tracing::debug!(session_id = %session_id, speaker = %speaker, "Dialogue received");
            Some(handler.handle_dialogue(&speaker, &content).await)
        }
        Ok(InboundMessage::Ignored { kind }) => {
            tracing::warn!(session_id = %session_id, kind = ?kind, "Ignoring message with unknown type");
            None
        }
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "Malformed message");
            Some(OutboundMessage::protocol_error(&e))
        }
    }
}
