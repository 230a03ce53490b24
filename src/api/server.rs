use crate::api::session::{run_session, GreetingHook, SessionContext};
use crate::api::{ConnectionRegistry, DialogueHandler, OutboundMessage, SessionError, SessionInfo};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// WebSocket front door: one task per accepted connection.
pub struct SessionServer {
    listener: TcpListener,
    context: SessionContext,
}

impl SessionServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        npc_id: impl Into<String>,
        handler: Arc<dyn DialogueHandler>,
    ) -> Result<Self, SessionError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            context: SessionContext {
                npc_id: npc_id.into(),
                registry: Arc::new(ConnectionRegistry::new()),
                handler,
                greeting: None,
            },
        })
    }

    /// Sends `greeting` to every session as soon as it opens.
    pub fn with_greeting(self, greeting: OutboundMessage) -> Self {
        self.with_greeting_hook(Arc::new(move |_: &SessionInfo| Some(greeting.clone())))
    }

    pub fn with_greeting_hook(mut self, hook: GreetingHook) -> Self {
        self.context.greeting = Some(hook);
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SessionError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.context.registry.clone()
    }

    pub async fn run(self) -> Result<(), SessionError> {
        self.run_until(CancellationToken::new()).await
    }

    /// Accepts until `shutdown` fires, then waits for open sessions to close.
    pub async fn run_until(self, shutdown: CancellationToken) -> Result<(), SessionError> {
        let addr = self.local_addr()?;
        tracing::info!(addr = %addr, npc_id = %self.context.npc_id, "Session server listening on ws://{}", addr);

        let mut sessions = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        sessions.spawn(handle_connection(stream, peer, self.context.clone(), shutdown.clone()));
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept connection"),
                },
            }
        }

        tracing::info!(open_sessions = sessions.len(), "Session server shutting down");
        while sessions.join_next().await.is_some() {}
        Ok(())
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, context: SessionContext, shutdown: CancellationToken) {
    let socket = match tokio_tungstenite::accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    if let Err(e) = run_session(socket, Some(peer), context, shutdown).await {
        tracing::warn!(peer = %peer, error = %e, "Session ended with error");
    }
}
