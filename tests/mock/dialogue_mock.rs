use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use npc_intent_engine::api::{ConnectionRegistry, DialogueHandler, OutboundMessage, SessionServer};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

/// Answers every line with `echo: <content>` and remembers what it saw.
#[derive(Default)]
pub struct EchoHandler {
    seen: Mutex<Vec<(String, String)>>,
}

impl EchoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueHandler for EchoHandler {
    async fn handle_dialogue(&self, speaker: &str, content: &str) -> OutboundMessage {
        self.seen.lock().unwrap().push((speaker.to_string(), content.to_string()));
        OutboundMessage::dialogue("A", format!("echo: {}", content))
    }
}

/// Sleeps before answering; `completed` flips only if the sleep finishes.
pub struct SlowHandler {
    pub delay: Duration,
    pub started: Arc<AtomicBool>,
    pub completed: Arc<AtomicBool>,
}

impl SlowHandler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl DialogueHandler for SlowHandler {
    async fn handle_dialogue(&self, _speaker: &str, content: &str) -> OutboundMessage {
        self.started.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.completed.store(true, Ordering::SeqCst);
        OutboundMessage::dialogue("A", content)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(handler: Arc<dyn DialogueHandler>, greeting: Option<OutboundMessage>) -> Self {
        let mut server = SessionServer::bind("127.0.0.1:0", "merchant", handler).await.unwrap();
        if let Some(greeting) = greeting {
            server = server.with_greeting(greeting);
        }

        let addr = server.local_addr().unwrap();
        let registry = server.registry();
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            server.run_until(token).await.unwrap();
        });

        Self {
            addr,
            registry,
            shutdown,
            task,
        }
    }

    pub async fn connect(&self) -> TestClient {
        let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{}", self.addr))
            .await
            .unwrap();
        TestClient { socket }
    }

    /// Polls until the registry holds `count` sessions.
    pub async fn wait_for_sessions(&self, count: usize) {
        for _ in 0..100 {
            if self.registry.len().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} sessions, found {}", count, self.registry.len().await);
    }
}

pub struct TestClient {
    pub socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn send_text(&mut self, text: &str) {
        self.socket.send(Message::Text(text.to_string())).await.unwrap();
    }

    pub async fn send_json(&mut self, value: Value) {
        self.send_text(&value.to_string()).await;
    }

    /// Next JSON text frame, or `None` if nothing arrives within `wait`.
    pub async fn recv_json_within(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let frame = tokio::time::timeout(wait, self.socket.next()).await.ok()??;
            match frame.ok()? {
                Message::Text(text) => return Some(serde_json::from_str(&text).unwrap()),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    pub async fn recv_json(&mut self) -> Value {
        self.recv_json_within(Duration::from_secs(5))
            .await
            .expect("expected a message from the server")
    }

    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}
