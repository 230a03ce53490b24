use crate::api::SessionState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub npc_id: String,
    pub peer_addr: Option<SocketAddr>,
    pub connected_at: DateTime<Utc>,
    pub state: SessionState,
}

impl SessionInfo {
    pub fn new(npc_id: impl Into<String>, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            npc_id: npc_id.into(),
            peer_addr,
            connected_at: Utc::now(),
            state: SessionState::Connecting,
        }
    }
}

/// Live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionInfo>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, info: SessionInfo) {
        let session_id = info.session_id;
        self.sessions.write().await.insert(session_id, info);
        tracing::debug!(session_id = %session_id, "Session registered");
    }

    pub async fn set_state(&self, session_id: Uuid, state: SessionState) {
        if let Some(info) = self.sessions.write().await.get_mut(&session_id) {
            info.state = state;
        }
    }

    pub async fn unregister(&self, session_id: Uuid) -> Option<SessionInfo> {
        let removed = self.sessions.write().await.remove(&session_id);
        if removed.is_some() {
            tracing::debug!(session_id = %session_id, "Session unregistered");
        }
        removed
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionInfo> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionRegistry, SessionInfo};
    use crate::api::SessionState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_update_unregister() {
        let registry = ConnectionRegistry::new();
        let info = SessionInfo::new("merchant", None);
        let id = info.session_id;

        registry.register(info).await;
        registry.set_state(id, SessionState::Open).await;
        assert_eq!(registry.get(id).await.unwrap().state, SessionState::Open);

        assert!(registry.unregister(id).await.is_some());
        assert!(registry.unregister(id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_registration() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let info = SessionInfo::new("merchant", None);
                let id = info.session_id;
                registry.register(info).await;
                id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        assert_eq!(registry.len().await, 32);

        for id in ids.into_iter().step_by(2) {
            registry.unregister(id).await;
        }
        assert_eq!(registry.len().await, 16);
    }
}
