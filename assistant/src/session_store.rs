use crate::gemini_service::ChatThread;
use crate::session::ChatSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionHandle = Arc<Mutex<ChatSession>>;

#[derive(Debug)]
struct Entry {
    session: SessionHandle,
    last_access: Instant,
}

/// In-memory sessions keyed by browser session id. Idle sessions expire.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    context_limit: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(context_limit: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            context_limit,
            ttl,
        }
    }

    /// Unknown or expired ids get a fresh session under a new id.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_access) < self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            log::info!("Dropped {} idle sessions", expired);
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_access = now;
                return (id, entry.session.clone());
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(
            ChatThread::default(),
            self.context_limit,
        )));
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_access: now,
            },
        );
        log::debug!("Created session {}", id);
        (id, session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
