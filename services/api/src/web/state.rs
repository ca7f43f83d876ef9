//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-memory session store.

use crate::config::Config;
use chrono::{DateTime, Utc};
use course_assistant_core::{AssistantServices, CourseSession};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub services: Arc<AssistantServices>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Arc<Config>, services: Arc<AssistantServices>) -> Self {
        Self {
            config,
            services,
            sessions: SessionStore::default(),
        }
    }
}

//=========================================================================================
// SessionStore (One Entry per Authoring Session)
//=========================================================================================

/// A live session. The mutex is held for a whole action, so actions on one
/// session run one at a time.
#[derive(Clone)]
pub struct SessionEntry {
    pub created_at: DateTime<Utc>,
    pub session: Arc<Mutex<CourseSession>>,
}

/// Sessions by id. Nothing is persisted; a removed session is gone.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionStore {
    pub async fn create(&self, services: Arc<AssistantServices>) -> (Uuid, SessionEntry) {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            created_at: Utc::now(),
            session: Arc::new(Mutex::new(CourseSession::new(services))),
        };
        self.inner.write().await.insert(id, entry.clone());
        info!("Session {} created", id);
        (id, entry)
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionEntry> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.remove(&id).is_some();
        if removed {
            info!("Session {} ended", id);
        }
        removed
    }
}
