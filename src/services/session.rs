use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, INSIGHT_FAILURE_MESSAGE};
use crate::models::{Dataset, InsightResult};
use crate::services::render::Dashboard;

/// Insight lifecycle of the session's current upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum InsightStatus {
    Idle,
    Disabled,
    Pending,
    Ready(InsightResult),
    Failed { message: String },
}

impl InsightStatus {
    /// Rate-limit and payment failures keep their own wording; anything
    /// else shows the generic retry message.
    pub fn failed(err: &AppError) -> Self {
        let message = match err {
            AppError::RateLimited | AppError::PaymentRequired => err.to_string(),
            _ => INSIGHT_FAILURE_MESSAGE.to_string(),
        };
        InsightStatus::Failed { message }
    }
}

/// One successfully ingested file.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub dataset: Dataset,
    pub dashboard: Option<Dashboard>,
}

#[derive(Debug)]
struct SessionState {
    upload: Option<Arc<Upload>>,
    generation: u64,
    insights: InsightStatus,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: RwLock<SessionState>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            state: RwLock::new(SessionState {
                upload: None,
                generation: 0,
                insights: InsightStatus::Idle,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn upload(&self) -> Option<Arc<Upload>> {
        self.state.read().upload.clone()
    }

    pub fn insights(&self) -> InsightStatus {
        self.state.read().insights.clone()
    }

    /// Installs a new upload and returns its generation token. The previous
    /// upload and any in-flight insight result for it are superseded.
    pub fn replace_upload(&self, upload: Arc<Upload>, insights: InsightStatus) -> u64 {
        let mut state = self.state.write();
        state.generation += 1;
        state.upload = Some(upload);
        state.insights = insights;
        state.generation
    }

    /// Applies an insight outcome if `token` still names the current upload.
    /// Returns whether the outcome was applied.
    pub fn complete_insights(&self, token: u64, result: Result<InsightResult, AppError>) -> bool {
        let mut state = self.state.write();
        if state.generation != token {
            tracing::debug!(
                "Discarding stale insights for session {} (token {}, current {})",
                self.id,
                token,
                state.generation
            );
            return false;
        }
        state.insights = match result {
            Ok(insights) => InsightStatus::Ready(insights),
            Err(err) => {
                tracing::warn!("Insights failed for session {}: {}", self.id, err);
                InsightStatus::failed(&err)
            }
        };
        true
    }
}

/// In-memory page sessions with idle expiry.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<Uuid, Arc<Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(ttl)
            .build();
        Self { cache }
    }

    pub fn create(&self) -> Arc<Session> {
        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id));
        self.cache.insert(id, session.clone());
        tracing::info!("Created session {}", id);
        session
    }

    pub fn get(&self, id: Uuid) -> Result<Arc<Session>, AppError> {
        self.cache
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }
}
