use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use tailor_core::{AppError, Provider, ResumeRecord, TailoredResume};

use crate::config::DEFAULT_MAX_SESSIONS;

/// One tailoring result kept for editing and export.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub provider: Provider,
    pub record: ResumeRecord,
    /// Set when the provider response was unusable and the record is a placeholder.
    pub fallback_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory session table. Nothing survives a restart.
///
/// Holds at most `max_sessions` entries; creating one more evicts the least
/// recently updated session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Stores a fresh result under a new id.
    pub fn create(&self, provider: Provider, result: TailoredResume) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            provider,
            fallback_reason: result.fallback_reason().map(str::to_string),
            record: result.record,
            created_at: now,
            updated_at: now,
        };

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.updated_at)
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::debug!(session_id = %oldest, "Evicted least recently updated session");
        }
        sessions.insert(session.id, session.clone());
        session
    }

    /// Puts a new tailoring result into session `id`, keeping its id and
    /// creation time. Falls back to [`create`](Self::create) when the session
    /// is gone, e.g. evicted while the pipeline ran.
    pub fn replace(&self, id: Uuid, provider: Provider, result: TailoredResume) -> Session {
        {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = sessions.get_mut(&id) {
                session.provider = provider;
                session.fallback_reason = result.fallback_reason().map(str::to_string);
                session.record = result.record;
                session.updated_at = Utc::now();
                return session.clone();
            }
        }
        self.create(provider, result)
    }

    /// Drops a session. Returns whether it existed.
    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Applies `edit` to the stored record. Returns `Ok(None)` for an unknown
    /// id; the record is left untouched when `edit` fails.
    pub fn update<F>(&self, id: Uuid, edit: F) -> Result<Option<Session>, AppError>
    where
        F: FnOnce(&mut ResumeRecord) -> Result<(), AppError>,
    {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let Some(session) = sessions.get_mut(&id) else {
            return Ok(None);
        };

        let mut record = session.record.clone();
        edit(&mut record)?;
        session.record = record;
        session.updated_at = Utc::now();
        Ok(Some(session.clone()))
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
