use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use serde::Serialize;
use tracing::{debug, warn};

/// Metadata kept for one CLI session id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub path: PathBuf,
    pub created_at: SystemTime,
    pub last_used: SystemTime,
    pub model: String,
}

impl SessionRecord {
    /// Time since the record was last used. A clock that went backwards counts
    /// as zero.
    pub fn idle_for(&self, now: SystemTime) -> Duration {
        now.duration_since(self.last_used).unwrap_or_default()
    }
}

/// Sessions observed by one client, plus a pointer to the most recent one.
///
/// Not synchronized; [`crate::ClaudeCode`] keeps it behind a mutex.
#[derive(Clone, Debug, Default)]
pub struct SessionTracker {
    sessions: HashMap<String, SessionRecord>,
    current: Option<String>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes `session_id` and makes it current.
    pub fn record(&mut self, session_id: &str, path: &Path, model: &str) -> &SessionRecord {
        let now = SystemTime::now();
        let record = self
            .sessions
            .entry(session_id.to_string())
            .and_modify(|record| {
                record.last_used = now;
                record.path = path.to_path_buf();
                record.model = model.to_string();
            })
            .or_insert_with(|| {
                debug!(session_id, "tracking new session");
                SessionRecord {
                    session_id: session_id.to_string(),
                    path: path.to_path_buf(),
                    created_at: now,
                    last_used: now,
                    model: model.to_string(),
                }
            });
        self.current = Some(session_id.to_string());
        record
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current
            .as_deref()
            .and_then(|id| self.sessions.get(id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.get(session_id)
    }

    /// All records, oldest first.
    pub fn list(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self.sessions.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        records
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops records idle for longer than `max_age` and returns their ids.
    pub fn expire(&mut self, max_age: Duration) -> Vec<String> {
        self.expire_at(SystemTime::now(), max_age)
    }

    pub(crate) fn expire_at(&mut self, now: SystemTime, max_age: Duration) -> Vec<String> {
        let mut removed: Vec<String> = self
            .sessions
            .values()
            .filter(|record| record.idle_for(now) > max_age)
            .map(|record| record.session_id.clone())
            .collect();
        removed.sort();

        for id in &removed {
            self.sessions.remove(id);
            warn!(session_id = %id, ?max_age, "expired idle session");
        }
        if matches!(self.current.as_deref(), Some(id) if removed.iter().any(|r| r == id)) {
            self.current = None;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.current = None;
    }

    #[cfg(test)]
    pub(crate) fn set_last_used(&mut self, session_id: &str, when: SystemTime) {
        if let Some(record) = self.sessions.get_mut(session_id) {
            record.last_used = when;
        }
    }
}
