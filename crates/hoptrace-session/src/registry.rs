use crate::session::Session;
use hoptrace_model::SourceInfo;
use hoptrace_trace::TraceLauncher;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Sessions owned by the host application, one per open view.
pub struct SessionRegistry {
    launcher: Arc<dyn TraceLauncher>,
    source: SourceInfo,
    next_id: u64,
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new(launcher: Arc<dyn TraceLauncher>, source: SourceInfo) -> Self {
        Self {
            launcher,
            source,
            next_id: 1,
            sessions: HashMap::new(),
        }
    }

    pub fn create(&mut self) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let session = Session::new(Arc::clone(&self.launcher), self.source.clone());
        self.sessions.insert(id, session);
        debug!(%id, "session created");
        id
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Kills the session's process and forgets it.
    pub fn dispose(&mut self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some(mut session) => {
                session.dispose();
                debug!(%id, "session disposed");
                true
            }
            None => false,
        }
    }

    pub fn dispose_all(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        for id in ids {
            self.dispose(id);
        }
    }

    /// Drains pending process events for every session.
    pub fn pump_all(&mut self) -> usize {
        self.sessions.values_mut().map(Session::pump).sum()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Drop for SessionRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
