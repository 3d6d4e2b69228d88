use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::processor::ConversationSession;

pub type SharedSession = Arc<Mutex<ConversationSession>>;

/// Live conversations keyed by call id.
///
/// The map lock is only held to look sessions up; each session has its own
/// async mutex so one call's provider round trip never blocks another call.
#[derive(Default)]
pub struct ConversationHub {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl ConversationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversation, replacing any previous one for the same call.
    pub fn open(&self, session: ConversationSession) -> SharedSession {
        let call_sid = session.call_sid().to_string();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().insert(call_sid, Arc::clone(&shared));
        shared
    }

    pub fn get(&self, call_sid: &str) -> Option<SharedSession> {
        self.sessions.read().get(call_sid).cloned()
    }

    pub fn close(&self, call_sid: &str) -> bool {
        self.sessions.write().remove(call_sid).is_some()
    }

    pub fn call_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}
