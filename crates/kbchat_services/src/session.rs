use std::collections::HashMap;

use kbchat_app::SessionStore;
use kbchat_domain::{SessionHistory, SessionId};
use tokio::sync::RwLock;

/// Process-local session store; histories live as long as the process.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHistory>>,
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_history(&self, id: &SessionId) -> anyhow::Result<SessionHistory> {
        Ok(self.sessions.read().await.get(id).cloned().unwrap_or_default())
    }

    async fn set_history(&self, id: &SessionId, history: SessionHistory) -> anyhow::Result<()> {
        self.sessions.write().await.insert(*id, history);
        Ok(())
    }
}
