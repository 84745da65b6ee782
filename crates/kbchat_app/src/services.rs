use kbchat_domain::{
    ChatCompletionMessage, Context, LookupOutcome, ModelId, ResultStream, SessionHistory,
    SessionId,
};

/// Streaming access to the hosted completion endpoint.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync + 'static {
    async fn chat(
        &self,
        model: &ModelId,
        context: Context,
    ) -> ResultStream<ChatCompletionMessage, anyhow::Error>;
}

/// Knowledge-base lookup backing the single tool exposed to the model.
/// Implementations report failures through [`LookupOutcome::Failed`] instead
/// of returning errors.
#[async_trait::async_trait]
pub trait EntityLookupService: Send + Sync + 'static {
    async fn lookup(&self, query: &str, max_results: usize) -> LookupOutcome;
}

/// Session-scoped storage for conversation history.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the stored history, or an empty one for unknown sessions.
    async fn get_history(&self, id: &SessionId) -> anyhow::Result<SessionHistory>;

    async fn set_history(&self, id: &SessionId, history: SessionHistory) -> anyhow::Result<()>;
}

pub trait Services: Send + Sync + 'static {
    type CompletionService: CompletionService;
    type EntityLookupService: EntityLookupService;
    type SessionStore: SessionStore;

    fn completion_service(&self) -> &Self::CompletionService;
    fn lookup_service(&self) -> &Self::EntityLookupService;
    fn session_store(&self) -> &Self::SessionStore;
}
