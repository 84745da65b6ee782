use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use futures::StreamExt;
use kbchat_domain::{
    BoxStream, ChatCompletionMessage, ChatResponse, Context, LookupOutcome, ModelId,
    ResultStream, SessionHistory, SessionId, Treatment, TurnOutcome,
};

use crate::orch::Orchestrator;
use crate::services::{CompletionService, EntityLookupService, Services, SessionStore};

/// Scripted stand-in for every service the orchestrator talks to.
pub struct Runner {
    // Each request consumes one scripted round; every message is one stream event
    completions: Mutex<VecDeque<Vec<ChatCompletionMessage>>>,
    requests: Mutex<Vec<Context>>,
    lookup_outcome: Mutex<LookupOutcome>,
    lookups: Mutex<Vec<(String, usize)>>,
    sessions: Mutex<HashMap<SessionId, SessionHistory>>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            completions: Default::default(),
            requests: Default::default(),
            lookup_outcome: Mutex::new(LookupOutcome::NoResult),
            lookups: Default::default(),
            sessions: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl CompletionService for Runner {
    async fn chat(
        &self,
        _model: &ModelId,
        context: Context,
    ) -> ResultStream<ChatCompletionMessage, anyhow::Error> {
        self.requests.lock().unwrap().push(context);
        let round = self
            .completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("No mock completion left"))?;
        let stream: BoxStream<ChatCompletionMessage, anyhow::Error> =
            Box::pin(tokio_stream::iter(round.into_iter().map(Ok)));
        Ok(stream)
    }
}

#[async_trait::async_trait]
impl EntityLookupService for Runner {
    async fn lookup(&self, query: &str, max_results: usize) -> LookupOutcome {
        self.lookups
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        self.lookup_outcome.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SessionStore for Runner {
    async fn get_history(&self, id: &SessionId) -> anyhow::Result<SessionHistory> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_history(&self, id: &SessionId, history: SessionHistory) -> anyhow::Result<()> {
        self.sessions.lock().unwrap().insert(*id, history);
        Ok(())
    }
}

impl Services for Runner {
    type CompletionService = Runner;
    type EntityLookupService = Runner;
    type SessionStore = Runner;

    fn completion_service(&self) -> &Self::CompletionService {
        self
    }

    fn lookup_service(&self) -> &Self::EntityLookupService {
        self
    }

    fn session_store(&self) -> &Self::SessionStore {
        self
    }
}

pub struct TestContext {
    pub session: SessionId,
    pub runner: Arc<Runner>,
    orch: Orchestrator<Runner>,
}

impl TestContext {
    pub fn new(treatment: Treatment) -> Self {
        let runner = Arc::new(Runner::default());
        let orch = Orchestrator::new(runner.clone(), treatment, ModelId::new("test-model"));
        Self { session: SessionId::generate(), runner, orch }
    }

    pub fn mock_completions(self, rounds: Vec<Vec<ChatCompletionMessage>>) -> Self {
        self.runner.completions.lock().unwrap().extend(rounds);
        self
    }

    pub fn mock_lookup(self, outcome: LookupOutcome) -> Self {
        *self.runner.lookup_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator<Runner> {
        &self.orch
    }

    /// Runs one turn and collects every event it produced.
    pub async fn run(&self, user_text: &str) -> anyhow::Result<Vec<ChatResponse>> {
        self.orch
            .chat(self.session, user_text)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect()
    }

    pub fn requests(&self) -> Vec<Context> {
        self.runner.requests.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<(String, usize)> {
        self.runner.lookups.lock().unwrap().clone()
    }

    pub fn stored_history(&self) -> Option<SessionHistory> {
        self.runner.sessions.lock().unwrap().get(&self.session).cloned()
    }
}

pub fn streamed_text(events: &[ChatResponse]) -> String {
    events.iter().filter_map(ChatResponse::as_text).collect()
}

pub fn outcome(events: &[ChatResponse]) -> TurnOutcome {
    events
        .iter()
        .find_map(|event| match event {
            ChatResponse::Complete(outcome) => Some(outcome.clone()),
            _ => None,
        })
        .expect("turn should complete")
}
