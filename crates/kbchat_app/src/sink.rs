use anyhow::Context as _;
use futures::StreamExt;
use kbchat_domain::{ChatResponse, LookupArgs, LookupClassification, SessionId, TurnOutcome};

use crate::Orchestrator;
use crate::services::Services;

/// Receives what a front end shows while a turn is processed.
#[async_trait::async_trait]
pub trait ChatSink: Send {
    /// Called once per text fragment, in arrival order.
    async fn stream_token(&mut self, token: &str) -> anyhow::Result<()>;

    async fn tool_call_start(&mut self, _args: &LookupArgs) -> anyhow::Result<()> {
        Ok(())
    }

    async fn tool_call_end(&mut self, _classification: LookupClassification) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once after the last fragment of the turn.
    async fn update(&mut self) -> anyhow::Result<()>;
}

impl<S: Services> Orchestrator<S> {
    /// Drives [`Orchestrator::chat`] to completion, forwarding every event to
    /// `sink`.
    pub async fn handle_turn<K: ChatSink>(
        &self,
        session: SessionId,
        user_text: impl Into<String>,
        sink: &mut K,
    ) -> anyhow::Result<TurnOutcome> {
        let mut stream = self.chat(session, user_text);
        let mut outcome = None;

        while let Some(event) = stream.next().await {
            match event? {
                ChatResponse::Text(text) => sink.stream_token(&text).await?,
                ChatResponse::ToolCallStart(args) => sink.tool_call_start(&args).await?,
                ChatResponse::ToolCallEnd(classification) => {
                    sink.tool_call_end(classification).await?
                }
                ChatResponse::Complete(done) => outcome = Some(done),
            }
        }
        sink.update().await?;

        outcome.context("Turn ended before completing")
    }
}
