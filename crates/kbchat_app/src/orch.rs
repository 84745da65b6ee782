use std::sync::Arc;

use async_stream::try_stream;
use derive_setters::Setters;
use futures::{Stream, StreamExt};
use kbchat_domain::{
    BoxStream, ChatResponse, Context, LookupArgs, LookupClassification, ModelId, PendingToolCalls,
    SessionHistory, SessionId, ToolCallFull, ToolChoice, Treatment, Turn, TurnOutcome,
};
use tracing::{debug, info, warn};

use crate::prompts::{UNGROUNDED_FALLBACK, grounded_tool_content};
use crate::services::{CompletionService, EntityLookupService, Services, SessionStore};
use crate::tools::{lookup_tool, lookup_tool_name};

pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 525;

/// Runs one conversational turn at a time: streams the first completion,
/// dispatches at most one entity lookup, streams the follow-up completion and
/// records the exchange in the session history.
#[derive(Setters)]
#[setters(into)]
pub struct Orchestrator<S> {
    #[setters(skip)]
    services: Arc<S>,
    treatment: Treatment,
    model: ModelId,
    temperature: f32,
    max_completion_tokens: u32,
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            treatment: self.treatment.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
        }
    }
}

impl<S: Services> Orchestrator<S> {
    pub fn new(services: Arc<S>, treatment: Treatment, model: ModelId) -> Self {
        Self {
            services,
            treatment,
            model,
            temperature: DEFAULT_TEMPERATURE,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }

    pub fn get_treatment(&self) -> &Treatment {
        &self.treatment
    }

    /// Processes `user_text` for `session`. The returned stream is lazy and
    /// yields text fragments as they arrive, lookup progress events and a
    /// final [`ChatResponse::Complete`]. Nothing is persisted unless the
    /// stream is driven to completion.
    pub fn chat(
        &self,
        session: SessionId,
        user_text: impl Into<String>,
    ) -> BoxStream<ChatResponse, anyhow::Error> {
        let orch = self.clone();
        let user_text = user_text.into();

        boxed(try_stream! {
            let mut history = orch.load_history(&session).await?;
            history.push(Turn::user(&user_text));

            let context = orch.first_context(&history);
            debug!(messages = context.messages.len(), tools = context.tools.len(), "Requesting completion");
            let mut response = orch.services.completion_service().chat(&orch.model, context).await?;

            let mut reply = String::new();
            let mut pending = PendingToolCalls::default();
            while let Some(message) = response.next().await {
                let message = message?;
                if let Some(text) = message.text() {
                    reply.push_str(text);
                    yield ChatResponse::Text(text.to_string());
                }
                for part in message.tool_calls {
                    pending.push(part);
                }
                if message.finish_reason.is_some() {
                    break;
                }
            }
            drop(response);

            let dispatch = if orch.treatment.tool_enabled {
                pending.into_first()
            } else {
                if !pending.is_empty() {
                    warn!(count = pending.len(), "Tool calls received while tools are disabled, ignoring");
                }
                None
            };

            if let Some((call, discarded)) = dispatch {
                if discarded > 0 {
                    warn!(discarded, "Multiple tool calls received, only the first one is dispatched");
                }

                let args = LookupArgs::parse(&call.arguments, &user_text);
                info!(query = %args.query, max_results = args.max_results, "Dispatching entity lookup");
                yield ChatResponse::ToolCallStart(args.clone());

                let outcome = orch.services.lookup_service().lookup(&args.query, args.max_results).await;
                let payload = outcome.to_payload();
                let classification = LookupClassification::of_payload(&payload);
                info!(%classification, entities = outcome.records().len(), "Entity lookup finished");
                yield ChatResponse::ToolCallEnd(classification);

                let tool_call = ToolCallFull::new(call.name.clone().unwrap_or_else(lookup_tool_name))
                    .call_id(call.call_id_or_default())
                    .arguments(args.to_value());
                let context = orch.follow_up_context(&history, &reply, tool_call, classification, &payload);
                debug!(messages = context.messages.len(), tools = context.tools.len(), "Requesting follow-up completion");
                let mut response = orch.services.completion_service().chat(&orch.model, context).await?;

                while let Some(message) = response.next().await {
                    let message = message?;
                    if let Some(text) = message.text() {
                        reply.push_str(text);
                        yield ChatResponse::Text(text.to_string());
                    }
                    if !message.tool_calls.is_empty() {
                        warn!(count = message.tool_calls.len(), "Ignoring tool call in follow-up completion");
                    }
                    if message.finish_reason.is_some() {
                        break;
                    }
                }
            }

            history.push(Turn::assistant(&reply));
            if orch.treatment.use_history {
                orch.services.session_store().set_history(&session, history.clone()).await?;
            }
            info!(session = %session, reply_len = reply.len(), turns = history.len(), "Turn completed");

            yield ChatResponse::Complete(TurnOutcome { reply, history });
        })
    }

    async fn load_history(&self, session: &SessionId) -> anyhow::Result<SessionHistory> {
        if self.treatment.use_history {
            self.services.session_store().get_history(session).await
        } else {
            Ok(SessionHistory::default())
        }
    }

    fn base_context(&self, history: &SessionHistory) -> Context {
        Context::new(&self.treatment.system_prompt)
            .extend_turns(history.iter())
            .temperature(self.temperature)
            .max_completion_tokens(self.max_completion_tokens)
    }

    fn first_context(&self, history: &SessionHistory) -> Context {
        let context = self.base_context(history);
        if self.treatment.tool_enabled {
            context.tools(vec![lookup_tool()]).tool_choice(ToolChoice::Auto)
        } else {
            context
        }
    }

    fn follow_up_context(
        &self,
        history: &SessionHistory,
        pre_tool_text: &str,
        tool_call: ToolCallFull,
        classification: LookupClassification,
        payload: &str,
    ) -> Context {
        let content = match classification {
            LookupClassification::Hit => grounded_tool_content(payload),
            LookupClassification::Miss => UNGROUNDED_FALLBACK.to_string(),
        };
        let tool_result = Turn::tool_result(&tool_call, content);
        let context = self
            .base_context(history)
            .add_turn(Turn::assistant_tool_call(pre_tool_text, tool_call))
            .add_turn(tool_result);

        // Declared for context only; the model may not call it again.
        match classification {
            LookupClassification::Hit => {
                context.tools(vec![lookup_tool()]).tool_choice(ToolChoice::None)
            }
            LookupClassification::Miss => context,
        }
    }
}

fn boxed<T>(stream: T) -> BoxStream<ChatResponse, anyhow::Error>
where
    T: Stream<Item = anyhow::Result<ChatResponse>> + Send + 'static,
{
    Box::pin(stream)
}
