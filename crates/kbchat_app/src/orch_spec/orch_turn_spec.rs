use kbchat_domain::{
    ChatCompletionMessage, ChatResponse, EntityRecord, FinishReason, LookupArgs,
    LookupClassification, LookupOutcome, Preset, Role, ToolCallId, ToolCallPart, ToolChoice,
    ToolName, Treatment, group_properties,
};
use pretty_assertions::assert_eq;

use super::orch_runner::{TestContext, outcome, streamed_text};
use crate::sink::ChatSink;

const SYSTEM_PROMPT: &str = "Answer questions about entities using DBpedia.";

fn treatment(preset: Preset) -> Treatment {
    Treatment::from_preset(preset, SYSTEM_PROMPT)
}

fn text_round(fragments: &[&str]) -> Vec<ChatCompletionMessage> {
    fragments
        .iter()
        .map(|fragment| ChatCompletionMessage::assistant(*fragment))
        .chain(std::iter::once(ChatCompletionMessage::finish(FinishReason::Stop)))
        .collect()
}

fn tool_call_round(index: u32, call_id: &str, argument_parts: &[&str]) -> Vec<ChatCompletionMessage> {
    let mut round: Vec<_> = argument_parts
        .iter()
        .enumerate()
        .map(|(position, part)| {
            let fragment = ToolCallPart::new(index).arguments_part(*part);
            let fragment = if position == 0 {
                fragment
                    .call_id(ToolCallId::new(call_id))
                    .name(ToolName::new("dbpedia_lookup"))
            } else {
                fragment
            };
            ChatCompletionMessage::tool_call(fragment)
        })
        .collect();
    round.push(ChatCompletionMessage::finish(FinishReason::ToolCalls));
    round
}

fn mannheim() -> EntityRecord {
    EntityRecord::new("http://dbpedia.org/resource/Mannheim")
        .label("Mannheim")
        .description("City in Baden-Wuerttemberg, Germany")
        .abstract_text("Mannheim is a city in the southwestern part of Germany.")
        .properties(group_properties(vec![
            (
                "http://dbpedia.org/ontology/country".to_string(),
                "http://dbpedia.org/resource/Germany".to_string(),
            ),
            (
                "http://dbpedia.org/ontology/populationTotal".to_string(),
                "315554".to_string(),
            ),
        ]))
}

#[tokio::test]
async fn test_plain_answer_streams_fragments_in_order() {
    let ctx = TestContext::new(treatment(Preset::Vanilla))
        .mock_completions(vec![text_round(&["Hel", "lo", " world"])]);

    let events = ctx.run("Say hello").await.unwrap();

    let actual: Vec<_> = events.iter().filter_map(ChatResponse::as_text).collect();
    let expected = vec!["Hel", "lo", " world"];
    assert_eq!(actual, expected);
    assert_eq!(outcome(&events).reply, "Hello world");
    assert_eq!(ctx.stored_history().unwrap().len(), 2);
    assert!(ctx.lookups().is_empty());
}

#[tokio::test]
async fn test_system_prompt_leads_every_request_and_is_not_stored() {
    let ctx = TestContext::new(treatment(Preset::Vanilla)).mock_completions(vec![
        text_round(&["First"]),
        text_round(&["Second"]),
    ]);

    ctx.run("one").await.unwrap();
    ctx.run("two").await.unwrap();

    let requests = ctx.requests();
    let actual: Vec<_> = requests[1].messages.iter().map(|turn| turn.role).collect();
    let expected = vec![Role::System, Role::User, Role::Assistant, Role::User];
    assert_eq!(actual, expected);
    assert_eq!(requests[1].system_prompt(), Some(SYSTEM_PROMPT));

    let stored = ctx.stored_history().unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored.count(Role::System), 0);
}

#[tokio::test]
async fn test_first_request_declares_lookup_tool_when_enabled() {
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![text_round(&["Hi"])]);

    ctx.run("Hello").await.unwrap();

    let request = &ctx.requests()[0];
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.tools[0].name.as_str(), "dbpedia_lookup");
    assert_eq!(request.tool_choice, Some(ToolChoice::Auto));
    assert_eq!(request.temperature, Some(0.0));
    assert_eq!(request.max_completion_tokens, Some(525));
}

#[tokio::test]
async fn test_lookup_hit_grounds_follow_up() {
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![
            tool_call_round(0, "call_1", &["{\"query\": \"Mann", "heim\", \"max_results\": 2}"]),
            text_round(&["Mannheim is a German city."]),
        ])
        .mock_lookup(LookupOutcome::Found(vec![mannheim()]));

    let events = ctx.run("Tell me about Mannheim").await.unwrap();

    assert_eq!(ctx.lookups(), vec![("Mannheim".to_string(), 2)]);
    assert_eq!(
        events[0],
        ChatResponse::ToolCallStart(LookupArgs { query: "Mannheim".to_string(), max_results: 2 })
    );
    assert_eq!(events[1], ChatResponse::ToolCallEnd(LookupClassification::Hit));

    let requests = ctx.requests();
    assert_eq!(requests.len(), 2);
    let follow_up = &requests[1];
    assert_eq!(follow_up.tool_choice, Some(ToolChoice::None));
    assert_eq!(follow_up.tools.len(), 1);

    let tool_turn = follow_up.messages.last().unwrap();
    assert_eq!(tool_turn.role, Role::Tool);
    assert_eq!(tool_turn.tool_call_id, Some(ToolCallId::new("call_1")));
    assert!(tool_turn.content.contains("Mannheim is a city in the southwestern part of Germany."));
    assert!(tool_turn.content.contains("populationTotal"));
    assert!(tool_turn.content.contains("dbo:abstract"));

    let assistant_turn = &follow_up.messages[follow_up.messages.len() - 2];
    let actual = assistant_turn.tool_calls.as_ref().unwrap()[0].arguments.clone();
    let expected = serde_json::json!({"query": "Mannheim", "max_results": 2});
    assert_eq!(actual, expected);

    let done = outcome(&events);
    assert_eq!(done.reply, "Mannheim is a German city.");
    assert_eq!(done.history.len(), 2);
    assert_eq!(done.history.count(Role::Tool), 0);
}

#[tokio::test]
async fn test_lookup_miss_removes_tools_from_follow_up() {
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![
            tool_call_round(0, "call_1", &["{\"query\": \"Qwxzrt\"}"]),
            text_round(&["(AI-generated) No idea."]),
        ])
        .mock_lookup(LookupOutcome::NoResult);

    let events = ctx.run("What is Qwxzrt?").await.unwrap();

    assert_eq!(events[1], ChatResponse::ToolCallEnd(LookupClassification::Miss));
    let follow_up = &ctx.requests()[1];
    assert!(follow_up.tools.is_empty());
    assert_eq!(follow_up.tool_choice, None);
    let tool_turn = follow_up.messages.last().unwrap();
    assert!(tool_turn.content.contains("AI-generated"));
    assert!(!tool_turn.content.contains("No DBpedia result."));
}

#[tokio::test]
async fn test_failed_lookup_is_treated_as_miss() {
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![
            tool_call_round(0, "call_1", &["{\"query\": \"Mannheim\"}"]),
            text_round(&["Fallback"]),
        ])
        .mock_lookup(LookupOutcome::Failed("connection refused".to_string()));

    let events = ctx.run("Mannheim?").await.unwrap();

    assert_eq!(events[1], ChatResponse::ToolCallEnd(LookupClassification::Miss));
    assert_eq!(outcome(&events).reply, "Fallback");
}

#[tokio::test]
async fn test_only_first_tool_call_is_dispatched() {
    let first_round = vec![
        ChatCompletionMessage::tool_call(
            ToolCallPart::new(1)
                .call_id(ToolCallId::new("call_b"))
                .name(ToolName::new("dbpedia_lookup"))
                .arguments_part("{\"query\": \"Heidelberg\"}"),
        ),
        ChatCompletionMessage::tool_call(
            ToolCallPart::new(0)
                .call_id(ToolCallId::new("call_a"))
                .name(ToolName::new("dbpedia_lookup"))
                .arguments_part("{\"query\": \"Mannheim\"}"),
        ),
        ChatCompletionMessage::finish(FinishReason::ToolCalls),
    ];
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![first_round, text_round(&["Done"])])
        .mock_lookup(LookupOutcome::Found(vec![mannheim()]));

    ctx.run("Mannheim and Heidelberg").await.unwrap();

    assert_eq!(ctx.lookups(), vec![("Mannheim".to_string(), 3)]);
    assert_eq!(ctx.requests().len(), 2);
}

#[tokio::test]
async fn test_malformed_arguments_fall_back_to_user_text() {
    let ctx = TestContext::new(treatment(Preset::Rag)).mock_completions(vec![
        tool_call_round(0, "call_1", &["{\"query\": \"Mann"]),
        text_round(&["Answer"]),
    ]);

    ctx.run("Tell me about Mannheim").await.unwrap();

    assert_eq!(ctx.lookups(), vec![("Tell me about Mannheim".to_string(), 3)]);
}

#[tokio::test]
async fn test_missing_call_id_gets_synthetic_id() {
    let round = vec![
        ChatCompletionMessage::tool_call(
            ToolCallPart::new(0).arguments_part("{\"query\": \"Mannheim\"}"),
        ),
        ChatCompletionMessage::finish(FinishReason::ToolCalls),
    ];
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![round, text_round(&["Answer"])]);

    ctx.run("Mannheim").await.unwrap();

    let follow_up = &ctx.requests()[1];
    let tool_turn = follow_up.messages.last().unwrap();
    assert_eq!(tool_turn.tool_call_id, Some(ToolCallId::new("tool_0")));
    assert_eq!(tool_turn.name, Some(ToolName::new("dbpedia_lookup")));
}

#[tokio::test]
async fn test_follow_up_tool_call_is_ignored() {
    let mut follow_up = text_round(&["Grounded answer"]);
    follow_up.insert(
        0,
        ChatCompletionMessage::tool_call(
            ToolCallPart::new(0)
                .call_id(ToolCallId::new("call_2"))
                .name(ToolName::new("dbpedia_lookup"))
                .arguments_part("{\"query\": \"Germany\"}"),
        ),
    );
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![
            tool_call_round(0, "call_1", &["{\"query\": \"Mannheim\"}"]),
            follow_up,
        ])
        .mock_lookup(LookupOutcome::Found(vec![mannheim()]));

    let events = ctx.run("Mannheim").await.unwrap();

    assert_eq!(ctx.lookups().len(), 1);
    assert_eq!(ctx.requests().len(), 2);
    assert_eq!(outcome(&events).reply, "Grounded answer");
}

#[tokio::test]
async fn test_text_before_tool_call_is_kept_in_reply() {
    let mut first_round = vec![ChatCompletionMessage::assistant("Let me check. ")];
    first_round.extend(tool_call_round(0, "call_1", &["{\"query\": \"Mannheim\"}"]));
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![first_round, text_round(&["It is a city."])])
        .mock_lookup(LookupOutcome::Found(vec![mannheim()]));

    let events = ctx.run("Mannheim").await.unwrap();

    assert_eq!(streamed_text(&events), "Let me check. It is a city.");
    assert_eq!(outcome(&events).reply, "Let me check. It is a city.");
    let follow_up = &ctx.requests()[1];
    let assistant_turn = &follow_up.messages[follow_up.messages.len() - 2];
    assert_eq!(assistant_turn.content, "Let me check. ");
}

#[tokio::test]
async fn test_tool_calls_ignored_when_tools_disabled() {
    let ctx = TestContext::new(treatment(Preset::Vanilla)).mock_completions(vec![
        tool_call_round(0, "call_1", &["{\"query\": \"Mannheim\"}"]),
    ]);

    let events = ctx.run("Mannheim").await.unwrap();

    assert!(ctx.lookups().is_empty());
    assert_eq!(ctx.requests().len(), 1);
    assert!(ctx.requests()[0].tools.is_empty());
    assert_eq!(outcome(&events).reply, "");
}

#[tokio::test]
async fn test_history_disabled_keeps_turns_independent() {
    let ctx = TestContext::new(treatment(Preset::RagCot)).mock_completions(vec![
        text_round(&["One"]),
        text_round(&["Two"]),
    ]);

    ctx.run("first").await.unwrap();
    ctx.run("second").await.unwrap();

    assert_eq!(ctx.stored_history(), None);
    let actual: Vec<_> = ctx.requests()[1].messages.iter().map(|turn| turn.role).collect();
    assert_eq!(actual, vec![Role::System, Role::User]);
}

#[tokio::test]
async fn test_completion_failure_surfaces_without_storing_history() {
    let ctx = TestContext::new(treatment(Preset::Vanilla));

    let actual = ctx.run("Hello").await;

    assert!(actual.is_err());
    assert_eq!(ctx.stored_history(), None);
}

#[derive(Default)]
struct RecordingSink {
    tokens: Vec<String>,
    lookups: Vec<String>,
    updates: usize,
}

#[async_trait::async_trait]
impl ChatSink for RecordingSink {
    async fn stream_token(&mut self, token: &str) -> anyhow::Result<()> {
        self.tokens.push(token.to_string());
        Ok(())
    }

    async fn tool_call_start(&mut self, args: &LookupArgs) -> anyhow::Result<()> {
        self.lookups.push(args.query.clone());
        Ok(())
    }

    async fn update(&mut self) -> anyhow::Result<()> {
        self.updates += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_handle_turn_forwards_events_to_sink() {
    let ctx = TestContext::new(treatment(Preset::Rag))
        .mock_completions(vec![
            tool_call_round(0, "call_1", &["{\"query\": \"Mannheim\"}"]),
            text_round(&["A ", "city"]),
        ])
        .mock_lookup(LookupOutcome::Found(vec![mannheim()]));
    let mut sink = RecordingSink::default();

    let actual = ctx
        .orchestrator()
        .handle_turn(ctx.session, "Mannheim", &mut sink)
        .await
        .unwrap();

    assert_eq!(actual.reply, "A city");
    assert_eq!(sink.tokens, vec!["A ".to_string(), "city".to_string()]);
    assert_eq!(sink.lookups, vec!["Mannheim".to_string()]);
    assert_eq!(sink.updates, 1);
}
