use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{ToolCallFull, ToolCallId, ToolDefinition, ToolName};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One role-tagged message of a conversation. Turns are never mutated after
/// they have been appended to a history.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Setters)]
#[setters(strip_option, into)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallFull>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<ToolName>,
}

impl Turn {
    fn new(role: Role, content: impl ToString) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl ToString) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl ToString) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl ToString) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn that records a tool invocation issued by the model.
    pub fn assistant_tool_call(content: impl ToString, call: ToolCallFull) -> Self {
        Self::new(Role::Assistant, content).tool_calls(vec![call])
    }

    /// Result of a tool invocation, correlated with the call by its id.
    pub fn tool_result(call: &ToolCallFull, content: impl ToString) -> Self {
        Self::new(Role::Tool, content)
            .tool_call_id(call.call_id.clone())
            .name(call.name.clone())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    None,
    Auto,
    Required,
}

/// Everything the completion endpoint needs for one request, except the
/// model id.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Setters)]
#[setters(strip_option, into)]
pub struct Context {
    pub messages: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

impl Context {
    /// Starts a context whose first message is the system prompt.
    pub fn new(system_prompt: impl ToString) -> Self {
        Self { messages: vec![Turn::system(system_prompt)], ..Default::default() }
    }

    pub fn add_turn(mut self, turn: Turn) -> Self {
        self.messages.push(turn);
        self
    }

    pub fn extend_turns<'a>(mut self, turns: impl IntoIterator<Item = &'a Turn>) -> Self {
        self.messages.extend(turns.into_iter().cloned());
        self
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|turn| turn.has_role(Role::System))
            .map(|turn| turn.content.as_str())
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }
}
