use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::ToolCallPart;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    FunctionCall,
}

/// One decoded delta of a streaming completion.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Setters)]
#[setters(strip_option, into)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallPart>,
    pub finish_reason: Option<FinishReason>,
}

impl ChatCompletionMessage {
    pub fn assistant(content: impl ToString) -> Self {
        Self { content: Some(content.to_string()), ..Default::default() }
    }

    pub fn tool_call(part: ToolCallPart) -> Self {
        Self { tool_calls: vec![part], ..Default::default() }
    }

    pub fn finish(reason: FinishReason) -> Self {
        Self { finish_reason: Some(reason), ..Default::default() }
    }

    pub fn add_tool_call(mut self, part: ToolCallPart) -> Self {
        self.tool_calls.push(part);
        self
    }

    /// Text carried by this delta, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|text| !text.is_empty())
    }
}
