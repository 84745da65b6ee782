use std::str::FromStr;

use kbchat_domain::{
    ChatCompletionMessage, Error, FinishReason, ToolCallId, ToolCallPart, ToolName,
};
use serde::Deserialize;

/// One `data:` chunk of a streaming completion.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Response {
    // Listed first: a success chunk tolerates a missing `choices` field
    Failure {
        error: ErrorResponse,
    },
    Success {
        #[serde(default)]
        choices: Vec<Choice>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: Option<serde_json::Value>,
}

impl From<ToolCallDelta> for ToolCallPart {
    fn from(value: ToolCallDelta) -> Self {
        let function = value.function.unwrap_or_default();
        ToolCallPart {
            index: value.index,
            call_id: value.id.map(ToolCallId::new),
            name: function.name.map(ToolName::new),
            arguments_part: function.arguments.unwrap_or_default(),
        }
    }
}

impl TryFrom<Response> for ChatCompletionMessage {
    type Error = Error;

    fn try_from(value: Response) -> Result<Self, Self::Error> {
        match value {
            Response::Success { choices } => {
                // Only one choice is ever requested
                let Some(choice) = choices.into_iter().next() else {
                    return Ok(ChatCompletionMessage::default());
                };
                let finish_reason = choice
                    .finish_reason
                    .and_then(|reason| FinishReason::from_str(&reason).ok());

                Ok(ChatCompletionMessage {
                    content: choice.delta.content,
                    tool_calls: choice
                        .delta
                        .tool_calls
                        .unwrap_or_default()
                        .into_iter()
                        .map(ToolCallPart::from)
                        .collect(),
                    finish_reason,
                })
            }
            Response::Failure { error } => Err(Error::Upstream {
                code: error.code.map(|code| match code {
                    serde_json::Value::String(code) => code,
                    code => code.to_string(),
                }),
                message: error.message,
            }),
        }
    }
}
