use derive_setters::Setters;
use kbchat_domain::{Context, ModelId, Role, ToolCallFull, ToolChoice, ToolDefinition, Turn};
use serde::Serialize;

/// Body of an OpenAI compatible `chat/completions` request.
#[derive(Debug, Clone, Serialize, Setters)]
#[setters(strip_option)]
pub struct Request {
    pub model: Option<ModelId>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
}

impl Request {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for ResponseFormat {
    fn default() -> Self {
        Self { kind: "text".to_string() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FunctionType,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON encoded arguments, as the API expects a string here
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: FunctionType,
    pub function: FunctionDescription,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDescription {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionType {
    #[default]
    Function,
}

impl From<ToolDefinition> for Tool {
    fn from(value: ToolDefinition) -> Self {
        Tool {
            kind: FunctionType::Function,
            function: FunctionDescription {
                name: value.name.to_string(),
                description: value.description,
                parameters: value.input_schema,
            },
        }
    }
}

impl From<ToolCallFull> for ToolCall {
    fn from(value: ToolCallFull) -> Self {
        ToolCall {
            id: value.call_id.as_str().to_string(),
            kind: FunctionType::Function,
            function: FunctionCall {
                name: value.name.to_string(),
                arguments: value.arguments.to_string(),
            },
        }
    }
}

impl From<Turn> for Message {
    fn from(value: Turn) -> Self {
        Message {
            role: value.role,
            content: value.content,
            tool_calls: value
                .tool_calls
                .map(|calls| calls.into_iter().map(ToolCall::from).collect()),
            tool_call_id: value.tool_call_id.map(|id| id.as_str().to_string()),
        }
    }
}

impl From<Context> for Request {
    fn from(context: Context) -> Self {
        Request {
            model: None,
            messages: context.messages.into_iter().map(Message::from).collect(),
            temperature: context.temperature,
            max_completion_tokens: context.max_completion_tokens,
            response_format: ResponseFormat::default(),
            tools: context.tools.into_iter().map(Tool::from).collect(),
            tool_choice: context.tool_choice,
            stream: false,
        }
    }
}
