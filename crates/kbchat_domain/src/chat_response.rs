use crate::{LookupArgs, LookupClassification, SessionHistory};

/// Final state of a completed turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    /// Everything the assistant said during the turn, across both rounds.
    pub reply: String,
    /// History after the turn. Only persisted when the treatment keeps history.
    pub history: SessionHistory,
}

/// Events emitted while a turn is processed, in the order they happen.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatResponse {
    /// A fragment of assistant text, to be shown as soon as it arrives.
    Text(String),
    ToolCallStart(LookupArgs),
    ToolCallEnd(LookupClassification),
    Complete(TurnOutcome),
}

impl ChatResponse {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ChatResponse::Text(text) => Some(text),
            _ => None,
        }
    }
}
