use std::collections::BTreeMap;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ToolName;

/// Unique identifier for a using a tool
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolCallId(String);

impl ToolCallId {
    pub fn new(value: impl ToString) -> Self {
        ToolCallId(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Contains a part message for using a tool. This is received as a part of the
/// response from the model only when streaming is enabled.
///
/// The `index` is the only field present on every fragment of a call; the id
/// and the name usually arrive once, on the first fragment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, Setters)]
#[setters(strip_option, into)]
pub struct ToolCallPart {
    pub index: u32,
    pub call_id: Option<ToolCallId>,
    pub name: Option<ToolName>,
    pub arguments_part: String,
}

impl ToolCallPart {
    pub fn new(index: u32) -> Self {
        Self { index, ..Default::default() }
    }
}

/// Contains the full information about using a tool.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Setters)]
#[setters(into)]
pub struct ToolCallFull {
    pub call_id: ToolCallId,
    pub name: ToolName,
    pub arguments: Value,
}

impl ToolCallFull {
    pub fn new(name: impl Into<ToolName>) -> Self {
        Self {
            call_id: ToolCallId::default(),
            name: name.into(),
            arguments: Value::Object(Default::default()),
        }
    }
}

/// A tool call whose argument text is still being streamed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingToolCall {
    pub index: u32,
    pub call_id: Option<ToolCallId>,
    pub name: Option<ToolName>,
    pub arguments: String,
}

impl PendingToolCall {
    /// Call id reported by the model, or a stable placeholder derived from the
    /// stream index when the model never sent one.
    pub fn call_id_or_default(&self) -> ToolCallId {
        self.call_id
            .clone()
            .unwrap_or_else(|| ToolCallId::new(format!("tool_{}", self.index)))
    }
}

/// Accumulates streamed tool-call fragments, keyed by their stream index.
#[derive(Clone, Debug, Default)]
pub struct PendingToolCalls {
    slots: BTreeMap<u32, PendingToolCall>,
}

impl PendingToolCalls {
    pub fn push(&mut self, part: ToolCallPart) {
        let slot = self
            .slots
            .entry(part.index)
            .or_insert_with(|| PendingToolCall { index: part.index, ..Default::default() });

        if let Some(id) = part.call_id.filter(|id| !id.as_str().is_empty()) {
            slot.call_id = Some(id);
        }
        if let Some(name) = part.name.filter(|name| !name.as_str().is_empty()) {
            slot.name = Some(name);
        }
        slot.arguments.push_str(&part.arguments_part);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Consumes the accumulator and returns the lowest-index call together
    /// with the number of calls that were dropped.
    pub fn into_first(self) -> Option<(PendingToolCall, usize)> {
        let discarded = self.slots.len().saturating_sub(1);
        self.slots
            .into_values()
            .next()
            .map(|call| (call, discarded))
    }
}
