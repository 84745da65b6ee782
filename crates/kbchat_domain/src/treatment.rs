use std::str::FromStr;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};

use crate::Error;

/// System prompt of the minimal preset.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an helpful assistant.";

/// Named behaviour of the assistant within the study.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// No history, no tools, built-in prompt.
    Plain,
    /// History, no tools.
    Vanilla,
    /// History and the lookup tool.
    #[default]
    Rag,
    /// Lookup tool without history.
    RagCot,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Plain => "plain",
            Preset::Vanilla => "vanilla",
            Preset::Rag => "rag",
            Preset::RagCot => "rag-cot",
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "plain" => Ok(Preset::Plain),
            "vanilla" => Ok(Preset::Vanilla),
            "rag" => Ok(Preset::Rag),
            "rag-cot" => Ok(Preset::RagCot),
            other => Err(Error::UnknownTreatment(other.to_string())),
        }
    }
}

/// Knobs that distinguish one assistant variant from another.
#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(into)]
pub struct Treatment {
    pub name: String,
    pub use_history: bool,
    pub tool_enabled: bool,
    pub system_prompt: String,
}

impl Treatment {
    pub fn from_preset(preset: Preset, system_prompt: impl Into<String>) -> Self {
        let (use_history, tool_enabled) = match preset {
            Preset::Plain => (false, false),
            Preset::Vanilla => (true, false),
            Preset::Rag => (true, true),
            Preset::RagCot => (false, true),
        };
        Self {
            name: preset.as_str().to_string(),
            use_history,
            tool_enabled,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn plain() -> Self {
        Self::from_preset(Preset::Plain, DEFAULT_SYSTEM_PROMPT)
    }
}
