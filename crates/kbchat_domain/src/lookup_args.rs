use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Number of entities requested when the model does not say otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Argument schema declared to the model for the lookup tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct LookupToolInput {
    /// Search query string (nouns from user query)
    pub query: String,
    /// Max results to return
    pub max_results: Option<u32>,
}

/// Arguments actually used to run a lookup, after fallbacks are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupArgs {
    pub query: String,
    pub max_results: usize,
}

impl LookupArgs {
    /// Parses the accumulated argument text of a tool call.
    ///
    /// Text that is not a JSON object is treated as an empty object. A missing
    /// or blank `query` falls back to `user_text`, and `max_results` accepts
    /// integers, floats and numeric strings.
    pub fn parse(raw: &str, user_text: &str) -> Self {
        let args = parse_object(raw);

        let query = match args.get("query").and_then(Value::as_str).map(str::trim) {
            Some(query) if !query.is_empty() => query.to_string(),
            _ => {
                debug!(fallback = %user_text, "Tool call without a query, using the user message");
                user_text.to_string()
            }
        };

        let max_results = args
            .get("max_results")
            .and_then(coerce_count)
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .max(1);

        Self { query, max_results }
    }

    /// Normalized arguments, as recorded in the follow-up request.
    pub fn to_value(&self) -> Value {
        serde_json::json!({"query": self.query, "max_results": self.max_results})
    }
}

fn parse_object(raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!(arguments = %other, "Tool call arguments are not an object");
            Map::new()
        }
        Err(error) => {
            debug!(%error, arguments = %raw, "Failed to parse tool call arguments");
            Map::new()
        }
    }
}

fn coerce_count(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
            .map(|n| n as usize),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<usize>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n as usize)
            })
        }
        _ => None,
    }
}
