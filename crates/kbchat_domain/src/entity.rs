use derive_setters::Setters;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Upper bound on distinct properties kept per entity.
pub const MAX_PROPERTIES: usize = 5;

/// Upper bound on values kept per property.
pub const MAX_PROPERTY_VALUES: usize = 5;

/// Marker returned when the keyword search yields no candidates.
pub const NO_RESULT_MARKER: &str = "No DBpedia result.";

/// Normalized summary of one knowledge-base entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Setters)]
#[setters(into)]
pub struct EntityRecord {
    pub entity: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub properties: IndexMap<String, Vec<String>>,
}

impl EntityRecord {
    pub fn new(entity: impl Into<String>) -> Self {
        Self { entity: entity.into(), ..Default::default() }
    }
}

/// Groups `(predicate, object)` pairs by predicate in arrival order, keeping
/// at most [`MAX_PROPERTY_VALUES`] values per predicate and the first
/// [`MAX_PROPERTIES`] predicates.
pub fn group_properties(
    pairs: impl IntoIterator<Item = (String, String)>,
) -> IndexMap<String, Vec<String>> {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for (predicate, object) in pairs {
        let values = grouped.entry(predicate).or_default();
        if values.len() < MAX_PROPERTY_VALUES {
            values.push(object);
        }
    }
    grouped.truncate(MAX_PROPERTIES);
    grouped
}

/// Result of one lookup attempt. Failures never escape the lookup helper as
/// errors; they are carried here instead.
#[derive(Clone, Debug, PartialEq)]
pub enum LookupOutcome {
    Found(Vec<EntityRecord>),
    NoResult,
    Failed(String),
}

impl LookupOutcome {
    /// Serialized form handed back to the model as the tool result.
    pub fn to_payload(&self) -> String {
        match self {
            LookupOutcome::Found(records) => {
                serde_json::to_string_pretty(records).unwrap_or_default()
            }
            LookupOutcome::NoResult => serde_json::json!({"error": NO_RESULT_MARKER}).to_string(),
            LookupOutcome::Failed(reason) => serde_json::json!({"error": reason}).to_string(),
        }
    }

    pub fn records(&self) -> &[EntityRecord] {
        match self {
            LookupOutcome::Found(records) => records,
            _ => &[],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LookupClassification {
    Hit,
    Miss,
}

impl LookupClassification {
    /// Classifies a serialized lookup result. Anything empty, mentioning an
    /// error, or carrying the no-result marker is a miss.
    pub fn of_payload(payload: &str) -> Self {
        let is_miss = payload.trim().is_empty()
            || payload.to_lowercase().contains("error")
            || payload.contains("No DBpedia result");
        if is_miss {
            LookupClassification::Miss
        } else {
            LookupClassification::Hit
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, LookupClassification::Hit)
    }
}
