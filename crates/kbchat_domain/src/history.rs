use derive_more::derive::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, Turn};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Display)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Ordered, append-only record of one conversation. The system prompt is
/// never part of the history; it is prepended to every request instead.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct SessionHistory(Vec<Turn>);

impl SessionHistory {
    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    /// Number of turns with the given role.
    pub fn count(&self, role: Role) -> usize {
        self.0.iter().filter(|turn| turn.has_role(role)).count()
    }
}

impl From<Vec<Turn>> for SessionHistory {
    fn from(turns: Vec<Turn>) -> Self {
        Self(turns)
    }
}

impl<'a> IntoIterator for &'a SessionHistory {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
