use serde::{Deserialize, Serialize};

/// Identifier of a stored ledger event.
///
/// Assigned by the event store at insertion time. Ids are strictly
/// increasing in insertion order and are the only ordering key of the log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Creates an event ID from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the first id a fresh store hands out.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the id following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<EventId> for i64 {
    fn from(id: EventId) -> Self {
        id.0
    }
}
