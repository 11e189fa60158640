use serde::{Deserialize, Serialize};

use crate::EventId;

/// Inclusive id window over the log.
///
/// Bounds may be given in either order; they are normalised so that
/// `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRange")]
pub struct EventRange {
    from: EventId,
    to: EventId,
}

impl EventRange {
    /// Creates a range covering both bounds, swapping them if reversed.
    pub fn new(a: EventId, b: EventId) -> Self {
        if a <= b {
            Self { from: a, to: b }
        } else {
            Self { from: b, to: a }
        }
    }

    /// Creates a range from raw id values, as they arrive from a URL.
    pub fn between(a: i64, b: i64) -> Self {
        Self::new(EventId::new(a), EventId::new(b))
    }

    /// Lower bound (inclusive).
    pub fn from_id(&self) -> EventId {
        self.from
    }

    /// Upper bound (inclusive).
    pub fn to_id(&self) -> EventId {
        self.to
    }

    /// Returns true if `id` falls inside the range.
    pub fn contains(&self, id: EventId) -> bool {
        self.from <= id && id <= self.to
    }
}

// Wire shape of a range; decoded bounds go through `EventRange::new`.
#[derive(Deserialize)]
struct RawRange {
    from: EventId,
    to: EventId,
}

impl From<RawRange> for EventRange {
    fn from(raw: RawRange) -> Self {
        Self::new(raw.from, raw.to)
    }
}

impl std::fmt::Display for EventRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}
