use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EventId, ValidationError};

/// Largest cash amount a single event may move, in either direction.
///
/// Keeps the running cash total finite for any realistic number of events.
pub const MAX_AMOUNT: f64 = 1e15;

/// Discriminator of a ledger event, as persisted in the `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Buy,
    Sell,
    Balance,
}

impl EventKind {
    /// Returns the persisted name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Buy => "buy",
            EventKind::Sell => "sell",
            EventKind::Balance => "balance",
        }
    }

    /// Parses a persisted kind name.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "buy" => Some(EventKind::Buy),
            "sell" => Some(EventKind::Sell),
            "balance" => Some(EventKind::Balance),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a purchase or a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Product identifier.
    pub product: String,

    /// Price of one unit at transaction time.
    pub unit_price: f64,

    /// Number of units moved.
    pub quantity: u32,
}

impl Trade {
    pub fn new(product: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        Self {
            product: product.into(),
            unit_price,
            quantity,
        }
    }

    /// Cash moved by this trade, `unit_price * quantity`.
    pub fn total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Payload of a manual cash balance adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    /// Free text, may be empty.
    pub comment: String,

    /// Signed amount added to the cash balance.
    pub value: f64,
}

impl Adjustment {
    pub fn new(comment: impl Into<String>, value: f64) -> Self {
        Self {
            comment: comment.into(),
            value,
        }
    }
}

/// A ledger event. Each kind carries only the fields meaningful to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerEvent {
    /// Stock comes in, cash goes out.
    Buy(Trade),

    /// Stock goes out, cash comes in.
    Sell(Trade),

    /// Cash is corrected by a signed amount.
    Balance(Adjustment),
}

impl LedgerEvent {
    pub fn buy(product: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        LedgerEvent::Buy(Trade::new(product, unit_price, quantity))
    }

    pub fn sell(product: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        LedgerEvent::Sell(Trade::new(product, unit_price, quantity))
    }

    pub fn balance(comment: impl Into<String>, value: f64) -> Self {
        LedgerEvent::Balance(Adjustment::new(comment, value))
    }

    /// Returns the kind discriminator.
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::Buy(_) => EventKind::Buy,
            LedgerEvent::Sell(_) => EventKind::Sell,
            LedgerEvent::Balance(_) => EventKind::Balance,
        }
    }

    /// Checks the per-kind invariants an event must hold before it may be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            LedgerEvent::Buy(trade) | LedgerEvent::Sell(trade) => {
                if trade.product.trim().is_empty() {
                    return Err(ValidationError::MissingProduct);
                }
                if trade.quantity == 0 {
                    return Err(ValidationError::NonPositiveQuantity);
                }
                if !trade.unit_price.is_finite() {
                    return Err(ValidationError::NonNumeric { field: "price" });
                }
                if trade.unit_price < 0.0 {
                    return Err(ValidationError::NegativePrice);
                }
                if trade.total() > MAX_AMOUNT {
                    return Err(ValidationError::AmountOutOfRange);
                }
                Ok(())
            }
            LedgerEvent::Balance(adjustment) => {
                if !adjustment.value.is_finite() {
                    return Err(ValidationError::NonNumeric { field: "value" });
                }
                if adjustment.value.abs() > MAX_AMOUNT {
                    return Err(ValidationError::AmountOutOfRange);
                }
                Ok(())
            }
        }
    }
}

/// An event as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Store-assigned identifier, the ordering key.
    pub id: EventId,

    /// When the event was written. Not used for ordering.
    pub timestamp: DateTime<Utc>,

    /// The event itself.
    #[serde(flatten)]
    pub event: LedgerEvent,
}

impl StoredEvent {
    pub fn new(id: EventId, timestamp: DateTime<Utc>, event: LedgerEvent) -> Self {
        Self {
            id,
            timestamp,
            event,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}
