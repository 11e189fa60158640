//! Ledger submissions as they arrive from a form: every field is raw text.
//!
//! Each command coerces its fields and checks the event invariants, producing
//! either a ready-to-append [`LedgerEvent`] or a [`ValidationError`] whose
//! message can be shown back to the user.

use event_store::{LedgerEvent, ValidationError};
use serde::Deserialize;

const TRADE_FIELDS_REQUIRED: &str = "product name, price and quantity are required";
const VALUE_REQUIRED: &str = "value is required";

/// Command to record a purchase of stock.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPurchase {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default, alias = "qty")]
    pub quantity: String,
}

impl RecordPurchase {
    pub fn new(
        product: impl Into<String>,
        unit_price: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            unit_price: unit_price.into(),
            quantity: quantity.into(),
        }
    }

    pub fn into_event(self) -> Result<LedgerEvent, ValidationError> {
        let (product, unit_price, quantity) =
            parse_trade(&self.product, &self.unit_price, &self.quantity)?;
        let event = LedgerEvent::buy(product, unit_price, quantity);
        event.validate()?;
        Ok(event)
    }
}

/// Command to record a sale of stock.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordSale {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default, alias = "qty")]
    pub quantity: String,
}

impl RecordSale {
    pub fn new(
        product: impl Into<String>,
        unit_price: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            unit_price: unit_price.into(),
            quantity: quantity.into(),
        }
    }

    pub fn into_event(self) -> Result<LedgerEvent, ValidationError> {
        let (product, unit_price, quantity) =
            parse_trade(&self.product, &self.unit_price, &self.quantity)?;
        let event = LedgerEvent::sell(product, unit_price, quantity);
        event.validate()?;
        Ok(event)
    }
}

/// Command to correct the cash balance by a signed amount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjustBalance {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub value: String,
}

impl AdjustBalance {
    pub fn new(comment: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            value: value.into(),
        }
    }

    pub fn into_event(self) -> Result<LedgerEvent, ValidationError> {
        let value = self.value.trim();
        if value.is_empty() {
            return Err(ValidationError::MissingField(VALUE_REQUIRED));
        }
        let value = parse_real(value, "value")?;

        let event = LedgerEvent::balance(self.comment.trim(), value);
        event.validate()?;
        Ok(event)
    }
}

fn parse_trade<'a>(
    product: &'a str,
    unit_price: &str,
    quantity: &str,
) -> Result<(&'a str, f64, u32), ValidationError> {
    let (product, unit_price, quantity) = (product.trim(), unit_price.trim(), quantity.trim());
    if product.is_empty() || unit_price.is_empty() || quantity.is_empty() {
        return Err(ValidationError::MissingField(TRADE_FIELDS_REQUIRED));
    }

    let unit_price = parse_real(unit_price, "price")?;
    // Zero, negatives and fractions all fail here
    let quantity = quantity
        .parse::<u32>()
        .ok()
        .filter(|q| *q > 0)
        .ok_or(ValidationError::NonPositiveQuantity)?;

    Ok((product, unit_price, quantity))
}

fn parse_real(raw: &str, field: &'static str) -> Result<f64, ValidationError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ValidationError::NonNumeric { field })
}
