use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::Id;

/// Rejection of user-supplied purchase input. Nothing is stored when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unknown asset `{0}`: not present in the current market snapshot")]
    UnknownAsset(String),
}

/// A recorded purchase of one asset.
///
/// Everything except `price_at_record_time` / `price_updated_at` is fixed at
/// creation. Those two track the latest snapshot price seen for the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Id,
    pub asset_id: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub asset_image_ref: String,
    pub quantity: Decimal,
    pub purchase_unit_price: Decimal,
    pub purchase_date: NaiveDate,
    pub price_at_record_time: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Quantity times purchase price, saturating at the `Decimal` range.
    pub fn cost(&self) -> Decimal {
        self.quantity.saturating_mul(self.purchase_unit_price)
    }

    /// Quantity times the last known market price, saturating at the
    /// `Decimal` range.
    pub fn current_value(&self) -> Decimal {
        self.quantity.saturating_mul(self.price_at_record_time)
    }

    /// Overwrite the last known price. Returns true when anything changed.
    pub(crate) fn apply_price(&mut self, price: Decimal, as_of: DateTime<Utc>) -> bool {
        if self.price_at_record_time == price && self.price_updated_at == Some(as_of) {
            return false;
        }
        self.price_at_record_time = price;
        self.price_updated_at = Some(as_of);
        true
    }
}

/// Caller-supplied purchase fields, as entered. Every field is optional so
/// that an incomplete form can be represented and rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDraft {
    pub asset_id: Option<String>,
    pub quantity: Option<Decimal>,
    pub purchase_unit_price: Option<Decimal>,
    pub purchase_date: Option<NaiveDate>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub asset_id: String,
    pub quantity: Decimal,
    pub purchase_unit_price: Decimal,
    pub purchase_date: NaiveDate,
}

impl TransactionDraft {
    pub fn new(
        asset_id: impl Into<String>,
        quantity: Decimal,
        purchase_unit_price: Decimal,
        purchase_date: NaiveDate,
    ) -> Self {
        Self {
            asset_id: Some(asset_id.into()),
            quantity: Some(quantity),
            purchase_unit_price: Some(purchase_unit_price),
            purchase_date: Some(purchase_date),
        }
    }

    pub fn validate(&self) -> Result<ValidDraft, ValidationError> {
        let asset_id = self
            .asset_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingField("assetId"))?;
        let quantity = self
            .quantity
            .ok_or(ValidationError::MissingField("quantity"))?;
        let purchase_unit_price = self
            .purchase_unit_price
            .ok_or(ValidationError::MissingField("purchaseUnitPrice"))?;
        let purchase_date = self
            .purchase_date
            .ok_or(ValidationError::MissingField("purchaseDate"))?;

        check_amounts(quantity, purchase_unit_price)?;

        Ok(ValidDraft {
            asset_id: asset_id.to_string(),
            quantity,
            purchase_unit_price,
            purchase_date,
        })
    }
}

/// Enforce `quantity > 0`, `purchase_unit_price >= 0` and a cost that fits
/// in a `Decimal`.
pub(crate) fn check_amounts(
    quantity: Decimal,
    purchase_unit_price: Decimal,
) -> Result<(), ValidationError> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::InvalidValue {
            field: "quantity",
            reason: format!("must be greater than zero, got {quantity}"),
        });
    }
    if purchase_unit_price.is_sign_negative() && !purchase_unit_price.is_zero() {
        return Err(ValidationError::InvalidValue {
            field: "purchaseUnitPrice",
            reason: format!("must not be negative, got {purchase_unit_price}"),
        });
    }
    check_product("purchaseUnitPrice", quantity, purchase_unit_price)
}

/// Reject a quantity and price whose product is out of range.
pub(crate) fn check_product(
    field: &'static str,
    quantity: Decimal,
    price: Decimal,
) -> Result<(), ValidationError> {
    match quantity.checked_mul(price) {
        Some(_) => Ok(()),
        None => Err(ValidationError::InvalidValue {
            field,
            reason: format!("{quantity} times {price} is out of range"),
        }),
    }
}
