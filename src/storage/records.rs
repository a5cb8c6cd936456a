//! Decoding of the stored transaction list.
//!
//! The stored document is parsed as untyped JSON first and then validated
//! record by record, field by field. Documents written by older releases
//! (and by the browser build, which used `crypto*` key names and plain JSON
//! numbers) are accepted; a record that cannot be coerced into a valid
//! [`Transaction`] is rejected on its own without affecting its neighbours.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{check_amounts, check_product, Id, Transaction, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("stored transactions are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored transactions must be a JSON array, found {0}")]
    NotAnArray(&'static str),
}

/// A stored record that was dropped during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position in the stored array.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedTransactions {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRecord>,
}

/// Decode a stored transaction document, preserving record order.
pub fn decode_transactions(raw: &str) -> Result<DecodedTransactions, RecordError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(RecordError::NotAnArray(json_kind(&value)));
    };

    let mut decoded = DecodedTransactions::default();
    let mut seen: HashSet<Id> = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        match decode_record(item) {
            Ok(tx) if !seen.insert(tx.id.clone()) => decoded.rejected.push(RejectedRecord {
                index,
                reason: format!("duplicate id `{}`", tx.id),
            }),
            Ok(tx) => decoded.transactions.push(tx),
            Err(err) => decoded.rejected.push(RejectedRecord {
                index,
                reason: err.to_string(),
            }),
        }
    }
    Ok(decoded)
}

/// Serialize the transaction list in its canonical stored form.
pub fn encode_transactions(transactions: &[Transaction]) -> serde_json::Result<String> {
    serde_json::to_string(transactions)
}

fn decode_record(value: &Value) -> Result<Transaction, ValidationError> {
    let Value::Object(obj) = value else {
        return Err(ValidationError::InvalidValue {
            field: "record",
            reason: format!("expected an object, found {}", json_kind(value)),
        });
    };

    let id = text(obj, &["id"]).ok_or(ValidationError::MissingField("id"))?;
    let asset_id =
        text(obj, &["assetId", "cryptoId"]).ok_or(ValidationError::MissingField("assetId"))?;
    let quantity = decimal(obj, &["quantity"], "quantity")?
        .ok_or(ValidationError::MissingField("quantity"))?;
    let purchase_unit_price = decimal(
        obj,
        &["purchaseUnitPrice", "purchasePrice"],
        "purchaseUnitPrice",
    )?
    .ok_or(ValidationError::MissingField("purchaseUnitPrice"))?;
    let purchase_date = date(obj, &["purchaseDate"], "purchaseDate")?
        .ok_or(ValidationError::MissingField("purchaseDate"))?;

    check_amounts(quantity, purchase_unit_price)?;

    // A record without a last known price is valued at cost until the next
    // refresh rather than at zero.
    let price_at_record_time = decimal(
        obj,
        &["priceAtRecordTime", "currentPrice"],
        "priceAtRecordTime",
    )?
    .unwrap_or(purchase_unit_price);
    if price_at_record_time.is_sign_negative() && !price_at_record_time.is_zero() {
        return Err(ValidationError::InvalidValue {
            field: "priceAtRecordTime",
            reason: format!("must not be negative, got {price_at_record_time}"),
        });
    }
    check_product("priceAtRecordTime", quantity, price_at_record_time)?;

    let asset_symbol = text(obj, &["assetSymbol", "cryptoSymbol"]).unwrap_or_else(|| asset_id.clone());
    let asset_name = text(obj, &["assetName", "cryptoName"]).unwrap_or_else(|| asset_id.clone());
    let asset_image_ref = text(obj, &["assetImageRef", "cryptoImage"]).unwrap_or_default();
    let price_updated_at = field(obj, &["priceUpdatedAt"])
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Transaction {
        id: Id::from_string(id),
        asset_id,
        asset_symbol,
        asset_name,
        asset_image_ref,
        quantity,
        purchase_unit_price,
        purchase_date,
        price_at_record_time,
        price_updated_at,
    })
}

/// First non-null value among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
}

/// Non-empty trimmed string; numbers are accepted and stringified.
fn text(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    match field(obj, names)? {
        Value::String(s) => Some(s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn decimal(
    obj: &Map<String, Value>,
    names: &[&str],
    name: &'static str,
) -> Result<Option<Decimal>, ValidationError> {
    let Some(value) = field(obj, names) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => parse_decimal(s),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| ValidationError::InvalidValue {
        field: name,
        reason: format!("expected a number, found {value}"),
    })
}

fn date(
    obj: &Map<String, Value>,
    names: &[&str],
    name: &'static str,
) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(value) = field(obj, names) else {
        return Ok(None);
    };
    let parsed = value.as_str().map(str::trim).and_then(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
    });
    parsed.map(Some).ok_or_else(|| ValidationError::InvalidValue {
        field: name,
        reason: format!("expected a YYYY-MM-DD date, found {value}"),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn decodes_browser_era_records() {
        let raw = r#"[{
            "id": "1718035200000",
            "cryptoId": "bitcoin",
            "cryptoName": "Bitcoin",
            "cryptoSymbol": "btc",
            "cryptoImage": "https://example.test/btc.png",
            "quantity": 0.25,
            "purchasePrice": 64000,
            "purchaseDate": "2024-06-10",
            "currentPrice": 67187.33
        }]"#;

        let decoded = decode_transactions(raw).unwrap();
        assert!(decoded.rejected.is_empty());
        let tx = &decoded.transactions[0];
        assert_eq!(tx.id.as_str(), "1718035200000");
        assert_eq!(tx.asset_id, "bitcoin");
        assert_eq!(tx.asset_symbol, "btc");
        assert_eq!(tx.quantity, d("0.25"));
        assert_eq!(tx.purchase_unit_price, d("64000"));
        assert_eq!(tx.price_at_record_time, d("67187.33"));
        assert_eq!(tx.purchase_date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(tx.price_updated_at, None);
    }

    #[test]
    fn canonical_encoding_decodes_back() {
        let raw = r#"[{
            "id": 42,
            "assetId": "ethereum",
            "quantity": "1.5",
            "purchaseUnitPrice": "2000",
            "purchaseDate": "2024-01-02T10:00:00+00:00",
            "priceAtRecordTime": "2500",
            "priceUpdatedAt": "2024-05-01T00:00:00Z"
        }]"#;
        let decoded = decode_transactions(raw).unwrap();
        let tx = &decoded.transactions[0];
        assert_eq!(tx.id.as_str(), "42");
        // Display fields fall back to the asset id.
        assert_eq!(tx.asset_symbol, "ethereum");
        assert_eq!(tx.asset_name, "ethereum");
        assert_eq!(tx.purchase_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert!(tx.price_updated_at.is_some());

        let encoded = encode_transactions(&decoded.transactions).unwrap();
        let again = decode_transactions(&encoded).unwrap();
        assert_eq!(again.transactions, decoded.transactions);
    }

    #[test]
    fn missing_current_price_defaults_to_cost() {
        let raw = r#"[{"id": "a", "assetId": "x", "quantity": 2,
                       "purchaseUnitPrice": 3, "purchaseDate": "2024-01-01"}]"#;
        let decoded = decode_transactions(raw).unwrap();
        assert_eq!(decoded.transactions[0].price_at_record_time, d("3"));
    }

    #[test]
    fn scientific_notation_is_accepted() {
        let raw = r#"[{"id": "a", "assetId": "shiba-inu", "quantity": 1000000,
                       "purchaseUnitPrice": 1.2e-5, "purchaseDate": "2024-01-01"}]"#;
        let decoded = decode_transactions(raw).unwrap();
        assert_eq!(decoded.transactions[0].purchase_unit_price, d("0.000012"));
    }

    #[test]
    fn invalid_records_are_rejected_individually() {
        let raw = r#"[
            {"id": "ok", "assetId": "bitcoin", "quantity": 1, "purchaseUnitPrice": 1, "purchaseDate": "2024-01-01"},
            {"id": "zero", "assetId": "bitcoin", "quantity": 0, "purchaseUnitPrice": 1, "purchaseDate": "2024-01-01"},
            {"id": "neg", "assetId": "bitcoin", "quantity": 1, "purchaseUnitPrice": -5, "purchaseDate": "2024-01-01"},
            {"id": "nodate", "assetId": "bitcoin", "quantity": 1, "purchaseUnitPrice": 1},
            {"id": "baddate", "assetId": "bitcoin", "quantity": 1, "purchaseUnitPrice": 1, "purchaseDate": "yesterday"},
            {"id": "text", "assetId": "bitcoin", "quantity": "lots", "purchaseUnitPrice": 1, "purchaseDate": "2024-01-01"},
            {"assetId": "bitcoin", "quantity": 1, "purchaseUnitPrice": 1, "purchaseDate": "2024-01-01"},
            "not an object",
            {"id": "ok", "assetId": "ethereum", "quantity": 1, "purchaseUnitPrice": 1, "purchaseDate": "2024-01-01"}
        ]"#;

        let decoded = decode_transactions(raw).unwrap();
        assert_eq!(decoded.transactions.len(), 1);
        assert_eq!(decoded.transactions[0].asset_id, "bitcoin");

        let indexes: Vec<usize> = decoded.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(decoded.rejected[2].reason.contains("purchaseDate"));
        assert!(decoded.rejected[7].reason.contains("duplicate id"));
    }

    #[test]
    fn out_of_range_amounts_are_rejected() {
        let raw = r#"[
            {"id": "huge-cost", "assetId": "bitcoin", "quantity": "1000000000000000",
             "purchaseUnitPrice": "1000000000000000", "purchaseDate": "2024-01-01"},
            {"id": "huge-value", "assetId": "bitcoin", "quantity": "1000000000000000",
             "purchaseUnitPrice": "1", "priceAtRecordTime": "1000000000000000",
             "purchaseDate": "2024-01-01"},
            {"id": "tiny", "assetId": "bitcoin", "quantity": "0.00000000000001",
             "purchaseUnitPrice": "0.00000000000001", "priceAtRecordTime": "100000000000000000000",
             "purchaseDate": "2024-01-01"}
        ]"#;
        let decoded = decode_transactions(raw).unwrap();
        let indexes: Vec<usize> = decoded.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert!(decoded.rejected[0].reason.contains("purchaseUnitPrice"));
        assert!(decoded.rejected[1].reason.contains("priceAtRecordTime"));
        assert_eq!(decoded.transactions[0].id.as_str(), "tiny");
    }

    #[test]
    fn non_array_documents_are_errors() {
        assert!(matches!(
            decode_transactions("{}"),
            Err(RecordError::NotAnArray("an object"))
        ));
        assert!(matches!(
            decode_transactions("[{"),
            Err(RecordError::Json(_))
        ));
    }
}
