//! Inbound order shape.
//!
//! This is the document published on the order channel. Every field is
//! optional on the wire: missing fields decode to their zero value and
//! unknown fields are ignored, so only a structural mismatch makes a message
//! malformed. `null` for `delivery`, `payment` or `items` also decodes to the
//! zero value. Field order here is the field order of the canonical payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A full order as published upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery: Delivery,
    #[serde(deserialize_with = "null_as_default")]
    pub payment: Payment,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    /// Absent when the producer did not stamp the order.
    pub date_created: Option<DateTime<Utc>>,
    pub oof_shard: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix seconds.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_zero_values() -> Result<(), serde_json::Error> {
        let order: Order = serde_json::from_str(r#"{"order_uid":"abc"}"#)?;
        assert_eq!(order.order_uid, "abc");
        assert!(order.items.is_empty());
        assert_eq!(order.payment.amount, 0);
        assert_eq!(order.date_created, None);
        Ok(())
    }

    #[test]
    fn test_unknown_fields_are_ignored() -> Result<(), serde_json::Error> {
        let order: Order =
            serde_json::from_str(r#"{"order_uid":"abc","loyalty":{"tier":3},"sm_id":99}"#)?;
        assert_eq!(order.sm_id, 99);
        Ok(())
    }

    #[test]
    fn test_null_nested_values_take_zero_values() -> Result<(), serde_json::Error> {
        let order: Order = serde_json::from_str(
            r#"{"order_uid":"abc","delivery":null,"payment":null,"items":null}"#,
        )?;
        assert_eq!(order.delivery, Delivery::default());
        assert_eq!(order.payment, Payment::default());
        assert!(order.items.is_empty());
        Ok(())
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let result: Result<Order, _> = serde_json::from_str(r#"{"order_uid":"abc","sm_id":"x"}"#);
        assert!(result.is_err());
    }
}
