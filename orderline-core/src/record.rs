//! Canonical order records and the validate/normalize step.

use bytes::Bytes;

use crate::error::IngestError;
use crate::order::Order;

/// An order as it is persisted and cached: its uid and the canonical payload.
///
/// The payload is reference-counted and immutable, so cloning a record or
/// handing its payload out never exposes shared state to mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub identifier: String,
    pub payload: Bytes,
}

impl OrderRecord {
    pub fn new(identifier: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: payload.into(),
        }
    }
}

/// Parse an untrusted message body and re-encode it in canonical form.
///
/// Fails with [`IngestError::MalformedInput`] if the body is not an order
/// document and with [`IngestError::MissingIdentifier`] if it parses but
/// carries an empty `order_uid`.
pub fn validate_order(content: &[u8]) -> Result<OrderRecord, IngestError> {
    let order: Order = serde_json::from_slice(content).map_err(|e| IngestError::MalformedInput {
        reason: e.to_string(),
    })?;

    if order.order_uid.is_empty() {
        return Err(IngestError::MissingIdentifier);
    }

    let payload = serde_json::to_vec(&order).map_err(|e| IngestError::MalformedInput {
        reason: e.to_string(),
    })?;

    Ok(OrderRecord {
        identifier: order.order_uid,
        payload: Bytes::from(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"{
        "order_uid": "b563feb7b2b84b6test",
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "delivery": {"name": "Test Testov", "phone": "+9720000000", "zip": "2639809",
            "city": "Kiryat Mozkin", "address": "Ploshad Mira 15", "region": "Kraiot",
            "email": "test@gmail.com"},
        "payment": {"transaction": "b563feb7b2b84b6test", "request_id": "", "currency": "USD",
            "provider": "wbpay", "amount": 1817, "payment_dt": 1637907727, "bank": "alpha",
            "delivery_cost": 1500, "goods_total": 317, "custom_fee": 0},
        "items": [{"chrt_id": 9934930, "track_number": "WBILMTESTTRACK", "price": 453,
            "rid": "ab4219087a764ae0btest", "name": "Mascaras", "sale": 30, "size": "0",
            "total_price": 317, "nm_id": 2389212, "brand": "Vivienne Sabo", "status": 202}],
        "locale": "en",
        "internal_signature": "",
        "customer_id": "test",
        "delivery_service": "meest",
        "shardkey": "9",
        "sm_id": 99,
        "date_created": "2021-11-26T06:22:19Z",
        "oof_shard": "1"
    }"#;

    #[test]
    fn test_valid_order_is_normalized() -> Result<(), IngestError> {
        let record = validate_order(SAMPLE.as_bytes())?;
        assert_eq!(record.identifier, "b563feb7b2b84b6test");
        // Compact encoding, no insignificant whitespace survives.
        assert!(!record.payload.contains(&b'\n'));
        let text = std::str::from_utf8(&record.payload).map_err(|e| IngestError::MalformedInput {
            reason: e.to_string(),
        })?;
        assert!(text.starts_with(r#"{"order_uid":"b563feb7b2b84b6test""#));
        Ok(())
    }

    #[test]
    fn test_normalization_ignores_producer_encoding() -> Result<(), IngestError> {
        let spaced = validate_order(br#"{ "sm_id" : 7 , "order_uid" : "a1" }"#)?;
        let compact = validate_order(br#"{"order_uid":"a1","sm_id":7}"#)?;
        assert_eq!(spaced, compact);
        Ok(())
    }

    #[test]
    fn test_null_nested_values_are_accepted() -> Result<(), IngestError> {
        let with_nulls = validate_order(br#"{"order_uid":"a1","items":null,"delivery":null}"#)?;
        let without = validate_order(br#"{"order_uid":"a1"}"#)?;
        assert_eq!(with_nulls, without);
        Ok(())
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = validate_order(b"this is not json").unwrap_err();
        assert!(matches!(err, IngestError::MalformedInput { .. }));

        let err = validate_order(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, IngestError::MalformedInput { .. }));
    }

    #[test]
    fn test_empty_uid_is_missing_identifier() {
        assert_eq!(
            validate_order(br#"{"order_uid":""}"#),
            Err(IngestError::MissingIdentifier)
        );
        assert_eq!(
            validate_order(br#"{"track_number":"WB"}"#),
            Err(IngestError::MissingIdentifier)
        );
    }

    proptest! {
        #[test]
        fn prop_canonical_payload_is_a_fixed_point(
            uid in "[a-z0-9]{1,24}",
            sm_id in any::<i64>(),
            locale in "[a-z]{2}",
        ) {
            let raw = serde_json::json!({"locale": locale, "order_uid": uid, "sm_id": sm_id});
            let first = validate_order(raw.to_string().as_bytes())
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let second = validate_order(&first.payload)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = validate_order(&data);
        }
    }
}
