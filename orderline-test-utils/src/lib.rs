//! Orderline Test Utilities
//!
//! Shared test infrastructure for the orderline workspace:
//! - Proptest generators for orders and records
//! - Fixtures for common scenarios

pub use orderline_core::{
    validate_order, Delivery, IngestError, Item, Order, OrderRecord, Payment, ReadError,
    StoreError,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating orders.

    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    /// Generate a non-empty order uid in the upstream style.
    pub fn arb_order_uid() -> impl Strategy<Value = String> {
        "[a-z0-9]{8,20}"
    }

    pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1_500_000_000i64..1_900_000_000i64)
            .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    pub fn arb_delivery() -> impl Strategy<Value = Delivery> {
        (
            "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}",
            "\\+[0-9]{10}",
            "[0-9]{6,7}",
            "[A-Z][a-z]{3,12}",
            "[a-z]{2,8}@example\\.com",
        )
            .prop_map(|(name, phone, zip, city, email)| Delivery {
                name,
                phone,
                zip,
                city: city.clone(),
                address: format!("{} 15", city),
                region: city,
                email,
            })
    }

    pub fn arb_payment(transaction: String) -> impl Strategy<Value = Payment> {
        (
            prop_oneof![Just("USD"), Just("RUB"), Just("EUR")],
            0i64..1_000_000,
            0i64..5_000,
            1_600_000_000i64..1_700_000_000i64,
        )
            .prop_map(move |(currency, goods_total, delivery_cost, payment_dt)| Payment {
                transaction: transaction.clone(),
                request_id: String::new(),
                currency: currency.to_string(),
                provider: "wbpay".to_string(),
                amount: goods_total + delivery_cost,
                payment_dt,
                bank: "alpha".to_string(),
                delivery_cost,
                goods_total,
                custom_fee: 0,
            })
    }

    pub fn arb_item() -> impl Strategy<Value = Item> {
        (
            any::<u32>(),
            1i64..100_000,
            0i64..90,
            "[A-Z][a-z]{3,12}",
            "[A-Z][a-z]{3,12}",
            prop_oneof![Just(200i64), Just(202i64), Just(400i64)],
        )
            .prop_map(|(chrt_id, price, sale, name, brand, status)| Item {
                chrt_id: i64::from(chrt_id),
                track_number: "WBILMTESTTRACK".to_string(),
                price,
                rid: format!("rid{}", chrt_id),
                name,
                sale,
                size: "0".to_string(),
                total_price: price * (100 - sale) / 100,
                nm_id: i64::from(chrt_id) * 3,
                brand,
                status,
            })
    }

    /// Generate a complete, valid order.
    pub fn arb_order() -> impl Strategy<Value = Order> {
        arb_order_uid().prop_flat_map(|uid| {
            (
                arb_delivery(),
                arb_payment(uid.clone()),
                proptest::collection::vec(arb_item(), 0..4),
                prop_oneof![Just("en"), Just("ru")],
                proptest::option::of(arb_timestamp()),
                0i64..100,
            )
                .prop_map(
                    move |(delivery, payment, items, locale, date_created, sm_id)| Order {
                        order_uid: uid.clone(),
                        track_number: "WBILMTESTTRACK".to_string(),
                        entry: "WBIL".to_string(),
                        delivery,
                        payment,
                        items,
                        locale: locale.to_string(),
                        internal_signature: String::new(),
                        customer_id: "test".to_string(),
                        delivery_service: "meest".to_string(),
                        shardkey: "9".to_string(),
                        sm_id,
                        date_created,
                        oof_shard: "1".to_string(),
                    },
                )
        })
    }

    /// Generate the raw message body a producer would publish for an order.
    pub fn arb_order_message() -> impl Strategy<Value = (Order, Vec<u8>)> {
        arb_order().prop_map(|order| {
            let body = serde_json::to_vec_pretty(&order).unwrap_or_default();
            (order, body)
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// The sample order used by the upstream publisher's test data.
    pub fn sample_order() -> Order {
        Order {
            order_uid: "b563feb7b2b84b6test".to_string(),
            track_number: "WBILMTESTTRACK".to_string(),
            entry: "WBIL".to_string(),
            delivery: Delivery {
                name: "Test Testov".to_string(),
                phone: "+9720000000".to_string(),
                zip: "2639809".to_string(),
                city: "Kiryat Mozkin".to_string(),
                address: "Ploshad Mira 15".to_string(),
                region: "Kraiot".to_string(),
                email: "test@gmail.com".to_string(),
            },
            payment: Payment {
                transaction: "b563feb7b2b84b6test".to_string(),
                request_id: String::new(),
                currency: "USD".to_string(),
                provider: "wbpay".to_string(),
                amount: 1817,
                payment_dt: 1637907727,
                bank: "alpha".to_string(),
                delivery_cost: 1500,
                goods_total: 317,
                custom_fee: 0,
            },
            items: vec![Item {
                chrt_id: 9934930,
                track_number: "WBILMTESTTRACK".to_string(),
                price: 453,
                rid: "ab4219087a764ae0btest".to_string(),
                name: "Mascaras".to_string(),
                sale: 30,
                size: "0".to_string(),
                total_price: 317,
                nm_id: 2389212,
                brand: "Vivienne Sabo".to_string(),
                status: 202,
            }],
            locale: "en".to_string(),
            internal_signature: String::new(),
            customer_id: "test".to_string(),
            delivery_service: "meest".to_string(),
            shardkey: "9".to_string(),
            sm_id: 99,
            date_created: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).single(),
            oof_shard: "1".to_string(),
        }
    }

    /// The sample order as a pretty-printed message body.
    pub fn sample_order_message() -> Vec<u8> {
        serde_json::to_vec_pretty(&sample_order()).unwrap_or_default()
    }

    /// A minimal valid message for the given uid.
    pub fn minimal_message(uid: &str) -> Vec<u8> {
        serde_json::json!({ "order_uid": uid }).to_string().into_bytes()
    }

    /// Canonical record for a minimal message with the given uid.
    pub fn minimal_record(uid: &str) -> Result<OrderRecord, IngestError> {
        validate_order(&minimal_message(uid))
    }
}
