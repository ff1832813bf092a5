//! Fuzz target for order message validation.
//!
//! Arbitrary bus payloads must produce either a record or an `IngestError`,
//! never a panic.
//!
//! Run with: cargo +nightly fuzz run validate_order_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use orderline_core::{validate_order, IngestError};

fuzz_target!(|data: &[u8]| {
    match validate_order(data) {
        Ok(record) => {
            assert!(!record.identifier.is_empty(), "accepted record must carry an identifier");
            // The stored payload must itself validate to the same identifier.
            let again = validate_order(&record.payload).expect("canonical payload re-validates");
            assert_eq!(again.identifier, record.identifier);
        }
        Err(IngestError::MalformedInput { .. }) | Err(IngestError::MissingIdentifier) => {}
        Err(other) => panic!("validation produced a non-validation error: {other}"),
    }
});
