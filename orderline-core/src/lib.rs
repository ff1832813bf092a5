//! Orderline Core - Order Types and Validation
//!
//! Pure data structures and the validate/normalize step. All other crates
//! depend on this. No I/O happens here.

pub mod error;
pub mod order;
pub mod record;

pub use error::{ConfigError, IngestError, ReadError, StoreError};
pub use order::{Delivery, Item, Order, Payment};
pub use record::{validate_order, OrderRecord};
