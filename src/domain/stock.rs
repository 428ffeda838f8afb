use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Current quantity snapshot per (supplier product, location).
///
/// Unlike price history this is overwritten in place on each merge.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StockOnHand {
    pub id: i32,
    pub supplier_product_id: i32,
    pub location_id: i32,
    pub qty: i64,
    pub as_of_ts: NaiveDateTime,
}
