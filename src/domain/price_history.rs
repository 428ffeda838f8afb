use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One interval of a supplier product's append-only price timeline.
///
/// At most one row per product is current (`valid_to` null); a price change
/// closes the current row and opens a new one.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PriceHistory {
    pub id: i32,
    pub supplier_product_id: i32,
    pub price_cents: i64,
    pub currency: String,
    pub valid_from: NaiveDateTime,
    pub valid_to: Option<NaiveDateTime>,
    pub is_current: bool,
}
