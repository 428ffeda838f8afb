use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::stock::StockOnHand as DomainStockOnHand;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::stock_on_hand)]
pub struct StockOnHand {
    pub id: i32,
    pub supplier_product_id: i32,
    pub location_id: i32,
    pub qty: i64,
    pub as_of_ts: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::stock_on_hand)]
pub struct NewStockOnHand {
    pub supplier_product_id: i32,
    pub location_id: i32,
    pub qty: i64,
    pub as_of_ts: NaiveDateTime,
}

impl From<StockOnHand> for DomainStockOnHand {
    fn from(value: StockOnHand) -> Self {
        Self {
            id: value.id,
            supplier_product_id: value.supplier_product_id,
            location_id: value.location_id,
            qty: value.qty,
            as_of_ts: value.as_of_ts,
        }
    }
}
