use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::price_history::PriceHistory as DomainPriceHistory;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::price_history)]
pub struct PriceHistory {
    pub id: i32,
    pub supplier_product_id: i32,
    pub price_cents: i64,
    pub currency: String,
    pub valid_from: NaiveDateTime,
    pub valid_to: Option<NaiveDateTime>,
    pub is_current: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::price_history)]
pub struct NewPriceHistory<'a> {
    pub supplier_product_id: i32,
    pub price_cents: i64,
    pub currency: &'a str,
    pub valid_from: NaiveDateTime,
    pub is_current: bool,
}

impl From<PriceHistory> for DomainPriceHistory {
    fn from(value: PriceHistory) -> Self {
        Self {
            id: value.id,
            supplier_product_id: value.supplier_product_id,
            price_cents: value.price_cents,
            currency: value.currency,
            valid_from: value.valid_from,
            valid_to: value.valid_to,
            is_current: value.is_current,
        }
    }
}
