use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::upload::{
    NewPricelistUpload as DomainNewUpload, PricelistUpload as DomainUpload,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::pricelist_uploads)]
pub struct PricelistUpload {
    pub id: i32,
    pub supplier_id: i32,
    pub filename: String,
    pub currency: String,
    pub valid_from: NaiveDateTime,
    pub status: String,
    pub row_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::pricelist_uploads)]
pub struct NewPricelistUpload<'a> {
    pub supplier_id: i32,
    pub filename: &'a str,
    pub currency: &'a str,
    pub valid_from: NaiveDateTime,
    pub status: &'a str,
}

impl From<PricelistUpload> for DomainUpload {
    fn from(value: PricelistUpload) -> Self {
        Self {
            id: value.id,
            supplier_id: value.supplier_id,
            filename: value.filename,
            currency: value.currency,
            valid_from: value.valid_from,
            status: value.status.as_str().into(),
            row_count: value.row_count,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewUpload> for NewPricelistUpload<'a> {
    fn from(value: &'a DomainNewUpload) -> Self {
        Self {
            supplier_id: value.supplier_id,
            filename: value.filename.as_str(),
            currency: value.currency.as_str(),
            valid_from: value.valid_from,
            status: "received",
        }
    }
}
