use diesel::prelude::*;

use crate::domain::row::{
    AttrBag, NewPricelistRow as DomainNewRow, PricelistRow as DomainRow,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::pricelist_rows)]
pub struct PricelistRow {
    pub id: i32,
    pub upload_id: i32,
    pub row_num: i32,
    pub supplier_sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub category_raw: Option<String>,
    pub category_mapped: Option<String>,
    pub vat_code: Option<String>,
    pub barcode: Option<String>,
    pub qty: Option<i64>,
    pub attrs_json: Option<String>,
    pub valid: bool,
    pub invalid_reason: Option<String>,
    pub blocked: bool,
    pub blocked_reason: Option<String>,
}

impl PricelistRow {
    /// Fallible because `attrs_json` must parse back into a JSON object.
    pub fn into_domain(self) -> Result<DomainRow, serde_json::Error> {
        let attrs = parse_attrs(self.attrs_json.as_deref())?;
        Ok(DomainRow {
            id: self.id,
            upload_id: self.upload_id,
            row_num: self.row_num,
            supplier_sku: self.supplier_sku,
            name: self.name,
            brand: self.brand,
            uom: self.uom,
            pack_size: self.pack_size,
            price_cents: self.price_cents,
            currency: self.currency,
            category_raw: self.category_raw,
            category_mapped: self.category_mapped,
            vat_code: self.vat_code,
            barcode: self.barcode,
            qty: self.qty,
            attrs,
            valid: self.valid,
            invalid_reason: self.invalid_reason,
            blocked: self.blocked,
            blocked_reason: self.blocked_reason,
        })
    }
}

pub(crate) fn parse_attrs(text: Option<&str>) -> Result<Option<AttrBag>, serde_json::Error> {
    text.map(serde_json::from_str).transpose()
}

pub(crate) fn serialize_attrs(
    attrs: Option<&AttrBag>,
) -> Result<Option<String>, serde_json::Error> {
    attrs.map(serde_json::to_string).transpose()
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::pricelist_rows)]
pub struct NewPricelistRow<'a> {
    pub upload_id: i32,
    pub row_num: i32,
    pub supplier_sku: &'a str,
    pub name: &'a str,
    pub brand: Option<&'a str>,
    pub uom: Option<&'a str>,
    pub pack_size: Option<&'a str>,
    pub price_cents: i64,
    pub currency: &'a str,
    pub category_raw: Option<&'a str>,
    pub vat_code: Option<&'a str>,
    pub barcode: Option<&'a str>,
    pub qty: Option<i64>,
    pub attrs_json: Option<String>,
    pub valid: bool,
    pub blocked: bool,
}

impl<'a> NewPricelistRow<'a> {
    pub fn from_domain(
        upload_id: i32,
        row: &'a DomainNewRow,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            upload_id,
            row_num: row.row_num,
            supplier_sku: row.supplier_sku.as_str(),
            name: row.name.as_str(),
            brand: row.brand.as_deref(),
            uom: row.uom.as_deref(),
            pack_size: row.pack_size.as_deref(),
            price_cents: row.price_cents,
            currency: row.currency.as_str(),
            category_raw: row.category_raw.as_deref(),
            vat_code: row.vat_code.as_deref(),
            barcode: row.barcode.as_deref(),
            qty: row.qty,
            attrs_json: serialize_attrs(row.attrs.as_ref())?,
            valid: false,
            blocked: false,
        })
    }
}
