use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::supplier_product::SupplierProduct as DomainSupplierProduct;
use crate::models::row::parse_attrs;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::supplier_products)]
pub struct SupplierProduct {
    pub id: i32,
    pub supplier_id: i32,
    pub supplier_sku: String,
    pub product_id: Option<i32>,
    pub name_from_supplier: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub attrs_json: Option<String>,
    pub is_active: bool,
    pub is_new: bool,
    pub first_seen_at: NaiveDateTime,
    pub last_seen_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SupplierProduct {
    pub fn into_domain(self) -> Result<DomainSupplierProduct, serde_json::Error> {
        let attrs = parse_attrs(self.attrs_json.as_deref())?;
        Ok(DomainSupplierProduct {
            id: self.id,
            supplier_id: self.supplier_id,
            supplier_sku: self.supplier_sku,
            product_id: self.product_id,
            name_from_supplier: self.name_from_supplier,
            brand: self.brand,
            uom: self.uom,
            pack_size: self.pack_size,
            barcode: self.barcode,
            category: self.category,
            attrs,
            is_active: self.is_active,
            is_new: self.is_new,
            first_seen_at: self.first_seen_at,
            last_seen_at: self.last_seen_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::supplier_products)]
pub struct NewSupplierProduct<'a> {
    pub supplier_id: i32,
    pub supplier_sku: &'a str,
    pub name_from_supplier: &'a str,
    pub brand: Option<&'a str>,
    pub uom: Option<&'a str>,
    pub pack_size: Option<&'a str>,
    pub barcode: Option<&'a str>,
    pub category: Option<&'a str>,
    pub attrs_json: Option<String>,
    pub is_active: bool,
    pub is_new: bool,
    pub first_seen_at: NaiveDateTime,
    pub last_seen_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::supplier_products)]
pub struct UpdateSupplierProduct<'a> {
    pub name_from_supplier: &'a str,
    pub brand: Option<&'a str>,
    pub uom: Option<&'a str>,
    pub pack_size: Option<&'a str>,
    pub barcode: Option<&'a str>,
    pub category: Option<&'a str>,
    pub attrs_json: Option<String>,
    pub is_active: bool,
    pub is_new: bool,
    pub last_seen_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
