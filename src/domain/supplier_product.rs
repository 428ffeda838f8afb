use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::row::AttrBag;
use crate::pagination::Pagination;

/// Canonical identity of a (supplier, SKU) pair in the catalog.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupplierProduct {
    pub id: i32,
    pub supplier_id: i32,
    /// The supplier's own SKU, unique per supplier.
    pub supplier_sku: String,
    /// Optional link to a de-duplicated product master record.
    pub product_id: Option<i32>,
    pub name_from_supplier: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    pub barcode: Option<String>,
    /// Canonical category, populated by a category-map rule.
    pub category: Option<String>,
    pub attrs: Option<AttrBag>,
    /// False once the SKU goes missing from the supplier's newest upload.
    pub is_active: bool,
    /// True only until the second successful merge touches the product.
    pub is_new: bool,
    pub first_seen_at: NaiveDateTime,
    pub last_seen_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Query definition used to list catalog products for a supplier.
#[derive(Debug, Clone)]
pub struct SupplierProductListQuery {
    pub supplier_id: i32,
    /// Whether deactivated products should be included.
    pub include_inactive: bool,
    pub pagination: Option<Pagination>,
}

impl SupplierProductListQuery {
    pub fn new(supplier_id: i32) -> Self {
        Self {
            supplier_id,
            include_inactive: false,
            pagination: None,
        }
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
