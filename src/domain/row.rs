use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value bag for supplier-specific row attributes.
pub type AttrBag = Map<String, Value>;

/// One pre-parsed line item handed to the intake boundary by the upstream
/// file decoder. All cell-to-field mapping has already happened; the price
/// is still the raw decimal text from the sheet.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RawRow {
    pub supplier_sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    /// Decimal price text, e.g. `"12.34"` or `"1 234,56"`.
    pub price: String,
    /// Currency override for this row; the upload currency applies otherwise.
    pub currency: Option<String>,
    pub category_raw: Option<String>,
    pub vat_code: Option<String>,
    pub barcode: Option<String>,
    /// Quantity on hand reported alongside the price, when the sheet has one.
    pub qty: Option<i64>,
    pub attrs: Option<AttrBag>,
}

/// Domain representation of one staged pricelist row.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PricelistRow {
    pub id: i32,
    pub upload_id: i32,
    /// Position in the uploaded file, 1-based, unique per upload.
    pub row_num: i32,
    pub supplier_sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    /// Price in the smallest currency unit; `-1` when the raw price did not
    /// parse, so the validator can flag it.
    pub price_cents: i64,
    pub currency: String,
    pub category_raw: Option<String>,
    /// Canonical category produced by a category-map rule.
    pub category_mapped: Option<String>,
    pub vat_code: Option<String>,
    pub barcode: Option<String>,
    pub qty: Option<i64>,
    pub attrs: Option<AttrBag>,
    /// Validation outcome; invalid rows never reach rules or merge.
    pub valid: bool,
    pub invalid_reason: Option<String>,
    /// Set when a rule vetoed this row.
    pub blocked: bool,
    pub blocked_reason: Option<String>,
}

impl PricelistRow {
    /// Whether the merge phase may reconcile this row into the catalog.
    pub fn is_mergeable(&self) -> bool {
        self.valid && !self.blocked
    }
}

/// Payload for bulk-inserting staged rows at intake.
#[derive(Debug, Clone)]
pub struct NewPricelistRow {
    pub row_num: i32,
    pub supplier_sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub uom: Option<String>,
    pub pack_size: Option<String>,
    pub price_cents: i64,
    pub currency: String,
    pub category_raw: Option<String>,
    pub vat_code: Option<String>,
    pub barcode: Option<String>,
    pub qty: Option<i64>,
    pub attrs: Option<AttrBag>,
}

/// Per-row validation verdict written back to staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValidity {
    pub row_num: i32,
    pub valid: bool,
    pub reason: Option<String>,
}

/// Rule-engine output written back to a staged row.
#[derive(Debug, Clone)]
pub struct RowUpdate {
    pub row_num: i32,
    pub supplier_sku: String,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub category_mapped: Option<String>,
    pub attrs: Option<AttrBag>,
    pub blocked: bool,
    pub blocked_reason: Option<String>,
}

/// Shallow-merge `incoming` into `base`; incoming keys win.
pub fn merge_attrs(base: Option<&AttrBag>, incoming: Option<&AttrBag>) -> Option<AttrBag> {
    match (base, incoming) {
        (None, None) => None,
        (Some(b), None) => Some(b.clone()),
        (None, Some(i)) => Some(i.clone()),
        (Some(b), Some(i)) => {
            let mut merged = b.clone();
            for (key, value) in i {
                merged.insert(key.clone(), value.clone());
            }
            Some(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(pairs: &[(&str, Value)]) -> AttrBag {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn merge_attrs_incoming_keys_win() {
        let base = bag(&[("color", json!("red")), ("size", json!("L"))]);
        let incoming = bag(&[("color", json!("blue")), ("weight", json!(2))]);

        let merged = merge_attrs(Some(&base), Some(&incoming)).expect("merged bag");
        assert_eq!(merged.get("color"), Some(&json!("blue")));
        assert_eq!(merged.get("size"), Some(&json!("L")));
        assert_eq!(merged.get("weight"), Some(&json!(2)));
    }

    #[test]
    fn merge_attrs_handles_missing_sides() {
        let base = bag(&[("a", json!(1))]);
        assert_eq!(merge_attrs(Some(&base), None), Some(base.clone()));
        assert_eq!(merge_attrs(None, Some(&base)), Some(base));
        assert_eq!(merge_attrs(None, None), None);
    }
}
