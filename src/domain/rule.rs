use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::row::{AttrBag, PricelistRow};

/// Closed set of rule behaviors, each with its own typed configuration.
///
/// Stored as tagged JSON in the `config` column; the `type` tag doubles as
/// the persisted `rule_type` discriminant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Field cleanup applied before any pricing rule.
    Normalize {
        #[serde(default)]
        trim_text: bool,
        #[serde(default)]
        uppercase_sku: bool,
        default_currency: Option<String>,
    },
    /// Basis-point discount off the staged price.
    PriceDiscount { percent_off_bp: i64 },
    /// Basis-point uplift on the staged price.
    PriceMarkup { percent_bp: i64 },
    /// Maps the supplier's raw category text to a canonical category.
    CategoryMap {
        mappings: HashMap<String, String>,
        default: Option<String>,
    },
    /// Vetoes rows priced below the supplier-configured floor.
    MinPrice { floor_cents: i64 },
    /// Stamps an expected lead time into the row attributes.
    StockEta { lead_time_days: i64 },
}

impl RuleConfig {
    /// Persisted discriminant matching the serde tag.
    pub fn rule_type(&self) -> &'static str {
        match self {
            Self::Normalize { .. } => "normalize",
            Self::PriceDiscount { .. } => "price_discount",
            Self::PriceMarkup { .. } => "price_markup",
            Self::CategoryMap { .. } => "category_map",
            Self::MinPrice { .. } => "min_price",
            Self::StockEta { .. } => "stock_eta",
        }
    }

    /// Applies the rule to one row draft.
    pub fn apply(&self, row: &mut RowDraft) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();
        match self {
            Self::Normalize {
                trim_text,
                uppercase_sku,
                default_currency,
            } => {
                if *trim_text {
                    row.supplier_sku = row.supplier_sku.trim().to_string();
                    row.name = row.name.trim().to_string();
                    if let Some(raw) = row.category_raw.as_ref() {
                        row.category_raw = Some(raw.trim().to_string());
                    }
                }
                if *uppercase_sku {
                    row.supplier_sku = row.supplier_sku.to_uppercase();
                }
                if row.currency.is_empty()
                    && let Some(currency) = default_currency
                {
                    row.currency = currency.clone();
                }
            }
            Self::PriceDiscount { percent_off_bp } => {
                if !(0..=10_000).contains(percent_off_bp) {
                    outcome.warnings.push(format!(
                        "row {}: discount of {percent_off_bp}bp is outside 0..=10000, skipped",
                        row.row_num
                    ));
                } else {
                    row.price_cents = apply_basis_points(row.price_cents, -percent_off_bp);
                }
            }
            Self::PriceMarkup { percent_bp } => {
                if *percent_bp < 0 {
                    outcome.warnings.push(format!(
                        "row {}: negative markup of {percent_bp}bp, skipped",
                        row.row_num
                    ));
                } else {
                    row.price_cents = apply_basis_points(row.price_cents, *percent_bp);
                }
            }
            Self::CategoryMap { mappings, default } => {
                let raw = row
                    .category_raw
                    .as_deref()
                    .map(normalize_key)
                    .unwrap_or_default();
                let mapped = mappings
                    .iter()
                    .find(|(key, _)| normalize_key(key) == raw)
                    .map(|(_, target)| target.clone());
                match mapped.or_else(|| default.clone()) {
                    Some(category) => row.category_mapped = Some(category),
                    None => outcome.warnings.push(format!(
                        "row {}: no category mapping for {:?}",
                        row.row_num, row.category_raw
                    )),
                }
            }
            Self::MinPrice { floor_cents } => {
                if row.price_cents < *floor_cents {
                    outcome.blocked = Some(format!(
                        "price {} is below the supplier floor {}",
                        row.price_cents, floor_cents
                    ));
                }
            }
            Self::StockEta { lead_time_days } => {
                row.attrs
                    .get_or_insert_with(AttrBag::new)
                    .insert("eta_days".to_string(), Value::from(*lead_time_days));
            }
        }
        outcome
    }
}

/// Rounded half-up adjustment of `cents` by `delta_bp` basis points.
fn apply_basis_points(cents: i64, delta_bp: i64) -> i64 {
    let scaled = cents * (10_000 + delta_bp);
    (scaled + 5_000).div_euclid(10_000)
}

fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Result of applying one rule to one row.
#[derive(Debug, Default, Clone)]
pub struct RuleOutcome {
    pub warnings: Vec<String>,
    /// `Some(reason)` when the rule vetoed the row.
    pub blocked: Option<String>,
}

/// Mutable working copy of the fields a rule may touch.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDraft {
    pub row_num: i32,
    pub supplier_sku: String,
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub category_raw: Option<String>,
    pub category_mapped: Option<String>,
    pub attrs: Option<AttrBag>,
}

impl From<&PricelistRow> for RowDraft {
    fn from(row: &PricelistRow) -> Self {
        Self {
            row_num: row.row_num,
            supplier_sku: row.supplier_sku.clone(),
            name: row.name.clone(),
            price_cents: row.price_cents,
            currency: row.currency.clone(),
            category_raw: row.category_raw.clone(),
            category_mapped: row.category_mapped.clone(),
            attrs: row.attrs.clone(),
        }
    }
}

/// Domain representation of a configured, ordered supplier rule.
#[derive(Debug, Clone)]
pub struct SupplierRule {
    pub id: i32,
    pub supplier_id: i32,
    pub rule_name: String,
    pub config: RuleConfig,
    /// Position in the supplier's sequential pipeline, unique per supplier.
    pub execution_order: i32,
    /// When true, a rule-internal failure blocks the affected rows instead
    /// of letting them pass unmodified.
    pub fail_closed: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Payload required to configure a new rule.
#[derive(Debug, Clone)]
pub struct NewSupplierRule {
    pub supplier_id: i32,
    pub rule_name: String,
    pub config: RuleConfig,
    pub execution_order: i32,
    pub fail_closed: bool,
    pub is_active: bool,
}

impl NewSupplierRule {
    pub fn new(
        supplier_id: i32,
        rule_name: impl Into<String>,
        config: RuleConfig,
        execution_order: i32,
    ) -> Self {
        Self {
            supplier_id,
            rule_name: rule_name.into(),
            config,
            execution_order,
            fail_closed: false,
            is_active: true,
        }
    }

    pub fn fail_closed(mut self) -> Self {
        self.fail_closed = true;
        self
    }
}
