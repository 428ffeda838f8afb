use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::rule::RowDraft;

/// Record of one rule applied to one upload's row batch.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupplierRuleExecution {
    pub id: i32,
    pub rule_id: i32,
    pub upload_id: i32,
    pub supplier_id: i32,
    pub rule_name: String,
    pub rule_type: String,
    pub execution_order: i32,
    pub trigger_event: String,
    pub executed_at: NaiveDateTime,
    /// False when the rule hit an internal error on at least one row.
    pub success: bool,
    /// True when the rule vetoed at least one row.
    pub blocked: bool,
    /// Row states before the rule ran.
    pub input_snapshot: Vec<RowSnapshot>,
    /// Row states after the rule ran.
    pub output_snapshot: Vec<RowSnapshot>,
    pub warnings: Vec<String>,
    pub rows_affected: i32,
    pub execution_time_ms: i64,
}

/// Payload for recording one rule execution.
#[derive(Debug, Clone)]
pub struct NewSupplierRuleExecution {
    pub rule_id: i32,
    pub upload_id: i32,
    pub supplier_id: i32,
    pub rule_name: String,
    pub rule_type: String,
    pub execution_order: i32,
    pub trigger_event: String,
    pub success: bool,
    pub blocked: bool,
    pub input_snapshot: Vec<RowSnapshot>,
    pub output_snapshot: Vec<RowSnapshot>,
    pub warnings: Vec<String>,
    pub rows_affected: i32,
    pub execution_time_ms: i64,
}

/// Compact per-row state captured before and after a rule runs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RowSnapshot {
    pub row_num: i32,
    pub supplier_sku: String,
    pub price_cents: i64,
    pub category: Option<String>,
    pub blocked: bool,
}

impl RowSnapshot {
    pub fn capture(draft: &RowDraft, blocked: bool) -> Self {
        Self {
            row_num: draft.row_num,
            supplier_sku: draft.supplier_sku.clone(),
            price_cents: draft.price_cents,
            category: draft.category_mapped.clone(),
            blocked,
        }
    }
}
