use crate::db::{DbConnection, DbPool};
use crate::domain::audit::{AuditEvent, NewAuditEvent};
use crate::domain::price_history::PriceHistory;
use crate::domain::row::{NewPricelistRow, PricelistRow, RowUpdate, RowValidity};
use crate::domain::rule::{NewSupplierRule, SupplierRule};
use crate::domain::rule_execution::{NewSupplierRuleExecution, SupplierRuleExecution};
use crate::domain::stock::StockOnHand;
use crate::domain::supplier::{NewSupplier, Supplier};
use crate::domain::supplier_product::{SupplierProduct, SupplierProductListQuery};
use crate::domain::upload::{NewPricelistUpload, PricelistUpload, UploadListQuery, UploadStatus};
use crate::repository::errors::RepositoryResult;

pub mod audit;
pub mod catalog;
pub mod errors;
pub mod rule;
pub mod supplier;
pub mod upload;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Knobs for one merge pass.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Abort the whole transaction on the first row-level failure instead of
    /// collecting it and moving on.
    pub strict: bool,
    /// Stock location the uploaded quantities belong to.
    pub location_id: i32,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            location_id: crate::DEFAULT_LOCATION_ID,
        }
    }
}

/// Counters describing what one merge pass changed in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub products_created: usize,
    pub products_updated: usize,
    pub products_deactivated: usize,
    pub prices_changed: usize,
    pub stock_updated: usize,
    /// Row-level failures skipped in non-strict mode.
    pub row_errors: Vec<String>,
}

/// Read-only operations over supplier records.
pub trait SupplierReader {
    fn get_supplier_by_id(&self, id: i32) -> RepositoryResult<Option<Supplier>>;
    fn list_suppliers(&self) -> RepositoryResult<Vec<Supplier>>;
}

/// Write operations over supplier records.
pub trait SupplierWriter {
    fn create_supplier(&self, new_supplier: &NewSupplier) -> RepositoryResult<Supplier>;
}

/// Read-only operations over staged uploads.
pub trait UploadReader {
    fn get_upload_by_id(&self, id: i32) -> RepositoryResult<Option<PricelistUpload>>;
    fn list_uploads(&self, query: UploadListQuery)
    -> RepositoryResult<(usize, Vec<PricelistUpload>)>;
}

/// Write operations over staged uploads.
pub trait UploadWriter {
    /// Stage an upload together with its rows in one transaction.
    fn create_upload(
        &self,
        new_upload: &NewPricelistUpload,
        rows: &[NewPricelistRow],
    ) -> RepositoryResult<PricelistUpload>;

    /// Guarded status transition; only writes when the stored status still
    /// equals `from` and the edge is legal.
    fn set_upload_status(
        &self,
        upload_id: i32,
        from: UploadStatus,
        to: UploadStatus,
    ) -> RepositoryResult<PricelistUpload>;
}

/// Read-only operations over staged rows.
pub trait RowReader {
    fn list_rows(&self, upload_id: i32) -> RepositoryResult<Vec<PricelistRow>>;
}

/// Write operations over staged rows.
pub trait RowWriter {
    /// Write per-row validation verdicts back to staging.
    fn set_row_validity(
        &self,
        upload_id: i32,
        verdicts: &[RowValidity],
    ) -> RepositoryResult<usize>;

    /// Write rule-engine outputs back to staging.
    fn apply_rule_outcomes(
        &self,
        upload_id: i32,
        updates: &[RowUpdate],
    ) -> RepositoryResult<usize>;
}

/// Read-only operations over configured supplier rules.
pub trait RuleReader {
    /// Active rules for a supplier, ordered by `execution_order` then id.
    fn list_active_rules(&self, supplier_id: i32) -> RepositoryResult<Vec<SupplierRule>>;
}

/// Write operations over configured supplier rules.
pub trait RuleWriter {
    fn create_rule(&self, new_rule: &NewSupplierRule) -> RepositoryResult<SupplierRule>;
}

/// Read-only operations over the rule execution log.
pub trait RuleExecutionReader {
    fn list_executions(&self, upload_id: i32) -> RepositoryResult<Vec<SupplierRuleExecution>>;

    /// Executions with id greater than `after_id`, oldest first.
    fn list_executions_after(
        &self,
        after_id: i32,
        supplier_id: Option<i32>,
        upload_id: Option<i32>,
        limit: i64,
    ) -> RepositoryResult<Vec<SupplierRuleExecution>>;
}

/// Write operations over the rule execution log.
pub trait RuleExecutionWriter {
    fn record_execution(
        &self,
        execution: &NewSupplierRuleExecution,
    ) -> RepositoryResult<SupplierRuleExecution>;
}

/// Read-only operations over the reconciled catalog.
pub trait CatalogReader {
    fn get_supplier_product(
        &self,
        supplier_id: i32,
        supplier_sku: &str,
    ) -> RepositoryResult<Option<SupplierProduct>>;
    fn list_supplier_products(
        &self,
        query: SupplierProductListQuery,
    ) -> RepositoryResult<(usize, Vec<SupplierProduct>)>;
    fn price_history(&self, supplier_product_id: i32) -> RepositoryResult<Vec<PriceHistory>>;
    fn stock_on_hand(&self, supplier_product_id: i32) -> RepositoryResult<Vec<StockOnHand>>;
}

/// Write operations over the reconciled catalog.
pub trait CatalogWriter {
    /// Reconcile the mergeable rows of a `merging` upload into the catalog
    /// in one transaction, including the final move to `merged`.
    fn merge_pricelist(
        &self,
        upload: &PricelistUpload,
        rows: &[PricelistRow],
        options: &MergeOptions,
    ) -> RepositoryResult<MergeOutcome>;
}

/// Appends audit events.
pub trait EventRecorder {
    fn record_event(&self, event: &NewAuditEvent) -> RepositoryResult<AuditEvent>;
}

/// Read-only operations over the audit log.
pub trait AuditEventReader {
    /// Audit events with id greater than `after_id`, oldest first.
    fn list_audit_events_after(
        &self,
        after_id: i32,
        supplier_id: Option<i32>,
        upload_id: Option<i32>,
        limit: i64,
    ) -> RepositoryResult<Vec<AuditEvent>>;

    fn last_audit_event(&self, upload_id: i32) -> RepositoryResult<Option<AuditEvent>>;
}
