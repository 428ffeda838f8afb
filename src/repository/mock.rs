use mockall::mock;

use super::{
    AuditEventReader, CatalogReader, CatalogWriter, EventRecorder, MergeOptions, MergeOutcome,
    RowReader, RowWriter, RuleExecutionReader, RuleExecutionWriter, RuleReader, RuleWriter,
    SupplierReader, SupplierWriter, UploadReader, UploadWriter,
};
use crate::domain::{
    audit::{AuditEvent, NewAuditEvent},
    price_history::PriceHistory,
    row::{NewPricelistRow, PricelistRow, RowUpdate, RowValidity},
    rule::{NewSupplierRule, SupplierRule},
    rule_execution::{NewSupplierRuleExecution, SupplierRuleExecution},
    stock::StockOnHand,
    supplier::{NewSupplier, Supplier},
    supplier_product::{SupplierProduct, SupplierProductListQuery},
    upload::{NewPricelistUpload, PricelistUpload, UploadListQuery, UploadStatus},
};
use crate::repository::errors::RepositoryResult;

mock! {
    pub SupplierReader {}

    impl SupplierReader for SupplierReader {
        fn get_supplier_by_id(&self, id: i32) -> RepositoryResult<Option<Supplier>>;
        fn list_suppliers(&self) -> RepositoryResult<Vec<Supplier>>;
    }
}

mock! {
    pub SupplierWriter {}

    impl SupplierWriter for SupplierWriter {
        fn create_supplier(&self, new_supplier: &NewSupplier) -> RepositoryResult<Supplier>;
    }
}

mock! {
    pub UploadReader {}

    impl UploadReader for UploadReader {
        fn get_upload_by_id(&self, id: i32) -> RepositoryResult<Option<PricelistUpload>>;
        fn list_uploads(&self, query: UploadListQuery) -> RepositoryResult<(usize, Vec<PricelistUpload>)>;
    }
}

mock! {
    pub UploadWriter {}

    impl UploadWriter for UploadWriter {
        fn create_upload(&self, new_upload: &NewPricelistUpload, rows: &[NewPricelistRow]) -> RepositoryResult<PricelistUpload>;
        fn set_upload_status(&self, upload_id: i32, from: UploadStatus, to: UploadStatus) -> RepositoryResult<PricelistUpload>;
    }
}

mock! {
    pub RowReader {}

    impl RowReader for RowReader {
        fn list_rows(&self, upload_id: i32) -> RepositoryResult<Vec<PricelistRow>>;
    }
}

mock! {
    pub RowWriter {}

    impl RowWriter for RowWriter {
        fn set_row_validity(&self, upload_id: i32, verdicts: &[RowValidity]) -> RepositoryResult<usize>;
        fn apply_rule_outcomes(&self, upload_id: i32, updates: &[RowUpdate]) -> RepositoryResult<usize>;
    }
}

mock! {
    pub RuleReader {}

    impl RuleReader for RuleReader {
        fn list_active_rules(&self, supplier_id: i32) -> RepositoryResult<Vec<SupplierRule>>;
    }
}

mock! {
    pub RuleWriter {}

    impl RuleWriter for RuleWriter {
        fn create_rule(&self, new_rule: &NewSupplierRule) -> RepositoryResult<SupplierRule>;
    }
}

mock! {
    pub RuleExecutionReader {}

    impl RuleExecutionReader for RuleExecutionReader {
        fn list_executions(&self, upload_id: i32) -> RepositoryResult<Vec<SupplierRuleExecution>>;
        fn list_executions_after(&self, after_id: i32, supplier_id: Option<i32>, upload_id: Option<i32>, limit: i64) -> RepositoryResult<Vec<SupplierRuleExecution>>;
    }
}

mock! {
    pub RuleExecutionWriter {}

    impl RuleExecutionWriter for RuleExecutionWriter {
        fn record_execution(&self, execution: &NewSupplierRuleExecution) -> RepositoryResult<SupplierRuleExecution>;
    }
}

mock! {
    pub CatalogReader {}

    impl CatalogReader for CatalogReader {
        fn get_supplier_product(&self, supplier_id: i32, supplier_sku: &str) -> RepositoryResult<Option<SupplierProduct>>;
        fn list_supplier_products(&self, query: SupplierProductListQuery) -> RepositoryResult<(usize, Vec<SupplierProduct>)>;
        fn price_history(&self, supplier_product_id: i32) -> RepositoryResult<Vec<PriceHistory>>;
        fn stock_on_hand(&self, supplier_product_id: i32) -> RepositoryResult<Vec<StockOnHand>>;
    }
}

mock! {
    pub CatalogWriter {}

    impl CatalogWriter for CatalogWriter {
        fn merge_pricelist(&self, upload: &PricelistUpload, rows: &[PricelistRow], options: &MergeOptions) -> RepositoryResult<MergeOutcome>;
    }
}

mock! {
    pub EventRecorder {}

    impl EventRecorder for EventRecorder {
        fn record_event(&self, event: &NewAuditEvent) -> RepositoryResult<AuditEvent>;
    }
}

mock! {
    pub AuditEventReader {}

    impl AuditEventReader for AuditEventReader {
        fn list_audit_events_after(&self, after_id: i32, supplier_id: Option<i32>, upload_id: Option<i32>, limit: i64) -> RepositoryResult<Vec<AuditEvent>>;
        fn last_audit_event(&self, upload_id: i32) -> RepositoryResult<Option<AuditEvent>>;
    }
}
