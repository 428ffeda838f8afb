use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use log::{error, info};
use serde::Serialize;
use serde_json::json;

use crate::domain::audit::NewAuditEvent;
use crate::domain::upload::UploadStatus;
use crate::repository::{
    CatalogWriter, EventRecorder, MergeOptions, MergeOutcome, RowReader, RuleExecutionReader,
    RuleReader, UploadReader, UploadWriter,
};
use crate::services::{ServiceError, ServiceResult, record_best_effort};

lazy_static! {
    /// One lock per supplier so two merges never interleave their catalog
    /// writes for the same supplier.
    static ref SUPPLIER_MERGE_LOCKS: Mutex<HashMap<i32, Arc<Mutex<()>>>> =
        Mutex::new(HashMap::new());
}

fn supplier_lock(supplier_id: i32) -> Arc<Mutex<()>> {
    let mut locks = SUPPLIER_MERGE_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(supplier_id).or_default().clone()
}

/// Aggregate result of one merge pass.
#[derive(Debug, Serialize, Clone)]
pub struct MergeSummary {
    pub upload_id: i32,
    pub rows_merged: usize,
    #[serde(skip)]
    pub outcome: MergeOutcome,
}

/// Reconciles a validated upload into the supplier catalog.
///
/// The upload moves `validated -> merging -> merged`; any failure inside the
/// merge transaction rolls the catalog back and fails the upload instead.
/// When the supplier has active rules the merge requires a recorded rule
/// pass, so untransformed rows never reach the catalog.
pub fn merge_upload<R>(
    repo: &R,
    upload_id: i32,
    options: &MergeOptions,
) -> ServiceResult<MergeSummary>
where
    R: UploadReader
        + UploadWriter
        + RowReader
        + RuleReader
        + RuleExecutionReader
        + CatalogWriter
        + EventRecorder
        + ?Sized,
{
    let upload = repo
        .get_upload_by_id(upload_id)?
        .ok_or(ServiceError::NotFound)?;

    let lock = supplier_lock(upload.supplier_id);
    let _guard = lock
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    // Re-read under the lock; another merge may have finished meanwhile.
    let upload = repo
        .get_upload_by_id(upload_id)?
        .ok_or(ServiceError::NotFound)?;
    if upload.status != UploadStatus::Validated {
        return Err(ServiceError::InvalidState {
            action: "merge",
            status: upload.status,
        });
    }
    let active_rules = repo.list_active_rules(upload.supplier_id)?;
    if !active_rules.is_empty() && repo.list_executions(upload_id)?.is_empty() {
        return Err(ServiceError::RulesPending(upload_id));
    }

    let rows: Vec<_> = repo
        .list_rows(upload_id)?
        .into_iter()
        .filter(|row| row.is_mergeable())
        .collect();
    if rows.is_empty() {
        return Err(ServiceError::Merge(format!(
            "upload {upload_id} has no mergeable rows"
        )));
    }

    let upload = repo.set_upload_status(upload_id, UploadStatus::Validated, UploadStatus::Merging)?;
    record_best_effort(
        repo,
        NewAuditEvent::new("merge_started", "running")
            .supplier(upload.supplier_id)
            .upload(upload_id)
            .details(json!({ "rows": rows.len(), "strict": options.strict }))
            .open(),
    );

    match repo.merge_pricelist(&upload, &rows, options) {
        Ok(outcome) => {
            info!(
                "upload {upload_id} merged: {} created, {} updated, {} deactivated, {} prices changed",
                outcome.products_created,
                outcome.products_updated,
                outcome.products_deactivated,
                outcome.prices_changed
            );
            record_best_effort(
                repo,
                NewAuditEvent::new("merge_finished", "completed")
                    .supplier(upload.supplier_id)
                    .upload(upload_id)
                    .details(json!({
                        "created": outcome.products_created,
                        "updated": outcome.products_updated,
                        "deactivated": outcome.products_deactivated,
                        "prices_changed": outcome.prices_changed,
                        "stock_updated": outcome.stock_updated,
                        "row_errors": outcome.row_errors.len(),
                    })),
            );
            Ok(MergeSummary {
                upload_id,
                rows_merged: rows.len(),
                outcome,
            })
        }
        Err(err) => {
            error!("upload {upload_id} merge failed: {err}");
            // The merge transaction rolled back, so the upload is still
            // `merging` and must be failed explicitly.
            if let Err(status_err) =
                repo.set_upload_status(upload_id, UploadStatus::Merging, UploadStatus::Failed)
            {
                error!("upload {upload_id} could not be failed: {status_err}");
            }
            record_best_effort(
                repo,
                NewAuditEvent::new("merge_failed", "failed")
                    .supplier(upload.supplier_id)
                    .upload(upload_id)
                    .details(json!({ "error": err.to_string() })),
            );
            Err(ServiceError::Merge(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::row::PricelistRow;
    use crate::domain::upload::PricelistUpload;
    use crate::repository::errors::{RepositoryError, RepositoryResult};
    use crate::domain::rule::{RuleConfig, SupplierRule};
    use crate::domain::rule_execution::SupplierRuleExecution;
    use crate::repository::mock::{
        MockCatalogWriter, MockEventRecorder, MockRowReader, MockRuleExecutionReader,
        MockRuleReader, MockUploadReader, MockUploadWriter,
    };

    struct FakeRepo {
        upload_reader: MockUploadReader,
        upload_writer: MockUploadWriter,
        row_reader: MockRowReader,
        rule_reader: MockRuleReader,
        execution_reader: MockRuleExecutionReader,
        catalog: MockCatalogWriter,
        events: MockEventRecorder,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                upload_reader: MockUploadReader::new(),
                upload_writer: MockUploadWriter::new(),
                row_reader: MockRowReader::new(),
                rule_reader: MockRuleReader::new(),
                execution_reader: MockRuleExecutionReader::new(),
                catalog: MockCatalogWriter::new(),
                events: MockEventRecorder::new(),
            }
        }
    }

    impl RuleReader for FakeRepo {
        fn list_active_rules(&self, supplier_id: i32) -> RepositoryResult<Vec<SupplierRule>> {
            self.rule_reader.list_active_rules(supplier_id)
        }
    }

    impl RuleExecutionReader for FakeRepo {
        fn list_executions(&self, upload_id: i32) -> RepositoryResult<Vec<SupplierRuleExecution>> {
            self.execution_reader.list_executions(upload_id)
        }
        fn list_executions_after(
            &self,
            after_id: i32,
            supplier_id: Option<i32>,
            upload_id: Option<i32>,
            limit: i64,
        ) -> RepositoryResult<Vec<SupplierRuleExecution>> {
            self.execution_reader
                .list_executions_after(after_id, supplier_id, upload_id, limit)
        }
    }

    impl UploadReader for FakeRepo {
        fn get_upload_by_id(&self, id: i32) -> RepositoryResult<Option<PricelistUpload>> {
            self.upload_reader.get_upload_by_id(id)
        }
        fn list_uploads(
            &self,
            query: crate::domain::upload::UploadListQuery,
        ) -> RepositoryResult<(usize, Vec<PricelistUpload>)> {
            self.upload_reader.list_uploads(query)
        }
    }

    impl UploadWriter for FakeRepo {
        fn create_upload(
            &self,
            new_upload: &crate::domain::upload::NewPricelistUpload,
            rows: &[crate::domain::row::NewPricelistRow],
        ) -> RepositoryResult<PricelistUpload> {
            self.upload_writer.create_upload(new_upload, rows)
        }
        fn set_upload_status(
            &self,
            upload_id: i32,
            from: UploadStatus,
            to: UploadStatus,
        ) -> RepositoryResult<PricelistUpload> {
            self.upload_writer.set_upload_status(upload_id, from, to)
        }
    }

    impl RowReader for FakeRepo {
        fn list_rows(&self, upload_id: i32) -> RepositoryResult<Vec<PricelistRow>> {
            self.row_reader.list_rows(upload_id)
        }
    }

    impl CatalogWriter for FakeRepo {
        fn merge_pricelist(
            &self,
            upload: &PricelistUpload,
            rows: &[PricelistRow],
            options: &MergeOptions,
        ) -> RepositoryResult<MergeOutcome> {
            self.catalog.merge_pricelist(upload, rows, options)
        }
    }

    impl EventRecorder for FakeRepo {
        fn record_event(
            &self,
            event: &NewAuditEvent,
        ) -> RepositoryResult<crate::domain::audit::AuditEvent> {
            self.events.record_event(event)
        }
    }

    fn fixed_datetime() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn sample_upload(id: i32, status: UploadStatus) -> PricelistUpload {
        PricelistUpload {
            id,
            supplier_id: 1,
            filename: "june.xlsx".to_string(),
            currency: "EUR".to_string(),
            valid_from: fixed_datetime(),
            status,
            row_count: 1,
            created_at: fixed_datetime(),
            updated_at: fixed_datetime(),
        }
    }

    fn mergeable_row(row_num: i32) -> PricelistRow {
        PricelistRow {
            id: row_num,
            upload_id: 5,
            row_num,
            supplier_sku: format!("A{row_num}"),
            name: format!("Product {row_num}"),
            brand: None,
            uom: None,
            pack_size: None,
            price_cents: 1_000,
            currency: "EUR".to_string(),
            category_raw: None,
            category_mapped: None,
            vat_code: None,
            barcode: None,
            qty: None,
            attrs: None,
            valid: true,
            invalid_reason: None,
            blocked: false,
            blocked_reason: None,
        }
    }

    fn discard_event() -> crate::domain::audit::AuditEvent {
        crate::domain::audit::AuditEvent {
            id: 1,
            supplier_id: Some(1),
            upload_id: Some(5),
            action: "merge_started".to_string(),
            status: "running".to_string(),
            details: None,
            started_at: fixed_datetime(),
            finished_at: None,
        }
    }

    #[test]
    fn rejects_uploads_that_are_not_validated() {
        let mut repo = FakeRepo::new();
        repo.upload_reader
            .expect_get_upload_by_id()
            .returning(|id| Ok(Some(sample_upload(id, UploadStatus::Received))));

        let result = merge_upload(&repo, 5, &MergeOptions::default());

        assert!(matches!(
            result,
            Err(ServiceError::InvalidState {
                action: "merge",
                status: UploadStatus::Received,
            })
        ));
    }

    #[test]
    fn all_rows_blocked_leaves_the_upload_validated() {
        let mut repo = FakeRepo::new();
        repo.upload_reader
            .expect_get_upload_by_id()
            .returning(|id| Ok(Some(sample_upload(id, UploadStatus::Validated))));
        repo.rule_reader
            .expect_list_active_rules()
            .returning(|_| Ok(Vec::new()));
        repo.row_reader.expect_list_rows().returning(|_| {
            let mut row = mergeable_row(1);
            row.blocked = true;
            Ok(vec![row])
        });

        let result = merge_upload(&repo, 5, &MergeOptions::default());

        assert!(matches!(result, Err(ServiceError::Merge(_))));
    }

    #[test]
    fn successful_merge_reports_the_outcome() {
        let mut repo = FakeRepo::new();
        repo.upload_reader
            .expect_get_upload_by_id()
            .returning(|id| Ok(Some(sample_upload(id, UploadStatus::Validated))));
        repo.rule_reader
            .expect_list_active_rules()
            .returning(|_| Ok(Vec::new()));
        repo.row_reader
            .expect_list_rows()
            .returning(|_| Ok(vec![mergeable_row(1), mergeable_row(2)]));
        repo.upload_writer
            .expect_set_upload_status()
            .withf(|_, from, to| *from == UploadStatus::Validated && *to == UploadStatus::Merging)
            .times(1)
            .returning(|id, _, to| Ok(sample_upload(id, to)));
        repo.catalog
            .expect_merge_pricelist()
            .times(1)
            .returning(|_, rows, _| {
                Ok(MergeOutcome {
                    products_created: rows.len(),
                    ..MergeOutcome::default()
                })
            });
        repo.events
            .expect_record_event()
            .times(2)
            .returning(|_| Ok(discard_event()));

        let summary = merge_upload(&repo, 5, &MergeOptions::default()).expect("summary");

        assert_eq!(summary.rows_merged, 2);
        assert_eq!(summary.outcome.products_created, 2);
    }

    #[test]
    fn failed_merge_fails_the_upload() {
        let mut repo = FakeRepo::new();
        repo.upload_reader
            .expect_get_upload_by_id()
            .returning(|id| Ok(Some(sample_upload(id, UploadStatus::Validated))));
        repo.rule_reader
            .expect_list_active_rules()
            .returning(|_| Ok(Vec::new()));
        repo.row_reader
            .expect_list_rows()
            .returning(|_| Ok(vec![mergeable_row(1)]));
        repo.upload_writer
            .expect_set_upload_status()
            .withf(|_, from, to| *from == UploadStatus::Validated && *to == UploadStatus::Merging)
            .times(1)
            .returning(|id, _, to| Ok(sample_upload(id, to)));
        repo.catalog
            .expect_merge_pricelist()
            .times(1)
            .returning(|_, _, _| {
                Err(RepositoryError::Conflict("row 1 failed in strict mode".into()))
            });
        repo.upload_writer
            .expect_set_upload_status()
            .withf(|_, from, to| *from == UploadStatus::Merging && *to == UploadStatus::Failed)
            .times(1)
            .returning(|id, _, to| Ok(sample_upload(id, to)));
        repo.events
            .expect_record_event()
            .times(2)
            .returning(|_| Ok(discard_event()));

        let result = merge_upload(&repo, 5, &MergeOptions { strict: true, location_id: 1 });

        assert!(matches!(result, Err(ServiceError::Merge(_))));
    }

    #[test]
    fn merge_refused_until_rules_have_run() {
        let mut repo = FakeRepo::new();
        repo.upload_reader
            .expect_get_upload_by_id()
            .returning(|id| Ok(Some(sample_upload(id, UploadStatus::Validated))));
        repo.rule_reader.expect_list_active_rules().returning(|_| {
            Ok(vec![SupplierRule {
                id: 1,
                supplier_id: 1,
                rule_name: "floor".to_string(),
                config: RuleConfig::MinPrice { floor_cents: 100 },
                execution_order: 1,
                fail_closed: false,
                is_active: true,
                created_at: fixed_datetime(),
            }])
        });
        repo.execution_reader
            .expect_list_executions()
            .returning(|_| Ok(Vec::new()));

        let result = merge_upload(&repo, 5, &MergeOptions::default());

        assert!(matches!(result, Err(ServiceError::RulesPending(5))));
    }
}
