use serde::{Deserialize, Serialize};

use crate::domain::audit::AuditEvent;
use crate::domain::upload::{PricelistUpload, UploadListQuery, UploadStatus};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{AuditEventReader, RowReader, UploadReader};
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the uploads listing.
#[derive(Debug, Default, Deserialize)]
pub struct UploadsQuery {
    pub supplier_id: Option<i32>,
    pub status: Option<UploadStatus>,
    /// Page requested by the caller (1-based).
    pub page: Option<usize>,
}

/// Lists uploads, newest first.
pub fn list_uploads<R>(repo: &R, query: UploadsQuery) -> ServiceResult<Paginated<PricelistUpload>>
where
    R: UploadReader + ?Sized,
{
    let page = query.page.unwrap_or(1);
    let mut list_query = UploadListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(supplier_id) = query.supplier_id {
        list_query = list_query.supplier(supplier_id);
    }
    if let Some(status) = query.status {
        list_query = list_query.status(status);
    }

    let (total, items) = repo.list_uploads(list_query)?;
    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);

    Ok(Paginated::new(items, page, total_pages))
}

/// One upload with its row verdict counts and latest audit entry.
#[derive(Debug, Serialize, Clone)]
pub struct UploadSummary {
    pub upload: PricelistUpload,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub blocked_rows: usize,
    pub last_event: Option<AuditEvent>,
}

/// Loads one upload together with the state of its staged rows.
///
/// Rows are staged with `valid: false` until validation writes its verdicts,
/// so verdict counts stay at zero while the upload is still `received`.
pub fn get_upload_summary<R>(repo: &R, upload_id: i32) -> ServiceResult<UploadSummary>
where
    R: UploadReader + RowReader + AuditEventReader + ?Sized,
{
    let upload = repo
        .get_upload_by_id(upload_id)?
        .ok_or(ServiceError::NotFound)?;

    let (valid_rows, invalid_rows, blocked_rows) = if upload.status == UploadStatus::Received {
        (0, 0, 0)
    } else {
        let rows = repo.list_rows(upload_id)?;
        let valid = rows.iter().filter(|row| row.valid).count();
        let blocked = rows.iter().filter(|row| row.blocked).count();
        (valid, rows.len() - valid, blocked)
    };

    let last_event = repo.last_audit_event(upload_id)?;

    Ok(UploadSummary {
        upload,
        valid_rows,
        invalid_rows,
        blocked_rows,
        last_event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::row::PricelistRow;
    use crate::repository::errors::RepositoryResult;
    use crate::repository::mock::{MockAuditEventReader, MockRowReader, MockUploadReader};

    struct FakeRepo {
        upload_reader: MockUploadReader,
        row_reader: MockRowReader,
        audit: MockAuditEventReader,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                upload_reader: MockUploadReader::new(),
                row_reader: MockRowReader::new(),
                audit: MockAuditEventReader::new(),
            }
        }
    }

    impl UploadReader for FakeRepo {
        fn get_upload_by_id(&self, id: i32) -> RepositoryResult<Option<PricelistUpload>> {
            self.upload_reader.get_upload_by_id(id)
        }
        fn list_uploads(
            &self,
            query: UploadListQuery,
        ) -> RepositoryResult<(usize, Vec<PricelistUpload>)> {
            self.upload_reader.list_uploads(query)
        }
    }

    impl RowReader for FakeRepo {
        fn list_rows(&self, upload_id: i32) -> RepositoryResult<Vec<PricelistRow>> {
            self.row_reader.list_rows(upload_id)
        }
    }

    impl AuditEventReader for FakeRepo {
        fn list_audit_events_after(
            &self,
            after_id: i32,
            supplier_id: Option<i32>,
            upload_id: Option<i32>,
            limit: i64,
        ) -> RepositoryResult<Vec<AuditEvent>> {
            self.audit
                .list_audit_events_after(after_id, supplier_id, upload_id, limit)
        }
        fn last_audit_event(&self, upload_id: i32) -> RepositoryResult<Option<AuditEvent>> {
            self.audit.last_audit_event(upload_id)
        }
    }

    fn fixed_datetime() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
    }

    fn sample_upload(id: i32) -> PricelistUpload {
        PricelistUpload {
            id,
            supplier_id: 1,
            filename: "june.xlsx".to_string(),
            currency: "EUR".to_string(),
            valid_from: fixed_datetime(),
            status: UploadStatus::Merged,
            row_count: 1,
            created_at: fixed_datetime(),
            updated_at: fixed_datetime(),
        }
    }

    fn staged_row(row_num: i32, valid: bool) -> PricelistRow {
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
            valid,
            invalid_reason: None,
            blocked: false,
            blocked_reason: None,
        }
    }

    #[test]
    fn list_uploads_paginates_and_forwards_filters() {
        let mut repo = MockUploadReader::new();
        repo.expect_list_uploads()
            .times(1)
            .withf(|query| {
                assert_eq!(query.supplier_id, Some(3));
                assert_eq!(query.status, Some(UploadStatus::Merged));
                let pagination = query.pagination.as_ref().expect("pagination");
                assert_eq!(pagination.page, 2);
                true
            })
            .returning(|_| Ok((26, vec![sample_upload(9)])));

        let page = list_uploads(
            &repo,
            UploadsQuery {
                supplier_id: Some(3),
                status: Some(UploadStatus::Merged),
                page: Some(2),
            },
        )
        .expect("page");

        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn received_upload_reports_no_verdict_counts() {
        let mut repo = FakeRepo::new();
        repo.upload_reader.expect_get_upload_by_id().returning(|id| {
            let mut upload = sample_upload(id);
            upload.status = UploadStatus::Received;
            Ok(Some(upload))
        });
        // No list_rows expectation: staged rows are not counted yet.
        repo.audit
            .expect_last_audit_event()
            .returning(|_| Ok(None));

        let summary = get_upload_summary(&repo, 5).expect("summary");

        assert_eq!(summary.valid_rows, 0);
        assert_eq!(summary.invalid_rows, 0);
        assert_eq!(summary.blocked_rows, 0);
    }

    #[test]
    fn validated_upload_reports_row_verdicts() {
        let mut repo = FakeRepo::new();
        repo.upload_reader.expect_get_upload_by_id().returning(|id| {
            let mut upload = sample_upload(id);
            upload.status = UploadStatus::Validated;
            Ok(Some(upload))
        });
        repo.row_reader.expect_list_rows().returning(|_| {
            let mut blocked = staged_row(3, true);
            blocked.blocked = true;
            Ok(vec![staged_row(1, true), staged_row(2, false), blocked])
        });
        repo.audit
            .expect_last_audit_event()
            .returning(|_| Ok(None));

        let summary = get_upload_summary(&repo, 5).expect("summary");

        assert_eq!(summary.valid_rows, 2);
        assert_eq!(summary.invalid_rows, 1);
        assert_eq!(summary.blocked_rows, 1);
    }
}
