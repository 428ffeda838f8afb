use std::collections::HashMap;

use log::info;
use serde::Serialize;
use serde_json::json;

use crate::MAX_REPORTED_ERRORS;
use crate::domain::audit::NewAuditEvent;
use crate::domain::row::{PricelistRow, RowValidity};
use crate::domain::upload::UploadStatus;
use crate::repository::{EventRecorder, RowReader, RowWriter, UploadReader, UploadWriter};
use crate::services::{ServiceError, ServiceResult, record_best_effort};

/// Aggregate result of one validation pass.
#[derive(Debug, Serialize, Clone)]
pub struct ValidationSummary {
    pub upload_id: i32,
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// First few row-level reasons, capped so huge sheets stay reportable.
    pub errors: Vec<String>,
}

/// Validates every staged row of an upload and moves the upload to
/// `validated` or `failed`.
///
/// Re-running validation on an already validated upload is allowed; the
/// verdicts are simply recomputed.
pub fn validate_upload<R>(repo: &R, upload_id: i32) -> ServiceResult<ValidationSummary>
where
    R: UploadReader + UploadWriter + RowReader + RowWriter + EventRecorder + ?Sized,
{
    let upload = repo
        .get_upload_by_id(upload_id)?
        .ok_or(ServiceError::NotFound)?;

    let upload = match upload.status {
        UploadStatus::Received => {
            repo.set_upload_status(upload_id, UploadStatus::Received, UploadStatus::Validating)?
        }
        UploadStatus::Validating | UploadStatus::Validated => upload,
        status => {
            return Err(ServiceError::InvalidState {
                action: "validate",
                status,
            });
        }
    };

    let rows = repo.list_rows(upload_id)?;
    let verdicts = check_rows(&rows);
    repo.set_row_validity(upload_id, &verdicts)?;

    let valid_count = verdicts.iter().filter(|verdict| verdict.valid).count();
    let invalid_count = verdicts.len() - valid_count;
    let errors: Vec<String> = verdicts
        .iter()
        .filter_map(|verdict| {
            verdict
                .reason
                .as_ref()
                .map(|reason| format!("row {}: {reason}", verdict.row_num))
        })
        .take(MAX_REPORTED_ERRORS)
        .collect();

    // An upload with no usable rows is dead; anything else may proceed.
    let final_status = if valid_count > 0 {
        UploadStatus::Validated
    } else {
        UploadStatus::Failed
    };
    if upload.status != final_status {
        repo.set_upload_status(upload_id, upload.status, final_status)?;
    }

    info!(
        "upload {upload_id} validated: {valid_count} valid, {invalid_count} invalid, now {}",
        final_status.as_str()
    );
    record_best_effort(
        repo,
        NewAuditEvent::new(
            "validation_finished",
            if valid_count > 0 { "completed" } else { "failed" },
        )
        .supplier(upload.supplier_id)
        .upload(upload_id)
        .details(json!({
            "total": verdicts.len(),
            "valid": valid_count,
            "invalid": invalid_count,
        })),
    );

    Ok(ValidationSummary {
        upload_id,
        total: verdicts.len(),
        valid_count,
        invalid_count,
        errors,
    })
}

/// Pure per-row checks. Duplicate SKUs are resolved first-wins.
fn check_rows(rows: &[PricelistRow]) -> Vec<RowValidity> {
    let mut first_seen: HashMap<&str, i32> = HashMap::new();

    rows.iter()
        .map(|row| {
            let reason = check_row(row).or_else(|| {
                match first_seen.get(row.supplier_sku.as_str()).copied() {
                    Some(first) => Some(format!("duplicate of row {first}")),
                    None => {
                        first_seen.insert(row.supplier_sku.as_str(), row.row_num);
                        None
                    }
                }
            });
            RowValidity {
                row_num: row.row_num,
                valid: reason.is_none(),
                reason,
            }
        })
        .collect()
}

fn check_row(row: &PricelistRow) -> Option<String> {
    if row.supplier_sku.trim().is_empty() {
        return Some("missing supplier sku".to_string());
    }
    if row.name.trim().is_empty() {
        return Some("missing name".to_string());
    }
    if row.price_cents < 0 {
        return Some("unparsable price".to_string());
    }
    if row.currency.len() != 3 || !row.currency.bytes().all(|b| b.is_ascii_uppercase()) {
        return Some(format!("invalid currency {:?}", row.currency));
    }
    None
}
