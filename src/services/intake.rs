use log::info;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::domain::audit::NewAuditEvent;
use crate::domain::row::{NewPricelistRow, RawRow};
use crate::domain::upload::{NewPricelistUpload, PricelistUpload};
use crate::repository::{EventRecorder, SupplierReader, UploadWriter};
use crate::services::{ServiceError, ServiceResult, record_best_effort};

/// Everything the intake boundary needs to stage one pricelist.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IntakeRequest {
    pub supplier_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    /// ISO 4217 code the sheet is denominated in.
    #[validate(length(equal = 3))]
    pub currency: String,
    pub valid_from: chrono::NaiveDateTime,
    pub rows: Vec<RawRow>,
}

/// Stages an uploaded pricelist: parses prices, assigns row numbers and
/// persists the upload in `received` state.
pub fn create_upload<R>(repo: &R, request: IntakeRequest) -> ServiceResult<PricelistUpload>
where
    R: SupplierReader + UploadWriter + EventRecorder + ?Sized,
{
    request
        .validate()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if request.rows.is_empty() {
        return Err(ServiceError::EmptyUpload);
    }

    let supplier = repo
        .get_supplier_by_id(request.supplier_id)?
        .ok_or(ServiceError::UnknownSupplier(request.supplier_id))?;
    if !supplier.is_active {
        return Err(ServiceError::Form(format!(
            "supplier {} is inactive",
            supplier.id
        )));
    }

    let new_upload = NewPricelistUpload::new(
        supplier.id,
        request.filename.clone(),
        request.currency.clone(),
        request.valid_from,
    );

    let rows: Vec<NewPricelistRow> = request
        .rows
        .iter()
        .enumerate()
        .map(|(index, raw)| stage_row(index as i32 + 1, raw, &request.currency))
        .collect();

    let upload = repo.create_upload(&new_upload, &rows)?;

    info!(
        "upload {} received from supplier {} with {} rows",
        upload.id, supplier.id, upload.row_count
    );
    record_best_effort(
        repo,
        NewAuditEvent::new("upload_received", "completed")
            .supplier(supplier.id)
            .upload(upload.id)
            .details(json!({
                "filename": upload.filename,
                "rows": upload.row_count,
            })),
    );

    Ok(upload)
}

fn stage_row(row_num: i32, raw: &RawRow, upload_currency: &str) -> NewPricelistRow {
    // An unparsable price is staged anyway so the validator can report it.
    let price_cents = parse_price_cents(&raw.price).unwrap_or(-1);
    let currency = raw
        .currency
        .clone()
        .unwrap_or_else(|| upload_currency.to_string());

    NewPricelistRow {
        row_num,
        supplier_sku: raw.supplier_sku.clone(),
        name: raw.name.clone(),
        brand: raw.brand.clone(),
        uom: raw.uom.clone(),
        pack_size: raw.pack_size.clone(),
        price_cents,
        currency,
        category_raw: raw.category_raw.clone(),
        vat_code: raw.vat_code.clone(),
        barcode: raw.barcode.clone(),
        qty: raw.qty,
        attrs: raw.attrs.clone(),
    }
}

/// Lenient decimal-text to cents conversion.
///
/// Accepts `"12.34"`, `"1 234,56"`, `"1.234"` (thousands) and similar
/// supplier formats. The rightmost `.` or `,` counts as the decimal
/// separator when it is followed by one or two digits; every other
/// separator is treated as grouping.
pub fn parse_price_cents(text: &str) -> Option<i64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\'')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match cleaned.rfind(['.', ',']) {
        Some(pos) => {
            let frac = &cleaned[pos + 1..];
            if (1..=2).contains(&frac.len()) && frac.bytes().all(|b| b.is_ascii_digit()) {
                (cleaned[..pos].to_string(), frac.to_string())
            } else {
                (cleaned.clone(), String::new())
            }
        }
        None => (cleaned.clone(), String::new()),
    };

    let digits: String = int_part.chars().filter(|c| *c != '.' && *c != ',').collect();
    if digits.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = if digits.is_empty() {
        0
    } else {
        digits.parse().ok()?
    };
    let cents = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().ok()? * 10,
        _ => frac_part.parse::<i64>().ok()?,
    };

    Some(whole * 100 + cents)
}
