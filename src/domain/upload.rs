use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pagination::Pagination;

/// Lifecycle states for a pricelist upload.
///
/// Legal transitions form a fixed machine:
/// `received -> validating -> {validated, failed}` and
/// `validated -> merging -> {merged, failed}`. `merged` and `failed` are
/// terminal. Every status write goes through a guard that checks
/// [`UploadStatus::can_transition`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Upload has been staged but not yet validated.
    Received,
    /// Validation is in progress.
    Validating,
    /// At least one row passed validation; rules and merge may run.
    Validated,
    /// A merge transaction currently owns this upload.
    Merging,
    /// The upload was reconciled into the catalog.
    Merged,
    /// The upload was rejected or aborted.
    Failed,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::Merging => "merging",
            Self::Merged => "merged",
            Self::Failed => "failed",
        }
    }

    /// Whether the upload can never leave this state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Merged | Self::Failed)
    }

    /// Whether moving from `self` to `next` follows an edge of the machine.
    ///
    /// An operator may fail an upload from any non-terminal state.
    pub fn can_transition(self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        matches!(
            (self, next),
            (Received, Validating)
                | (Validating, Validated)
                | (Validated, Merging)
                | (Merging, Merged)
                | (Received, Failed)
                | (Validating, Failed)
                | (Validated, Failed)
                | (Merging, Failed)
        )
    }
}

impl From<&str> for UploadStatus {
    fn from(value: &str) -> Self {
        match value {
            "received" => Self::Received,
            "validating" => Self::Validating,
            "validated" => Self::Validated,
            "merging" => Self::Merging,
            "merged" => Self::Merged,
            // Unknown values are treated as terminal so no phase picks them up.
            _ => Self::Failed,
        }
    }
}

/// Domain representation of one pricelist ingestion attempt.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PricelistUpload {
    /// Unique identifier of the upload.
    pub id: i32,
    /// Supplier that submitted the pricelist.
    pub supplier_id: i32,
    /// Original filename as received from the decoder.
    pub filename: String,
    /// ISO 4217 currency the pricelist is denominated in.
    pub currency: String,
    /// Date from which the listed prices apply.
    pub valid_from: NaiveDateTime,
    /// Current lifecycle status.
    pub status: UploadStatus,
    /// Number of staged rows.
    pub row_count: i32,
    /// Timestamp for when the upload record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the upload record.
    pub updated_at: NaiveDateTime,
}

/// Payload required to stage a new upload.
#[derive(Debug, Clone)]
pub struct NewPricelistUpload {
    pub supplier_id: i32,
    pub filename: String,
    pub currency: String,
    pub valid_from: NaiveDateTime,
}

impl NewPricelistUpload {
    pub fn new(
        supplier_id: i32,
        filename: impl Into<String>,
        currency: impl Into<String>,
        valid_from: NaiveDateTime,
    ) -> Self {
        Self {
            supplier_id,
            filename: filename.into(),
            currency: currency.into(),
            valid_from,
        }
    }
}

/// Query definition used to filter and paginate uploads.
#[derive(Debug, Clone)]
pub struct UploadListQuery {
    /// Restrict to one supplier.
    pub supplier_id: Option<i32>,
    /// Restrict to one lifecycle status.
    pub status: Option<UploadStatus>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl Default for UploadListQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadListQuery {
    pub fn new() -> Self {
        Self {
            supplier_id: None,
            status: None,
            pagination: None,
        }
    }

    pub fn supplier(mut self, supplier_id: i32) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn status(mut self, status: UploadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::UploadStatus::*;

    #[test]
    fn machine_accepts_forward_edges() {
        assert!(Received.can_transition(Validating));
        assert!(Validating.can_transition(Validated));
        assert!(Validating.can_transition(Failed));
        assert!(Validated.can_transition(Merging));
        assert!(Merging.can_transition(Merged));
        assert!(Merging.can_transition(Failed));
    }

    #[test]
    fn machine_rejects_backward_and_skipping_edges() {
        assert!(!Validated.can_transition(Received));
        assert!(!Merged.can_transition(Validated));
        assert!(!Received.can_transition(Merged));
        assert!(!Failed.can_transition(Validating));
        assert!(!Merged.can_transition(Failed));
    }

    #[test]
    fn unknown_status_text_parses_as_failed() {
        assert_eq!(super::UploadStatus::from("garbage"), Failed);
    }
}
