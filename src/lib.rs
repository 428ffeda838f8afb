pub mod db;
pub mod domain;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod schema;
pub mod services;

/// Trigger event recorded on rule executions produced by the pipeline.
pub const PIPELINE_TRIGGER_EVENT: &str = "pricelist_upload";

/// Upper bound on per-row error reasons carried in a validation summary.
pub const MAX_REPORTED_ERRORS: usize = 20;

/// Stock location used when the caller does not name one.
pub const DEFAULT_LOCATION_ID: i32 = 1;
