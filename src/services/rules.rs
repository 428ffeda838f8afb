use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::PIPELINE_TRIGGER_EVENT;
use crate::domain::audit::NewAuditEvent;
use crate::domain::row::RowUpdate;
use crate::domain::rule::{RowDraft, SupplierRule};
use crate::domain::rule_execution::{NewSupplierRuleExecution, RowSnapshot};
use crate::domain::upload::UploadStatus;
use crate::repository::{
    EventRecorder, RowReader, RowWriter, RuleExecutionReader, RuleExecutionWriter, RuleReader,
    UploadReader,
};
use crate::services::{ServiceError, ServiceResult, record_best_effort};

/// Aggregate result of one rule-engine pass.
#[derive(Debug, Serialize, Clone)]
pub struct RuleRunSummary {
    pub upload_id: i32,
    pub rules_run: usize,
    pub rows_blocked: usize,
    pub warnings: Vec<String>,
}

/// Runs the supplier's active rules, in order, over the valid unblocked rows
/// of a validated upload.
///
/// Each rule produces one execution record with before and after snapshots.
/// A panicking rule never takes the pipeline down: the affected row passes
/// unchanged, or is blocked when the rule is configured fail-closed. Rows a
/// rule vetoes drop out of the working set for the rules after it.
///
/// The pass runs at most once per upload. Transformations are written back
/// onto the staged rows, so a second pass would compound every price rule;
/// an upload whose execution log is non-empty is refused instead.
pub fn run_rules<R>(repo: &R, upload_id: i32) -> ServiceResult<RuleRunSummary>
where
    R: UploadReader
        + RowReader
        + RowWriter
        + RuleReader
        + RuleExecutionReader
        + RuleExecutionWriter
        + EventRecorder
        + ?Sized,
{
    let upload = repo
        .get_upload_by_id(upload_id)?
        .ok_or(ServiceError::NotFound)?;
    if upload.status != UploadStatus::Validated {
        return Err(ServiceError::InvalidState {
            action: "run rules on",
            status: upload.status,
        });
    }
    if !repo.list_executions(upload_id)?.is_empty() {
        return Err(ServiceError::RulesAlreadyRan(upload_id));
    }

    let rules = repo.list_active_rules(upload.supplier_id)?;
    let rows = repo.list_rows(upload_id)?;

    let mut drafts: Vec<RowDraft> = rows
        .iter()
        .filter(|row| row.is_mergeable())
        .map(RowDraft::from)
        .collect();
    let mut blocked_rows: Vec<(RowDraft, String)> = Vec::new();
    let mut all_warnings: Vec<String> = Vec::new();

    for rule in &rules {
        let (newly_blocked, warnings) = run_one_rule(repo, upload_id, rule, &mut drafts)?;
        all_warnings.extend(warnings);
        blocked_rows.extend(newly_blocked);
    }

    if !rules.is_empty() {
        let updates: Vec<RowUpdate> = drafts
            .iter()
            .map(|draft| row_update(draft, None))
            .chain(
                blocked_rows
                    .iter()
                    .map(|(draft, reason)| row_update(draft, Some(reason.clone()))),
            )
            .collect();
        repo.apply_rule_outcomes(upload_id, &updates)?;
    }

    info!(
        "upload {upload_id}: {} rules run, {} rows blocked",
        rules.len(),
        blocked_rows.len()
    );
    record_best_effort(
        repo,
        NewAuditEvent::new("rules_finished", "completed")
            .supplier(upload.supplier_id)
            .upload(upload_id)
            .details(json!({
                "rules_run": rules.len(),
                "rows_blocked": blocked_rows.len(),
                "warnings": all_warnings.len(),
            })),
    );

    Ok(RuleRunSummary {
        upload_id,
        rules_run: rules.len(),
        rows_blocked: blocked_rows.len(),
        warnings: all_warnings,
    })
}

/// Applies one rule to the working set, records its execution and removes
/// the rows it blocked. Returns the blocked rows and the warnings raised.
fn run_one_rule<R>(
    repo: &R,
    upload_id: i32,
    rule: &SupplierRule,
    drafts: &mut Vec<RowDraft>,
) -> ServiceResult<(Vec<(RowDraft, String)>, Vec<String>)>
where
    R: RuleExecutionWriter + ?Sized,
{
    let started = Instant::now();
    let rows_in = drafts.len();
    let input_snapshot: Vec<RowSnapshot> = drafts
        .iter()
        .map(|draft| RowSnapshot::capture(draft, false))
        .collect();

    let mut success = true;
    let mut warnings: Vec<String> = Vec::new();
    let mut blocked: Vec<(RowDraft, String)> = Vec::new();

    for draft in drafts.iter_mut() {
        let candidate = draft.clone();
        let config = rule.config.clone();
        match catch_unwind(AssertUnwindSafe(move || {
            let mut row = candidate;
            let outcome = config.apply(&mut row);
            (row, outcome)
        })) {
            Ok((updated, outcome)) => {
                warnings.extend(outcome.warnings);
                if let Some(reason) = outcome.blocked {
                    blocked.push((updated.clone(), reason));
                }
                *draft = updated;
            }
            Err(_) => {
                success = false;
                warn!(
                    "upload {upload_id}: rule {} panicked on row {}",
                    rule.rule_name, draft.row_num
                );
                if rule.fail_closed {
                    blocked.push((
                        draft.clone(),
                        format!("rule {} failed", rule.rule_name),
                    ));
                } else {
                    warnings.push(format!(
                        "row {}: rule {} failed, row passed unchanged",
                        draft.row_num, rule.rule_name
                    ));
                }
            }
        }
    }

    let output_snapshot: Vec<RowSnapshot> = drafts
        .iter()
        .map(|draft| {
            let is_blocked = blocked.iter().any(|(b, _)| b.row_num == draft.row_num);
            RowSnapshot::capture(draft, is_blocked)
        })
        .collect();

    repo.record_execution(&NewSupplierRuleExecution {
        rule_id: rule.id,
        upload_id,
        supplier_id: rule.supplier_id,
        rule_name: rule.rule_name.clone(),
        rule_type: rule.config.rule_type().to_string(),
        execution_order: rule.execution_order,
        trigger_event: PIPELINE_TRIGGER_EVENT.to_string(),
        success,
        blocked: !blocked.is_empty(),
        input_snapshot,
        output_snapshot,
        warnings: warnings.clone(),
        rows_affected: rows_in as i32,
        execution_time_ms: started.elapsed().as_millis() as i64,
    })?;

    drafts.retain(|draft| !blocked.iter().any(|(b, _)| b.row_num == draft.row_num));

    Ok((blocked, warnings))
}

fn row_update(draft: &RowDraft, blocked_reason: Option<String>) -> RowUpdate {
    RowUpdate {
        row_num: draft.row_num,
        supplier_sku: draft.supplier_sku.clone(),
        name: draft.name.clone(),
        price_cents: draft.price_cents,
        currency: draft.currency.clone(),
        category_mapped: draft.category_mapped.clone(),
        attrs: draft.attrs.clone(),
        blocked: blocked_reason.is_some(),
        blocked_reason,
    }
}
