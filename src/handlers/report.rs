use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::{NewReport, Report, ReportStatus};
use crate::error::RpcError;
use crate::rpc::{FieldErrors, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    pub report_type: String,
    pub encrypted_content: String,
    pub is_anonymous: Option<bool>,
}

impl Validate for CreateReportInput {
    fn validate(&self) -> Result<(), RpcError> {
        let mut errors = FieldErrors::new();
        errors.required("reportType", &self.report_type, 100);
        if self.encrypted_content.trim().is_empty() {
            errors.add("encryptedContent", "This field is required");
        }
        errors.finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListReportsInput {
    pub status: Option<ReportStatus>,
}

impl Validate for ListReportsInput {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportStatusInput {
    pub report_id: i32,
    pub status: ReportStatus,
    pub notes: Option<String>,
}

impl Validate for UpdateReportStatusInput {}

/// report.create - anonymous reports keep no reference to their author
pub async fn create(state: AppState, ctx: RequestContext, input: CreateReportInput) -> Result<Report, RpcError> {
    let author = ctx.require_user()?;
    let report = NewReport::submitted_by(
        author,
        input.report_type.trim().to_string(),
        input.encrypted_content,
        input.is_anonymous.unwrap_or(false),
    );

    let report = state.store.create_report(report).await?;
    if report.is_anonymous {
        tracing::info!(report_id = report.id, "Anonymous report submitted");
    } else {
        tracing::info!(report_id = report.id, user_id = author.id, "Report submitted");
    }
    Ok(report)
}

/// report.list - all reports or those in one status, newest first
pub async fn list(state: AppState, _ctx: RequestContext, input: ListReportsInput) -> Result<Vec<Report>, RpcError> {
    Ok(state.store.list_reports(input.status).await?)
}

/// report.updateStatus - the caller is recorded as reviewer
pub async fn update_status(
    state: AppState,
    ctx: RequestContext,
    input: UpdateReportStatusInput,
) -> Result<Report, RpcError> {
    let reviewer = ctx.require_user()?;
    let report = state
        .store
        .update_report_status(input.report_id, input.status, reviewer.id, input.notes)
        .await?
        .ok_or_else(|| RpcError::not_found(format!("Report {} not found", input.report_id)))?;

    tracing::info!(
        report_id = report.id,
        reviewer_id = reviewer.id,
        status = ?report.status,
        "Report status updated"
    );
    Ok(report)
}
