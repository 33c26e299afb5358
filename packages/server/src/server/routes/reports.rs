//! Report routes: the history table and its CSV download.

use axum::extract::{Extension, Query};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::domains::tickets::{ReportPeriod, Ticket};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `today` (default) or `all`.
    pub period: Option<String>,
}

fn parse_period(query: &ReportQuery) -> Result<ReportPeriod, ApiError> {
    query
        .period
        .as_deref()
        .unwrap_or("today")
        .parse()
        .map_err(ApiError)
}

/// GET /api/reports?period= - report rows, newest first, capped.
pub async fn report_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let period = parse_period(&query)?;
    let rows = state.service.report(period, &state.report_options).await?;
    Ok(Json(rows))
}

/// GET /api/reports/export?period= - the same rows as a CSV download.
pub async fn report_export_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let period = parse_period(&query)?;
    let csv = state
        .service
        .report_csv(period, &state.report_options)
        .await?;

    let filename = match period {
        ReportPeriod::Today => "report-today.csv",
        ReportPeriod::All => "report-all.csv",
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
