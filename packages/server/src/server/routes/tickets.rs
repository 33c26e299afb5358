//! Ticket lifecycle routes: the draw kiosk and the attendant console.

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;

use crate::common::TicketId;
use crate::domains::tickets::{Ticket, TicketCategory};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, serde::Deserialize)]
pub struct DrawRequest {
    pub category: TicketCategory,
}

/// POST /api/tickets - draw a new ticket.
///
/// The category arrives as its wire name (`normal`, `priority`, `owner`,
/// `check-in`, `check-out`, `guest`); anything else fails deserialization
/// before reaching the queue.
pub async fn draw_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<DrawRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let ticket = state.service.draw(request.category).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/tickets - the full snapshot, drawn-at ascending (admin console).
pub async fn list_tickets_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let snapshot = state.service.snapshot().await?;
    Ok(Json(snapshot))
}

#[derive(Debug, serde::Deserialize)]
pub struct CallRequest {
    pub station: String,
    pub agent: String,
}

/// POST /api/calls - call the next ticket in selection order to a station.
pub async fn call_next_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CallRequest>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state
        .service
        .call_next(&request.station, &request.agent)
        .await?;
    Ok(Json(ticket))
}

/// POST /api/tickets/:id/finish
pub async fn finish_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.service.finish(id).await?;
    Ok(Json(ticket))
}

/// POST /api/tickets/:id/requeue - send a called ticket back to the queue.
pub async fn requeue_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.service.requeue(id).await?;
    Ok(Json(ticket))
}

/// POST /api/tickets/:id/cancel
pub async fn cancel_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<TicketId>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.service.cancel(id).await?;
    Ok(Json(ticket))
}
