//! Public display board: a JSON snapshot and an SSE stream.
//!
//! GET /api/board returns the current projection; GET /api/board/stream
//! subscribes to the board watcher's fan-out and forwards events as SSE.
//! The stream is advisory for displays the same way the change feed is for
//! the watcher: a client that misses events re-syncs on the next board
//! frame, so no authority is lost to a dropped connection.

use std::convert::Infallible;

use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, StreamExt};
use tokio_stream::wrappers::BroadcastStream;

use crate::domains::tickets::{BoardEvent, DisplayBoard, QueueStats};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// GET /api/board - current display board projection.
pub async fn board_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<DisplayBoard>, ApiError> {
    let board = state.service.board(&state.board_options).await?;
    Ok(Json(board))
}

/// GET /api/stats - queue counters for the admin console header.
pub async fn stats_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<QueueStats>, ApiError> {
    let stats = state.service.stats().await?;
    Ok(Json(stats))
}

/// GET /api/board/stream - SSE feed of board frames and grouped calls.
///
/// Event names: `connected` once on subscribe, then `board` frames, `call`
/// groups, and `lagged` when a slow client missed events.
pub async fn board_stream_handler(
    Extension(state): Extension<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.board_events.subscribe();

    let connected =
        stream::once(async { Ok::<_, Infallible>(Event::default().event("connected").data("ok")) });

    let events = BroadcastStream::new(rx).filter_map(|result| async {
        match result {
            Ok(event) => {
                let name = match &event {
                    BoardEvent::Board(_) => "board",
                    BoardEvent::Call(_) => "call",
                };
                Event::default().event(name).json_data(&event).ok().map(Ok)
            }
            Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
                Event::default()
                    .event("lagged")
                    .json_data(&serde_json::json!({ "missed": n }))
                    .ok()
                    .map(Ok)
            }
        }
    });

    Sse::new(connected.chain(events)).keep_alive(KeepAlive::default())
}
