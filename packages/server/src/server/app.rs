//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::tickets::{
    BoardEvent, BoardOptions, BoardWatcher, LogAnnouncer, PgTicketStore, ReportOptions,
    TicketService,
};
use crate::server::routes::{
    board_handler, board_stream_handler, call_next_handler, cancel_handler, draw_handler,
    finish_handler, health_handler, list_tickets_handler, report_export_handler, report_handler,
    requeue_handler, stats_handler,
};

/// Capacity of the board event fan-out; slow SSE clients see a lagged event
/// and pick up from the next board frame.
const BOARD_EVENT_CAPACITY: usize = 32;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub service: Arc<TicketService>,
    pub board_events: broadcast::Sender<BoardEvent>,
    pub board_options: BoardOptions,
    pub report_options: ReportOptions,
}

/// Build the Axum application router plus the board watcher that keeps
/// display clients fresh. The watcher is returned unspawned so callers (and
/// tests) decide where it runs.
pub fn build_app(pool: PgPool, config: &Config, report_options: ReportOptions) -> (Router, BoardWatcher) {
    let store = Arc::new(PgTicketStore::new(pool.clone()));
    let service = Arc::new(TicketService::new(store));

    let board_options = BoardOptions {
        served_window: chrono::Duration::seconds(config.served_window_secs),
        next_up_limit: config.next_up_limit,
    };

    let (board_events, _) = broadcast::channel(BOARD_EVENT_CAPACITY);

    let watcher = BoardWatcher::new(
        service.clone(),
        Arc::new(LogAnnouncer),
        board_events.clone(),
        board_options.clone(),
        Duration::from_millis(config.board_refresh_ms),
        config.announcements_enabled,
    );

    let state = AppState {
        db_pool: pool,
        service,
        board_events,
        board_options,
        report_options,
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/tickets", post(draw_handler).get(list_tickets_handler))
        .route("/api/tickets/:id/finish", post(finish_handler))
        .route("/api/tickets/:id/requeue", post(requeue_handler))
        .route("/api/tickets/:id/cancel", post(cancel_handler))
        .route("/api/calls", post(call_next_handler))
        .route("/api/board", get(board_handler))
        .route("/api/board/stream", get(board_stream_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/reports", get(report_handler))
        .route("/api/reports/export", get(report_export_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        // Kiosk and display clients are served from other origins
        .layer(CorsLayer::permissive());

    (router, watcher)
}
