//! Ticket service: orchestrates the queue policy against the store.
//!
//! Every operation re-fetches a snapshot where it needs one and issues at
//! most one conditional update; no state is held between calls. Errors are
//! typed so the HTTP layer can translate them without string matching.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use super::data::{StoreError, TicketPatch, TicketStore};
use super::export;
use super::models::{Ticket, TicketCategory, TicketStatus};
use super::policy;
use super::views::{BoardOptions, DisplayBoard, QueueStats};
use crate::common::TicketId;

/// How often a snapshot read is retried before giving up. Writes are never
/// auto-retried; their conflicts carry meaning.
const FETCH_ATTEMPTS: u32 = 3;
const FETCH_RETRY_DELAY: StdDuration = StdDuration::from_millis(100);

/// Failures surfaced to callers of the ticket service.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Bad input, rejected before any store traffic. Correct and retry.
    #[error("{0}")]
    Validation(String),

    /// No ticket is waiting. An expected outcome, not a fault.
    #[error("no tickets waiting")]
    EmptyQueue,

    #[error("ticket {0} not found")]
    UnknownTicket(TicketId),

    /// The ticket changed under us (another operator got there first).
    /// Re-fetch and retry, or tell the operator the ticket is gone.
    #[error("ticket is no longer in the expected state")]
    Conflict,

    #[error("ticket store unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl From<StoreError> for TicketError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TicketError::UnknownTicket(id),
            StoreError::StaleStatus { .. } => TicketError::Conflict,
            StoreError::Unavailable(source) => TicketError::StoreUnavailable(source),
        }
    }
}

/// Report period filter, from the reports page dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Today,
    All,
}

impl FromStr for ReportPeriod {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(ReportPeriod::Today),
            "all" => Ok(ReportPeriod::All),
            _ => Err(TicketError::Validation(format!(
                "invalid report period: {s}"
            ))),
        }
    }
}

/// Report tunables, from configuration.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Maximum rows returned; the store-scan design caps live data anyway.
    pub row_cap: usize,
    /// Timezone used for the "today" cutoff and exported timestamps.
    pub timezone: FixedOffset,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            row_cap: 2000,
            timezone: Utc.fix(),
        }
    }
}

pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Advisory change feed, forwarded from the store.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.store.subscribe()
    }

    /// Full snapshot with a bounded retry on store failure. Display callers
    /// that can show stale data should prefer swallowing the error instead.
    pub async fn snapshot(&self) -> Result<Vec<Ticket>, TicketError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.fetch_all().await {
                Ok(tickets) => return Ok(tickets),
                Err(StoreError::Unavailable(source)) if attempt < FETCH_ATTEMPTS => {
                    tracing::warn!(attempt, error = %source, "snapshot fetch failed, retrying");
                    tokio::time::sleep(FETCH_RETRY_DELAY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Draw a new ticket: created waiting, with the next number in its
    /// category's sequence.
    pub async fn draw(&self, category: TicketCategory) -> Result<Ticket, TicketError> {
        let ticket = self.store.insert(category).await?;
        tracing::info!(id = %ticket.id, code = %ticket.code(), "ticket drawn");
        Ok(ticket)
    }

    /// Call the next ticket in selection order to a station.
    ///
    /// The selection and the claim are separate steps on purpose: the claim
    /// is guarded by the expected `waiting` status, so when two operators
    /// race for the same ticket exactly one wins and the other gets
    /// [`TicketError::Conflict`].
    pub async fn call_next(&self, station: &str, agent: &str) -> Result<Ticket, TicketError> {
        let station = station.trim();
        let agent = agent.trim();
        if station.is_empty() || agent.is_empty() {
            return Err(TicketError::Validation(
                "station and agent are required".to_string(),
            ));
        }

        let snapshot = self.snapshot().await?;
        let next = policy::select_next(&snapshot).ok_or(TicketError::EmptyQueue)?;

        let patch = TicketPatch::call(station.to_string(), agent.to_string(), Utc::now());
        let ticket = self
            .store
            .update_if_status(next.id, TicketStatus::Waiting, patch)
            .await?;

        tracing::info!(id = %ticket.id, code = %ticket.code(), station, agent, "ticket called");
        Ok(ticket)
    }

    /// Finish serving a called ticket.
    pub async fn finish(&self, id: TicketId) -> Result<Ticket, TicketError> {
        let ticket = self
            .store
            .update_if_status(id, TicketStatus::Calling, TicketPatch::finish(Utc::now()))
            .await?;

        tracing::info!(id = %ticket.id, code = %ticket.code(), "ticket served");
        Ok(ticket)
    }

    /// Return a called ticket to the queue, clearing its call details. The
    /// original draw time is kept, so the ticket keeps its place in line.
    pub async fn requeue(&self, id: TicketId) -> Result<Ticket, TicketError> {
        let ticket = self
            .store
            .update_if_status(id, TicketStatus::Calling, TicketPatch::requeue())
            .await?;

        tracing::info!(id = %ticket.id, code = %ticket.code(), "ticket requeued");
        Ok(ticket)
    }

    /// Cancel a waiting or calling ticket.
    ///
    /// The store's conditional update guards one expected status at a time,
    /// so the two allowed prior states are tried in order; losing both races
    /// means the ticket already reached a terminal state.
    pub async fn cancel(&self, id: TicketId) -> Result<Ticket, TicketError> {
        match self
            .store
            .update_if_status(id, TicketStatus::Waiting, TicketPatch::cancel())
            .await
        {
            Ok(ticket) => {
                tracing::info!(id = %ticket.id, code = %ticket.code(), "ticket canceled");
                Ok(ticket)
            }
            Err(StoreError::StaleStatus { .. }) => {
                let ticket = self
                    .store
                    .update_if_status(id, TicketStatus::Calling, TicketPatch::cancel())
                    .await?;
                tracing::info!(id = %ticket.id, code = %ticket.code(), "ticket canceled");
                Ok(ticket)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Project the public display board from a fresh snapshot.
    pub async fn board(&self, options: &BoardOptions) -> Result<DisplayBoard, TicketError> {
        let snapshot = self.snapshot().await?;
        Ok(DisplayBoard::project(&snapshot, Utc::now(), options))
    }

    /// Queue counters for the admin console.
    pub async fn stats(&self) -> Result<QueueStats, TicketError> {
        let snapshot = self.snapshot().await?;
        Ok(QueueStats::project(&snapshot))
    }

    /// Report rows: newest first, optionally restricted to today (in the
    /// configured report timezone), capped at the configured row limit.
    pub async fn report(
        &self,
        period: ReportPeriod,
        options: &ReportOptions,
    ) -> Result<Vec<Ticket>, TicketError> {
        let snapshot = self.snapshot().await?;

        let cutoff: Option<DateTime<Utc>> = match period {
            ReportPeriod::All => None,
            ReportPeriod::Today => {
                let local_now = Utc::now().with_timezone(&options.timezone);
                let midnight = local_now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|naive| naive.and_local_timezone(options.timezone).single());
                midnight.map(|m| m.with_timezone(&Utc))
            }
        };

        let mut rows: Vec<Ticket> = snapshot
            .into_iter()
            .filter(|t| cutoff.map_or(true, |c| t.drawn_at >= c))
            .collect();
        rows.sort_by(|a, b| b.drawn_at.cmp(&a.drawn_at).then_with(|| b.id.cmp(&a.id)));
        rows.truncate(options.row_cap);

        Ok(rows)
    }

    /// CSV export of a report. Empty reports are rejected so the caller can
    /// tell the operator there is nothing to download.
    pub async fn report_csv(
        &self,
        period: ReportPeriod,
        options: &ReportOptions,
    ) -> Result<String, TicketError> {
        let rows = self.report(period, options).await?;
        if rows.is_empty() {
            return Err(TicketError::Validation(
                "no report rows to export".to_string(),
            ));
        }
        Ok(export::report_csv(&rows, options.timezone))
    }
}
