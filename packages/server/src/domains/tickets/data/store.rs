//! Ticket store contract.
//!
//! The store owns the persisted ticket records; everything above it works on
//! snapshots and proposes mutations through the single conditional-update
//! primitive. Guarding every update by the expected prior status is what
//! makes concurrent operators safe without any in-process locking: when two
//! clients race, the store accepts exactly one transition and rejects the
//! other with a stale-status error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use super::super::models::{Ticket, TicketCategory, TicketStatus};
use crate::common::TicketId;

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket {0} not found")]
    NotFound(TicketId),

    /// The conditional update found the ticket in a different status than
    /// expected. Recoverable: re-fetch and retry, or surface the conflict.
    #[error("ticket {id} is no longer {expected}")]
    StaleStatus { id: TicketId, expected: TicketStatus },

    #[error("ticket store unavailable")]
    Unavailable(#[source] anyhow::Error),
}

/// One patchable field: leave it alone, set it, or clear it.
#[derive(Debug, Clone)]
pub enum FieldPatch<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> FieldPatch<T> {
    /// Splits into (touched, new value) for SQL parameter binding.
    pub fn as_parts(&self) -> (bool, Option<&T>) {
        match self {
            FieldPatch::Keep => (false, None),
            FieldPatch::Set(value) => (true, Some(value)),
            FieldPatch::Clear => (true, None),
        }
    }
}

impl<T: Clone> FieldPatch<T> {
    /// Applies the patch to an in-memory slot.
    pub fn apply_to(&self, slot: &mut Option<T>) {
        match self {
            FieldPatch::Keep => {}
            FieldPatch::Set(value) => *slot = Some(value.clone()),
            FieldPatch::Clear => *slot = None,
        }
    }
}

/// A proposed single-record mutation. Constructed through the lifecycle
/// helpers below so each transition's effect is written down exactly once.
#[derive(Debug, Clone)]
pub struct TicketPatch {
    pub status: TicketStatus,
    pub station: FieldPatch<String>,
    pub agent: FieldPatch<String>,
    pub called_at: FieldPatch<DateTime<Utc>>,
    pub served_at: FieldPatch<DateTime<Utc>>,
}

impl TicketPatch {
    /// waiting -> calling: claim the ticket for a station and agent.
    pub fn call(station: String, agent: String, called_at: DateTime<Utc>) -> Self {
        Self {
            status: TicketStatus::Calling,
            station: FieldPatch::Set(station),
            agent: FieldPatch::Set(agent),
            called_at: FieldPatch::Set(called_at),
            served_at: FieldPatch::Keep,
        }
    }

    /// calling -> served.
    pub fn finish(served_at: DateTime<Utc>) -> Self {
        Self {
            status: TicketStatus::Served,
            station: FieldPatch::Keep,
            agent: FieldPatch::Keep,
            called_at: FieldPatch::Keep,
            served_at: FieldPatch::Set(served_at),
        }
    }

    /// calling -> waiting: back into the queue with call details cleared.
    pub fn requeue() -> Self {
        Self {
            status: TicketStatus::Waiting,
            station: FieldPatch::Clear,
            agent: FieldPatch::Clear,
            called_at: FieldPatch::Clear,
            served_at: FieldPatch::Keep,
        }
    }

    /// waiting|calling -> canceled.
    pub fn cancel() -> Self {
        Self {
            status: TicketStatus::Canceled,
            station: FieldPatch::Keep,
            agent: FieldPatch::Keep,
            called_at: FieldPatch::Keep,
            served_at: FieldPatch::Keep,
        }
    }
}

/// Advisory change feed published by stores after successful mutations.
///
/// Subscribers treat a signal purely as "re-fetch now"; the interval timer
/// remains the authoritative refresh trigger, so a dropped or lagged signal
/// costs freshness, never correctness.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<()>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: no subscribers is fine.
    pub fn publish(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Authoritative ticket storage.
///
/// `fetch_all` returns the full table ordered by `(drawn_at, id)` ascending;
/// filtering and sorting beyond that happen client-side on the snapshot. The
/// accepted design caps live tickets at a few thousand, beyond which the
/// store-scan approach degrades.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Full current snapshot, `(drawn_at, id)` ascending. Empty is valid.
    async fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Atomic create + per-category sequence allocation.
    async fn insert(&self, category: TicketCategory) -> Result<Ticket, StoreError>;

    /// The sole mutation primitive: applies `patch` only if the record's
    /// current status equals `expected`, otherwise fails with
    /// [`StoreError::StaleStatus`] and leaves the record untouched.
    async fn update_if_status(
        &self,
        id: TicketId,
        expected: TicketStatus,
        patch: TicketPatch,
    ) -> Result<Ticket, StoreError>;

    /// Advisory change notifications; see [`ChangeFeed`].
    fn subscribe(&self) -> broadcast::Receiver<()>;
}
