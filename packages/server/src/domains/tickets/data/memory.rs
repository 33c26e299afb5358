//! In-memory ticket store for tests and local demos.
//!
//! Same observable contract as the PostgreSQL store: per-category sequence
//! allocation, `(drawn_at, id)` snapshot ordering, and a conditional update
//! that accepts exactly one of two racing transitions (the whole mutation
//! runs under one lock, so check-and-apply is atomic).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};

use super::store::{ChangeFeed, StoreError, TicketPatch, TicketStore};
use crate::common::TicketId;
use crate::domains::tickets::models::{Ticket, TicketCategory, TicketStatus};

#[derive(Default)]
struct Inner {
    tickets: Vec<Ticket>,
    counters: HashMap<TicketCategory, i32>,
}

pub struct InMemoryTicketStore {
    inner: Mutex<Inner>,
    changes: ChangeFeed,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            changes: ChangeFeed::new(),
        }
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.inner.lock().await;
        let mut tickets = inner.tickets.clone();
        tickets.sort_by(|a, b| a.drawn_at.cmp(&b.drawn_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tickets)
    }

    async fn insert(&self, category: TicketCategory) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock().await;

        let number = inner.counters.entry(category).or_insert(0);
        *number += 1;

        let ticket = Ticket {
            id: TicketId::new(),
            number: *number,
            category,
            status: TicketStatus::Waiting,
            station: None,
            agent: None,
            drawn_at: Utc::now(),
            called_at: None,
            served_at: None,
        };
        inner.tickets.push(ticket.clone());
        drop(inner);

        self.changes.publish();
        Ok(ticket)
    }

    async fn update_if_status(
        &self,
        id: TicketId,
        expected: TicketStatus,
        patch: TicketPatch,
    ) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock().await;

        let ticket = inner
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if ticket.status != expected {
            return Err(StoreError::StaleStatus { id, expected });
        }

        ticket.status = patch.status;
        patch.station.apply_to(&mut ticket.station);
        patch.agent.apply_to(&mut ticket.agent);
        patch.called_at.apply_to(&mut ticket.called_at);
        patch.served_at.apply_to(&mut ticket.served_at);

        let updated = ticket.clone();
        drop(inner);

        self.changes.publish();
        Ok(updated)
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn numbers_increase_per_category_independently() {
        let store = InMemoryTicketStore::new();

        let n1 = store.insert(TicketCategory::Normal).await.unwrap();
        let n2 = store.insert(TicketCategory::Normal).await.unwrap();
        let p1 = store.insert(TicketCategory::Priority).await.unwrap();

        assert_eq!(n1.number, 1);
        assert_eq!(n2.number, 2);
        assert_eq!(p1.number, 1);
    }

    #[tokio::test]
    async fn conditional_update_rejects_stale_status() {
        let store = InMemoryTicketStore::new();
        let ticket = store.insert(TicketCategory::Normal).await.unwrap();

        let patch = TicketPatch::call("1".into(), "dana".into(), Utc::now());
        store
            .update_if_status(ticket.id, TicketStatus::Waiting, patch.clone())
            .await
            .unwrap();

        // Second claim sees calling, not waiting
        let err = store
            .update_if_status(ticket.id, TicketStatus::Waiting, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleStatus { .. }));
    }

    #[tokio::test]
    async fn rejected_update_leaves_the_record_untouched() {
        let store = InMemoryTicketStore::new();
        let ticket = store.insert(TicketCategory::Normal).await.unwrap();

        let err = store
            .update_if_status(ticket.id, TicketStatus::Calling, TicketPatch::finish(Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleStatus { .. }));

        let snapshot = store.fetch_all().await.unwrap();
        assert_eq!(snapshot[0].status, TicketStatus::Waiting);
        assert!(snapshot[0].served_at.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryTicketStore::new();
        let err = store
            .update_if_status(TicketId::new(), TicketStatus::Waiting, TicketPatch::cancel())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn mutations_publish_change_signals() {
        let store = InMemoryTicketStore::new();
        let mut rx = store.subscribe();

        store.insert(TicketCategory::Guest).await.unwrap();
        assert!(rx.try_recv().is_ok());
    }
}
