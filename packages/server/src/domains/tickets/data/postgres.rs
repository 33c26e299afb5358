//! PostgreSQL-backed ticket store.
//!
//! Sequence numbers come from a per-category counter row bumped with an
//! upsert, so concurrent draws serialize on that row and numbers are never
//! reused. The conditional update is a single `UPDATE ... WHERE id AND
//! status` statement; a zero-row result is disambiguated into not-found vs
//! stale-status with a follow-up lookup.

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::broadcast;

use super::store::{ChangeFeed, StoreError, TicketPatch, TicketStore};
use crate::common::TicketId;
use crate::domains::tickets::models::{Ticket, TicketCategory, TicketStatus};

const TICKET_COLUMNS: &str =
    "id, number, category, status, station, agent, drawn_at, called_at, served_at";

pub struct PgTicketStore {
    pool: PgPool,
    changes: ChangeFeed,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            changes: ChangeFeed::new(),
        }
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.into())
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn fetch_all(&self) -> Result<Vec<Ticket>, StoreError> {
        sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY drawn_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn insert(&self, category: TicketCategory) -> Result<Ticket, StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        // Upserting the counter row serializes concurrent draws per category
        let number: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO ticket_counters (category, last_number)
            VALUES ($1, 1)
            ON CONFLICT (category)
            DO UPDATE SET last_number = ticket_counters.last_number + 1
            RETURNING last_number
            "#,
        )
        .bind(category)
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable)?;

        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (id, number, category, status, drawn_at)
            VALUES ($1, $2, $3, 'waiting', now())
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(TicketId::new())
        .bind(number)
        .bind(category)
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        self.changes.publish();
        Ok(ticket)
    }

    async fn update_if_status(
        &self,
        id: TicketId,
        expected: TicketStatus,
        patch: TicketPatch,
    ) -> Result<Ticket, StoreError> {
        let (touch_station, station) = patch.station.as_parts();
        let (touch_agent, agent) = patch.agent.as_parts();
        let (touch_called, called_at) = patch.called_at.as_parts();
        let (touch_served, served_at) = patch.served_at.as_parts();

        let updated = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets
            SET status    = $3,
                station   = CASE WHEN $4 THEN $5::text ELSE station END,
                agent     = CASE WHEN $6 THEN $7::text ELSE agent END,
                called_at = CASE WHEN $8 THEN $9::timestamptz ELSE called_at END,
                served_at = CASE WHEN $10 THEN $11::timestamptz ELSE served_at END
            WHERE id = $1 AND status = $2
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected)
        .bind(patch.status)
        .bind(touch_station)
        .bind(station.cloned())
        .bind(touch_agent)
        .bind(agent.cloned())
        .bind(touch_called)
        .bind(called_at.copied())
        .bind(touch_served)
        .bind(served_at.copied())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match updated {
            Some(ticket) => {
                self.changes.publish();
                Ok(ticket)
            }
            // Zero rows: either the ticket is gone or another operator won
            None => {
                let exists: Option<TicketStatus> =
                    sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(unavailable)?;

                match exists {
                    Some(_) => Err(StoreError::StaleStatus { id, expected }),
                    None => Err(StoreError::NotFound(id)),
                }
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }
}
