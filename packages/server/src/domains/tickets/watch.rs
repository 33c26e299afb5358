//! Display board watcher.
//!
//! A background task that keeps the public board fresh: it re-projects the
//! board whenever the store signals a change OR a fixed interval elapses,
//! whichever fires first. The signal is advisory; the timer is the
//! authoritative fallback. Fetch failures degrade to stale data (the last
//! good board stays up) rather than surfacing errors on the public screen.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use super::announce::{Announcer, CallGroup};
use super::models::Ticket;
use super::service::TicketService;
use super::views::{newly_calling, BoardOptions, DisplayBoard};
use crate::common::TicketId;

/// Events fanned out to display clients over the board stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    Board(DisplayBoard),
    Call(CallGroup),
}

/// One refresh cycle's worth of state: the calling id-set carried between
/// consecutive snapshots so calls are announced exactly once.
pub struct BoardCycle {
    options: BoardOptions,
    seen_calling: Option<HashSet<TicketId>>,
}

impl BoardCycle {
    pub fn new(options: BoardOptions) -> Self {
        Self {
            options,
            seen_calling: None,
        }
    }

    /// Projects the board and diffs the calling set against the previous
    /// cycle. The first observation primes the set and announces nothing, so
    /// a restart does not re-announce every ticket already on the floor.
    pub fn observe(
        &mut self,
        snapshot: &[Ticket],
        now: DateTime<Utc>,
    ) -> (DisplayBoard, Option<CallGroup>) {
        let board = DisplayBoard::project(snapshot, now, &self.options);

        let previous = self.seen_calling.take();
        let empty = HashSet::new();
        let (fresh, current) = newly_calling(snapshot, previous.as_ref().unwrap_or(&empty));

        let group = if previous.is_some() {
            CallGroup::from_tickets(fresh)
        } else {
            None
        };
        self.seen_calling = Some(current);

        (board, group)
    }
}

pub struct BoardWatcher {
    service: Arc<TicketService>,
    announcer: Arc<dyn Announcer>,
    events: broadcast::Sender<BoardEvent>,
    cycle: BoardCycle,
    refresh_interval: Duration,
    announcements_enabled: bool,
}

impl BoardWatcher {
    pub fn new(
        service: Arc<TicketService>,
        announcer: Arc<dyn Announcer>,
        events: broadcast::Sender<BoardEvent>,
        options: BoardOptions,
        refresh_interval: Duration,
        announcements_enabled: bool,
    ) -> Self {
        Self {
            service,
            announcer,
            events,
            cycle: BoardCycle::new(options),
            refresh_interval,
            announcements_enabled,
        }
    }

    /// Runs until the process shuts down. Spawn with `tokio::spawn`.
    pub async fn run(mut self) {
        let mut changes = self.service.subscribe();
        let mut signal_open = true;

        let mut interval = tokio::time::interval(self.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                result = changes.recv(), if signal_open => {
                    match result {
                        // Lagged just means we missed signals; the refetch
                        // below reads the latest state anyway
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!("change feed closed; falling back to timer refresh");
                            signal_open = false;
                        }
                    }
                }
            }

            self.refresh().await;
        }
    }

    async fn refresh(&mut self) {
        let snapshot = match self.service.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "board refresh failed, keeping stale board");
                return;
            }
        };

        let (board, group) = self.cycle.observe(&snapshot, Utc::now());
        let _ = self.events.send(BoardEvent::Board(board));

        if let Some(group) = group {
            let _ = self.events.send(BoardEvent::Call(group.clone()));
            if self.announcements_enabled {
                self.announcer.announce(&group);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tickets::models::{TicketCategory, TicketStatus};
    use chrono::Duration as ChronoDuration;

    fn ticket(status: TicketStatus, number: i32) -> Ticket {
        Ticket {
            id: TicketId::new(),
            number,
            category: TicketCategory::Normal,
            status,
            station: Some("2".to_string()).filter(|_| status == TicketStatus::Calling),
            agent: Some("dana".to_string()).filter(|_| status == TicketStatus::Calling),
            drawn_at: Utc::now() - ChronoDuration::minutes(1),
            called_at: None,
            served_at: None,
        }
    }

    #[test]
    fn first_observation_primes_without_announcing() {
        let mut cycle = BoardCycle::new(BoardOptions::default());
        let snapshot = vec![ticket(TicketStatus::Calling, 1)];

        let (board, group) = cycle.observe(&snapshot, Utc::now());
        assert_eq!(board.calling.len(), 1);
        assert!(group.is_none());
    }

    #[test]
    fn a_burst_within_one_cycle_groups_into_one_announcement() {
        // Scenario: three tickets start calling inside a single refresh window
        let mut cycle = BoardCycle::new(BoardOptions::default());
        cycle.observe(&[], Utc::now());

        let snapshot = vec![
            ticket(TicketStatus::Calling, 1),
            ticket(TicketStatus::Calling, 2),
            ticket(TicketStatus::Calling, 3),
        ];
        let (_, group) = cycle.observe(&snapshot, Utc::now());
        assert_eq!(group.expect("grouped call").tickets.len(), 3);
    }

    #[test]
    fn an_unchanged_calling_set_stays_quiet() {
        let mut cycle = BoardCycle::new(BoardOptions::default());
        let snapshot = vec![ticket(TicketStatus::Calling, 1)];

        cycle.observe(&snapshot, Utc::now());
        let (_, group) = cycle.observe(&snapshot, Utc::now());
        assert!(group.is_none());
    }

    #[test]
    fn a_requeued_then_recalled_ticket_announces_again() {
        let mut cycle = BoardCycle::new(BoardOptions::default());
        let mut t = ticket(TicketStatus::Calling, 1);

        cycle.observe(&[], Utc::now());
        let (_, group) = cycle.observe(std::slice::from_ref(&t), Utc::now());
        assert!(group.is_some());

        // Back to the queue, then called again
        t.status = TicketStatus::Waiting;
        t.station = None;
        t.agent = None;
        cycle.observe(std::slice::from_ref(&t), Utc::now());

        t.status = TicketStatus::Calling;
        t.station = Some("4".to_string());
        t.agent = Some("sam".to_string());
        let (_, group) = cycle.observe(std::slice::from_ref(&t), Utc::now());
        assert!(group.is_some());
    }
}
