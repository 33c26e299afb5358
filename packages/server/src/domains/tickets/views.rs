//! Derived display views.
//!
//! Pure projections of a ticket snapshot into what the public panel and the
//! admin console render. Nothing here mutates anything; every view is
//! recomputed from the latest snapshot on each refresh.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::models::{Ticket, TicketCategory, TicketStatus};
use super::policy::waiting_in_selection_order;
use crate::common::TicketId;

/// Tunables for the board projection.
#[derive(Debug, Clone)]
pub struct BoardOptions {
    /// How long a served ticket stays on the "recently served" panel.
    pub served_window: Duration,
    /// How many waiting tickets to preview as "next up".
    pub next_up_limit: usize,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            served_window: Duration::minutes(5),
            next_up_limit: 8,
        }
    }
}

/// One ticket as rendered on a display.
#[derive(Debug, Clone, Serialize)]
pub struct BoardEntry {
    pub id: TicketId,
    pub code: String,
    pub category: TicketCategory,
    pub station: Option<String>,
    pub agent: Option<String>,
    /// Wall-clock time since the ticket was drawn, `M:SS`.
    pub elapsed: String,
}

impl BoardEntry {
    fn project(ticket: &Ticket, now: DateTime<Utc>) -> Self {
        Self {
            id: ticket.id,
            code: ticket.code(),
            category: ticket.category,
            station: ticket.station.clone(),
            agent: ticket.agent.clone(),
            elapsed: format_elapsed(ticket.drawn_at, now),
        }
    }
}

/// The public display board, partitioned by status and priority class.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayBoard {
    pub calling: Vec<BoardEntry>,
    /// First N waiting tickets in selection order, for the panel preview.
    pub next_up: Vec<BoardEntry>,
    pub priority_waiting: Vec<BoardEntry>,
    pub standard_waiting: Vec<BoardEntry>,
    /// Served within the trailing window; a sliding set, not a persisted one.
    pub recently_served: Vec<BoardEntry>,
    pub generated_at: DateTime<Utc>,
}

impl DisplayBoard {
    pub fn project(snapshot: &[Ticket], now: DateTime<Utc>, options: &BoardOptions) -> Self {
        let entry = |t: &Ticket| BoardEntry::project(t, now);

        let calling = snapshot
            .iter()
            .filter(|t| t.status == TicketStatus::Calling)
            .map(entry)
            .collect();

        let waiting = waiting_in_selection_order(snapshot);
        let next_up = waiting
            .iter()
            .copied()
            .take(options.next_up_limit)
            .map(entry)
            .collect();

        let mut priority_waiting = Vec::new();
        let mut standard_waiting = Vec::new();
        for ticket in waiting {
            if ticket.category.is_priority() {
                priority_waiting.push(entry(ticket));
            } else {
                standard_waiting.push(entry(ticket));
            }
        }

        let served_cutoff = now - options.served_window;
        let recently_served = snapshot
            .iter()
            .filter(|t| t.status == TicketStatus::Served)
            .filter(|t| t.served_at.is_some_and(|at| at >= served_cutoff))
            .map(entry)
            .collect();

        Self {
            calling,
            next_up,
            priority_waiting,
            standard_waiting,
            recently_served,
            generated_at: now,
        }
    }
}

/// Queue counters for the admin console header.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub calling: usize,
    pub served: usize,
    pub priority_waiting: usize,
    pub standard_waiting: usize,
}

impl QueueStats {
    pub fn project(snapshot: &[Ticket]) -> Self {
        let mut stats = Self {
            waiting: 0,
            calling: 0,
            served: 0,
            priority_waiting: 0,
            standard_waiting: 0,
        };

        for ticket in snapshot {
            match ticket.status {
                TicketStatus::Waiting => {
                    stats.waiting += 1;
                    if ticket.category.is_priority() {
                        stats.priority_waiting += 1;
                    } else {
                        stats.standard_waiting += 1;
                    }
                }
                TicketStatus::Calling => stats.calling += 1,
                TicketStatus::Served => stats.served += 1,
                TicketStatus::Canceled => {}
            }
        }

        stats
    }
}

/// Formats the time since `from` as `M:SS`, truncated to whole seconds.
/// A clock skew that puts `from` in the future renders as `0:00`.
pub fn format_elapsed(from: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - from).num_seconds().max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Tickets that entered `calling` since the previous refresh cycle.
///
/// Returns the newly-called tickets plus the full current calling id-set the
/// caller should carry into the next cycle. The diff is over ids, so a ticket
/// that was requeued and called again announces again.
pub fn newly_calling<'a>(
    snapshot: &'a [Ticket],
    previous: &HashSet<TicketId>,
) -> (Vec<&'a Ticket>, HashSet<TicketId>) {
    let calling: Vec<&Ticket> = snapshot
        .iter()
        .filter(|t| t.status == TicketStatus::Calling)
        .collect();

    let current: HashSet<TicketId> = calling.iter().map(|t| t.id).collect();
    let fresh = calling
        .into_iter()
        .filter(|t| !previous.contains(&t.id))
        .collect();

    (fresh, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticket(category: TicketCategory, status: TicketStatus, drawn_offset_secs: i64) -> Ticket {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Ticket {
            id: TicketId::new(),
            number: 1,
            category,
            status,
            station: None,
            agent: None,
            drawn_at: base + Duration::seconds(drawn_offset_secs),
            called_at: None,
            served_at: None,
        }
    }

    #[test]
    fn elapsed_truncates_to_minutes_and_seconds() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_elapsed(from, from), "0:00");
        assert_eq!(format_elapsed(from, from + Duration::seconds(9)), "0:09");
        assert_eq!(format_elapsed(from, from + Duration::seconds(65)), "1:05");
        assert_eq!(
            format_elapsed(from, from + Duration::milliseconds(59_900)),
            "0:59"
        );
        assert_eq!(format_elapsed(from, from + Duration::minutes(12)), "12:00");
    }

    #[test]
    fn elapsed_clamps_future_draw_times() {
        let from = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(format_elapsed(from, from - Duration::seconds(5)), "0:00");
    }

    #[test]
    fn board_partitions_waiting_by_priority_class() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 10, 0).unwrap();
        let snapshot = vec![
            ticket(TicketCategory::Normal, TicketStatus::Waiting, 0),
            ticket(TicketCategory::Priority, TicketStatus::Waiting, 1),
            ticket(TicketCategory::Guest, TicketStatus::Waiting, 2),
            ticket(TicketCategory::Normal, TicketStatus::Calling, 3),
        ];

        let board = DisplayBoard::project(&snapshot, now, &BoardOptions::default());
        assert_eq!(board.priority_waiting.len(), 1);
        assert_eq!(board.standard_waiting.len(), 2);
        assert_eq!(board.calling.len(), 1);
        // Priority heads the merged preview even though it was drawn later
        assert_eq!(board.next_up[0].code, board.priority_waiting[0].code);
    }

    #[test]
    fn next_up_respects_the_limit() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 10, 0).unwrap();
        let snapshot: Vec<Ticket> = (0..12)
            .map(|i| ticket(TicketCategory::Normal, TicketStatus::Waiting, i))
            .collect();

        let options = BoardOptions {
            next_up_limit: 8,
            ..BoardOptions::default()
        };
        let board = DisplayBoard::project(&snapshot, now, &options);
        assert_eq!(board.next_up.len(), 8);
    }

    #[test]
    fn recently_served_is_a_sliding_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut fresh = ticket(TicketCategory::Normal, TicketStatus::Served, 0);
        fresh.served_at = Some(now - Duration::minutes(2));
        let mut stale = ticket(TicketCategory::Normal, TicketStatus::Served, 0);
        stale.served_at = Some(now - Duration::minutes(9));

        let board = DisplayBoard::project(
            &[fresh.clone(), stale],
            now,
            &BoardOptions::default(),
        );
        assert_eq!(board.recently_served.len(), 1);
        assert_eq!(board.recently_served[0].id, fresh.id);
    }

    #[test]
    fn stats_count_by_status_and_class() {
        let snapshot = vec![
            ticket(TicketCategory::Priority, TicketStatus::Waiting, 0),
            ticket(TicketCategory::Normal, TicketStatus::Waiting, 1),
            ticket(TicketCategory::Normal, TicketStatus::Calling, 2),
            ticket(TicketCategory::Normal, TicketStatus::Served, 3),
            ticket(TicketCategory::Normal, TicketStatus::Canceled, 4),
        ];

        let stats = QueueStats::project(&snapshot);
        assert_eq!(stats.waiting, 2);
        assert_eq!(stats.calling, 1);
        assert_eq!(stats.served, 1);
        assert_eq!(stats.priority_waiting, 1);
        assert_eq!(stats.standard_waiting, 1);
    }

    #[test]
    fn newly_calling_diffs_consecutive_snapshots() {
        let a = ticket(TicketCategory::Normal, TicketStatus::Calling, 0);
        let b = ticket(TicketCategory::Normal, TicketStatus::Calling, 1);

        let snapshot1 = [a.clone()];
        let (fresh, seen) = newly_calling(&snapshot1, &HashSet::new());
        assert_eq!(fresh.len(), 1);

        // Next cycle: a is no longer new, b is
        let snapshot2 = [a.clone(), b.clone()];
        let (fresh, seen) = newly_calling(&snapshot2, &seen);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, b.id);

        // A ticket that leaves calling drops out of the carried set
        let snapshot3 = [b.clone()];
        let (fresh, seen) = newly_calling(&snapshot3, &seen);
        assert!(fresh.is_empty());
        assert!(!seen.contains(&a.id));
    }
}
