//! Next-ticket selection policy.
//!
//! A strict two-level priority queue over a snapshot: priority tickets always
//! preempt standard tickets regardless of arrival order, FIFO within each
//! level. Every call recomputes from the snapshot; there is no state here.

use std::cmp::Ordering;

use super::models::{Ticket, TicketStatus};

/// FIFO order within a class: drawn earlier first, ties broken by id so the
/// result is deterministic under a coarse clock.
fn fifo_order(a: &Ticket, b: &Ticket) -> Ordering {
    a.drawn_at.cmp(&b.drawn_at).then_with(|| a.id.cmp(&b.id))
}

/// All waiting tickets of the snapshot in selection order: the priority class
/// first, then the standard class, FIFO within each.
pub fn waiting_in_selection_order(snapshot: &[Ticket]) -> Vec<&Ticket> {
    let mut waiting: Vec<&Ticket> = snapshot
        .iter()
        .filter(|t| t.status == TicketStatus::Waiting)
        .collect();

    waiting.sort_by(|a, b| {
        b.category
            .is_priority()
            .cmp(&a.category.is_priority())
            .then_with(|| fifo_order(a, b))
    });

    waiting
}

/// Selects the ticket to call next, or `None` when the queue is empty.
///
/// `None` is a valid terminal outcome, not a fault; callers turn it into an
/// empty-queue rejection of the call request.
pub fn select_next(snapshot: &[Ticket]) -> Option<&Ticket> {
    waiting_in_selection_order(snapshot).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TicketId;
    use crate::domains::tickets::models::TicketCategory;
    use chrono::{Duration, Utc};

    fn ticket(category: TicketCategory, status: TicketStatus, drawn_offset_secs: i64) -> Ticket {
        Ticket {
            id: TicketId::new(),
            number: 1,
            category,
            status,
            station: None,
            agent: None,
            drawn_at: Utc::now() + Duration::seconds(drawn_offset_secs),
            called_at: None,
            served_at: None,
        }
    }

    #[test]
    fn empty_snapshot_selects_nothing() {
        assert!(select_next(&[]).is_none());
    }

    #[test]
    fn priority_preempts_earlier_standard_tickets() {
        // Scenario A: normal drawn at t=0, priority at t=1
        let snapshot = vec![
            ticket(TicketCategory::Normal, TicketStatus::Waiting, 0),
            ticket(TicketCategory::Priority, TicketStatus::Waiting, 1),
        ];

        let next = select_next(&snapshot).unwrap();
        assert_eq!(next.category, TicketCategory::Priority);
    }

    #[test]
    fn fifo_within_the_standard_class() {
        let older = ticket(TicketCategory::CheckIn, TicketStatus::Waiting, 0);
        let newer = ticket(TicketCategory::Normal, TicketStatus::Waiting, 10);
        let snapshot = vec![newer, older.clone()];

        assert_eq!(select_next(&snapshot).unwrap().id, older.id);
    }

    #[test]
    fn fifo_within_the_priority_class() {
        let first = ticket(TicketCategory::Priority, TicketStatus::Waiting, 0);
        let second = ticket(TicketCategory::Priority, TicketStatus::Waiting, 5);
        let snapshot = vec![second, first.clone()];

        assert_eq!(select_next(&snapshot).unwrap().id, first.id);
    }

    #[test]
    fn non_waiting_tickets_are_ignored() {
        let snapshot = vec![
            ticket(TicketCategory::Priority, TicketStatus::Calling, 0),
            ticket(TicketCategory::Priority, TicketStatus::Served, 1),
            ticket(TicketCategory::Normal, TicketStatus::Canceled, 2),
            ticket(TicketCategory::Normal, TicketStatus::Waiting, 3),
        ];

        let next = select_next(&snapshot).unwrap();
        assert_eq!(next.category, TicketCategory::Normal);
        assert_eq!(next.status, TicketStatus::Waiting);
    }

    #[test]
    fn identical_draw_times_break_ties_by_id() {
        let drawn_at = Utc::now();
        let mut a = ticket(TicketCategory::Normal, TicketStatus::Waiting, 0);
        let mut b = ticket(TicketCategory::Normal, TicketStatus::Waiting, 0);
        a.drawn_at = drawn_at;
        b.drawn_at = drawn_at;

        let expected = a.id.min(b.id);
        let snapshot = vec![b.clone(), a.clone()];
        assert_eq!(select_next(&snapshot).unwrap().id, expected);

        // Same winner regardless of snapshot order
        let snapshot = vec![a, b];
        assert_eq!(select_next(&snapshot).unwrap().id, expected);
    }

    #[test]
    fn selection_order_lists_priority_class_first() {
        let p = ticket(TicketCategory::Priority, TicketStatus::Waiting, 20);
        let n1 = ticket(TicketCategory::Normal, TicketStatus::Waiting, 0);
        let n2 = ticket(TicketCategory::Guest, TicketStatus::Waiting, 10);
        let snapshot = vec![n1.clone(), n2.clone(), p.clone()];

        let ordered: Vec<_> = waiting_in_selection_order(&snapshot)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ordered, vec![p.id, n1.id, n2.id]);
    }
}
