//! Call announcements.
//!
//! When tickets move to `calling`, the board watcher batches everything that
//! changed within one refresh cycle into a single [`CallGroup`] so a burst of
//! calls produces one announcement instead of one per ticket. Announcements
//! are fire-and-forget: a failing announcer is logged and swallowed, it never
//! blocks or fails ticket logic. Audio rendering belongs to display clients;
//! the service only produces the text.

use serde::Serialize;

use super::models::{Ticket, TicketCategory};

/// One ticket inside a grouped announcement.
#[derive(Debug, Clone, Serialize)]
pub struct CalledTicket {
    pub code: String,
    pub category: TicketCategory,
    pub station: String,
}

/// All tickets newly called within one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CallGroup {
    pub tickets: Vec<CalledTicket>,
}

impl CallGroup {
    /// Builds a group from newly-calling tickets; `None` when nothing changed.
    ///
    /// A calling ticket always carries a station; a row that lost it to a
    /// concurrent requeue is skipped rather than announced station-less.
    pub fn from_tickets<'a, I>(tickets: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Ticket>,
    {
        let tickets: Vec<CalledTicket> = tickets
            .into_iter()
            .filter_map(|t| {
                let station = t.station.clone()?;
                Some(CalledTicket {
                    code: t.code(),
                    category: t.category,
                    station,
                })
            })
            .collect();

        if tickets.is_empty() {
            None
        } else {
            Some(Self { tickets })
        }
    }

    /// Spoken/display text for the whole group, one sentence per call:
    /// `Ticket P001, Priority service, station 3. Ticket N004, ...`
    pub fn text(&self) -> String {
        let parts: Vec<String> = self
            .tickets
            .iter()
            .map(|t| {
                format!(
                    "Ticket {}, {}, station {}",
                    t.code,
                    t.category.display_name(),
                    t.station
                )
            })
            .collect();
        parts.join(". ")
    }
}

/// Announcement sink. Implementations must not block ticket logic and must
/// swallow their own failures.
pub trait Announcer: Send + Sync {
    fn announce(&self, group: &CallGroup);
}

/// Announcer that writes the grouped text to the log. The production binary
/// pairs this with the SSE board stream, which carries the same group to
/// display clients for on-screen and audio rendering.
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, group: &CallGroup) {
        tracing::info!(calls = group.tickets.len(), "{}", group.text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TicketId;
    use crate::domains::tickets::models::TicketStatus;
    use chrono::Utc;

    fn calling_ticket(category: TicketCategory, number: i32, station: &str) -> Ticket {
        Ticket {
            id: TicketId::new(),
            number,
            category,
            status: TicketStatus::Calling,
            station: Some(station.to_string()),
            agent: Some("dana".to_string()),
            drawn_at: Utc::now(),
            called_at: Some(Utc::now()),
            served_at: None,
        }
    }

    #[test]
    fn empty_input_builds_no_group() {
        assert!(CallGroup::from_tickets(std::iter::empty::<&Ticket>()).is_none());
    }

    #[test]
    fn single_call_text() {
        let ticket = calling_ticket(TicketCategory::Priority, 1, "3");
        let group = CallGroup::from_tickets([&ticket]).unwrap();
        assert_eq!(group.text(), "Ticket P001, Priority service, station 3");
    }

    #[test]
    fn burst_of_calls_becomes_one_message() {
        let a = calling_ticket(TicketCategory::Priority, 1, "3");
        let b = calling_ticket(TicketCategory::Normal, 4, "5");
        let c = calling_ticket(TicketCategory::CheckIn, 2, "1");

        let group = CallGroup::from_tickets([&a, &b, &c]).unwrap();
        assert_eq!(group.tickets.len(), 3);

        let text = group.text();
        assert!(text.contains("Ticket P001, Priority service, station 3"));
        assert!(text.contains("Ticket N004, Standard service, station 5"));
        assert!(text.contains("Ticket CI002, Check-in, station 1"));
    }

    #[test]
    fn station_less_rows_are_skipped() {
        let mut ticket = calling_ticket(TicketCategory::Normal, 9, "2");
        ticket.station = None;
        assert!(CallGroup::from_tickets([&ticket]).is_none());
    }
}
