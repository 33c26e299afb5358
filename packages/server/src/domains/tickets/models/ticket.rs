use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::TicketId;

/// Ticket - one visitor's place in line
///
/// Tickets are only ever mutated through the store's conditional-update
/// primitive; everything else in this module is a pure projection of a row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: TicketId,
    /// Sequential per category, assigned by the store at draw time.
    pub number: i32,
    pub category: TicketCategory,
    pub status: TicketStatus,

    // Both set while calling, both cleared otherwise
    pub station: Option<String>,
    pub agent: Option<String>,

    pub drawn_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Printable ticket code: category prefix + zero-padded number, e.g. `P001`.
    pub fn code(&self) -> String {
        format!("{}{:03}", self.category.prefix(), self.number)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Service category a ticket was drawn for.
///
/// Determines the priority class and the display prefix. The database column
/// is an enum type, so unknown values are rejected at the store boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "ticket_category", rename_all = "kebab-case")]
pub enum TicketCategory {
    Normal,
    Priority,
    Owner,
    CheckIn,
    CheckOut,
    Guest,
}

impl TicketCategory {
    /// Whether tickets of this category preempt the standard queue.
    pub fn is_priority(&self) -> bool {
        matches!(self, TicketCategory::Priority)
    }

    /// Short prefix shown before the ticket number on displays and printouts.
    pub fn prefix(&self) -> &'static str {
        match self {
            TicketCategory::Normal => "N",
            TicketCategory::Priority => "P",
            TicketCategory::Owner => "PR",
            TicketCategory::CheckIn => "CI",
            TicketCategory::CheckOut => "CO",
            TicketCategory::Guest => "G",
        }
    }

    /// Human-readable name used on printouts and spoken announcements.
    pub fn display_name(&self) -> &'static str {
        match self {
            TicketCategory::Normal => "Standard service",
            TicketCategory::Priority => "Priority service",
            TicketCategory::Owner => "Owner",
            TicketCategory::CheckIn => "Check-in",
            TicketCategory::CheckOut => "Check-out",
            TicketCategory::Guest => "Guest",
        }
    }
}

impl std::fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketCategory::Normal => write!(f, "normal"),
            TicketCategory::Priority => write!(f, "priority"),
            TicketCategory::Owner => write!(f, "owner"),
            TicketCategory::CheckIn => write!(f, "check-in"),
            TicketCategory::CheckOut => write!(f, "check-out"),
            TicketCategory::Guest => write!(f, "guest"),
        }
    }
}

impl std::str::FromStr for TicketCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(TicketCategory::Normal),
            "priority" => Ok(TicketCategory::Priority),
            "owner" => Ok(TicketCategory::Owner),
            "check-in" => Ok(TicketCategory::CheckIn),
            "check-out" => Ok(TicketCategory::CheckOut),
            "guest" => Ok(TicketCategory::Guest),
            _ => Err(anyhow::anyhow!("Invalid ticket category: {}", s)),
        }
    }
}

/// Lifecycle status.
///
/// waiting -> calling -> served, waiting|calling -> canceled,
/// calling -> waiting (requeue). served and canceled are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
pub enum TicketStatus {
    Waiting,
    Calling,
    Served,
    Canceled,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Waiting => write!(f, "waiting"),
            TicketStatus::Calling => write!(f, "calling"),
            TicketStatus::Served => write!(f, "served"),
            TicketStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "calling" => Ok(TicketStatus::Calling),
            "served" => Ok(TicketStatus::Served),
            "canceled" => Ok(TicketStatus::Canceled),
            _ => Err(anyhow::anyhow!("Invalid ticket status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(category: TicketCategory, number: i32) -> Ticket {
        Ticket {
            id: TicketId::new(),
            number,
            category,
            status: TicketStatus::Waiting,
            station: None,
            agent: None,
            drawn_at: Utc::now(),
            called_at: None,
            served_at: None,
        }
    }

    #[test]
    fn code_pads_to_three_digits() {
        assert_eq!(ticket(TicketCategory::Priority, 1).code(), "P001");
        assert_eq!(ticket(TicketCategory::Normal, 42).code(), "N042");
        assert_eq!(ticket(TicketCategory::Owner, 7).code(), "PR007");
        assert_eq!(ticket(TicketCategory::CheckIn, 1234).code(), "CI1234");
    }

    #[test]
    fn category_strings_round_trip() {
        for category in [
            TicketCategory::Normal,
            TicketCategory::Priority,
            TicketCategory::Owner,
            TicketCategory::CheckIn,
            TicketCategory::CheckOut,
            TicketCategory::Guest,
        ] {
            let parsed: TicketCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!("vip".parse::<TicketCategory>().is_err());
    }

    #[test]
    fn only_priority_preempts() {
        assert!(TicketCategory::Priority.is_priority());
        assert!(!TicketCategory::Normal.is_priority());
        assert!(!TicketCategory::Owner.is_priority());
        assert!(!TicketCategory::Guest.is_priority());
    }
}
