//! Typed UUID wrappers for compile-time type safety.
//!
//! Wrapping the raw `uuid::Uuid` in an entity-specific newtype prevents
//! accidentally passing an unrelated id where a ticket id was expected, and
//! gives the id a stable `Display`/`FromStr` surface for routes and logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Typed id for Ticket entities.
///
/// Backed by a UUID v7 so ids sort in creation order, which keeps the
/// `(drawn_at, id)` tie-break deterministic even under a coarse clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new time-ordered id.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an id from a raw `Uuid` (loading from the database,
    /// deserializing a route parameter).
    #[inline]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner `Uuid`.
    #[inline]
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TicketId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for TicketId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TicketId> for Uuid {
    fn from(id: TicketId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_display() {
        let id = TicketId::new();
        let parsed: TicketId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_from_distinct_millis_sort_in_creation_order() {
        let first = TicketId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = TicketId::new();
        assert!(first < second);
    }
}
