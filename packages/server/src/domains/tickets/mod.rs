pub mod announce;
pub mod data;
pub mod export;
pub mod models;
pub mod policy;
pub mod service;
pub mod views;
pub mod watch;

pub use announce::{Announcer, CallGroup, LogAnnouncer};
pub use data::{InMemoryTicketStore, PgTicketStore, StoreError, TicketPatch, TicketStore};
pub use models::{Ticket, TicketCategory, TicketStatus};
pub use service::{ReportOptions, ReportPeriod, TicketError, TicketService};
pub use views::{BoardOptions, DisplayBoard, QueueStats};
pub use watch::{BoardCycle, BoardEvent, BoardWatcher};
