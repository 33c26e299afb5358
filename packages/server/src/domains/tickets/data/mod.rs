pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::InMemoryTicketStore;
pub use postgres::PgTicketStore;
pub use store::{ChangeFeed, FieldPatch, StoreError, TicketPatch, TicketStore};
