// Common types and utilities shared across the application

pub mod ids;

pub use ids::TicketId;
