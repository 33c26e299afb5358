// Frontdesk - queue ticketing service
//
// This crate provides the backend for a front-desk service counter: visitors
// draw a ticket of a given category, staff call the next ticket to a station,
// and a public display board announces calls.
//
// The queue policy (selection + lifecycle) lives in domains/tickets and is
// pure logic over store snapshots; the HTTP layer in server/ is presentation.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
