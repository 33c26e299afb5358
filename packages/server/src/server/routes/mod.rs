// HTTP routes
pub mod board;
pub mod health;
pub mod reports;
pub mod tickets;

pub use board::*;
pub use health::*;
pub use reports::*;
pub use tickets::*;
