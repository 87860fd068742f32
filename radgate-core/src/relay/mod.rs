pub mod accounting;
pub mod server;
pub mod session;

pub use accounting::AccountingServer;
pub use server::RelayServer;
pub use session::{ConnectionTable, Session};
