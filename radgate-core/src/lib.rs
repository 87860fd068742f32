pub mod context;
pub mod relay;

pub use context::{AuthContext, DecodeFailurePolicy};
pub use relay::{AccountingServer, ConnectionTable, RelayServer, Session};
