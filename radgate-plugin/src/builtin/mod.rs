pub mod logger;
pub mod stats;
pub mod trace;
pub mod usermac;

pub use logger::LoggerPlugin;
pub use stats::{ModeStats, StatsPlugin};
pub use trace::TracePlugin;
pub use usermac::UserMacPlugin;
