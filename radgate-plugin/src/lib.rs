//! # radgate plugin system
//!
//! Plugins observe, and during pre-authorization may veto, the RADIUS packets
//! flowing through the relay. A plugin implements [`Module`] plus any of the
//! three capabilities:
//!
//! - [`PreAuth`] - called in order before an auth packet is forwarded; the first
//!   `Err` drops the packet
//! - [`Authing`] - notified of every forwarded auth packet
//! - [`Accounting`] - notified of every accounting packet
//!
//! ## Writing a plugin
//!
//! ```rust
//! use async_trait::async_trait;
//! use radgate_plugin::{Module, PluginError, PreAuth};
//! use radgate_protocol::Packet;
//!
//! struct DenyAll;
//!
//! impl Module for DenyAll {
//!     fn name(&self) -> &str {
//!         "deny-all"
//!     }
//!
//!     fn pre_auth(&self) -> Option<&dyn PreAuth> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl PreAuth for DenyAll {
//!     async fn pre(&self, _packet: &Packet) -> Result<(), PluginError> {
//!         Err(PluginError::Config("closed".into()))
//!     }
//! }
//! ```
//!
//! ## Built-in plugins
//!
//! - `usermac` - user + MAC allow-list backed by marker files, with audit trail
//! - `logger` - dated per-mode packet logs
//! - `stats` - per-mode counters
//! - `trace` - attribute dumps to the process log
//!
//! Each honours `<name>_disable_<mode>` settings. See [`PluginRegistry`] for
//! loading them by name.

pub mod builtin;
pub mod logfile;
pub mod registry;
pub mod traits;

pub use logfile::DatedLog;
pub use registry::*;
pub use traits::*;
