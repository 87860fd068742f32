use async_trait::async_trait;
use radgate_common::Settings;
use radgate_protocol::{AttributeType, Packet};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Dispatch mode a plugin is invoked in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    PreAuth,
    Auth,
    Accounting,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::PreAuth, Mode::Auth, Mode::Accounting];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::PreAuth => "preauth",
            Mode::Auth => "auth",
            Mode::Accounting => "accounting",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only setup parameters handed to every plugin
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    /// Directory for dated log/audit files
    pub logs: PathBuf,
    /// Persistent data directory
    pub lib: PathBuf,
    /// Process instance label, used in file names
    pub instance: Option<String>,
    /// Whether plugins may cache decisions
    pub cache: bool,
    /// The whole configuration document
    pub settings: Settings,
}

impl PluginContext {
    /// Modes switched off for `name` through `<name>_disable_<mode>` settings.
    pub fn disabled_modes(&self, name: &str) -> HashSet<Mode> {
        Mode::ALL
            .into_iter()
            .filter(|mode| {
                self.settings
                    .get_bool(&format!("{name}_disable_{}", mode.as_str()))
            })
            .collect()
    }
}

/// Reasons a plugin denies a packet or fails to set up
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("attribute not found: {0}")]
    AttributeNotFound(AttributeType),

    #[error("failed preauth: {user} {station}")]
    Denied { user: String, station: String },

    #[error("{0} is denied (cached)")]
    CachedDenial(String),

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("plugin configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Base lifecycle every plugin implements.
///
/// Construction through the [`PluginRegistry`](crate::PluginRegistry) is the
/// one-time setup. Capabilities are discovered through the `pre_auth`,
/// `authing` and `accounting` accessors; a plugin returns `Some(self)` for
/// each capability it implements.
pub trait Module: Send + Sync {
    /// Stable plugin name (settings prefix and diagnostics)
    fn name(&self) -> &str;

    /// Return to the post-setup state. May run concurrently with decisions.
    fn reload(&self) {}

    fn pre_auth(&self) -> Option<&dyn PreAuth> {
        None
    }

    fn authing(&self) -> Option<&dyn Authing> {
        None
    }

    fn accounting(&self) -> Option<&dyn Accounting> {
        None
    }
}

/// Can deny forwarding of a packet
#[async_trait]
pub trait PreAuth: Module {
    /// `Err` denies the packet; the error is the reason.
    async fn pre(&self, packet: &Packet) -> Result<(), PluginError>;
}

/// Observes parsed authentication packets
#[async_trait]
pub trait Authing: Module {
    async fn auth(&self, packet: &Packet);
}

/// Observes accounting packets
#[async_trait]
pub trait Accounting: Module {
    async fn account(&self, packet: &Packet);
}
