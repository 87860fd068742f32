//! User + MAC allow-list.
//!
//! A packet may proceed when a marker file named `<user>.<station>` exists in
//! `<lib>/users`. Both parts are normalized to `[a-z0-9.]` first, so the name
//! is always safe to use as a path component.
//!
//! Decisions are cached in memory until the next reload. Every real probe of
//! the users directory (never a cache hit) is written to the dated `audit`
//! file and, when `usermac_callback` is configured, reported to an external
//! command as its last argument.

use crate::logfile::DatedLog;
use crate::traits::{Mode, Module, PluginContext, PluginError, PreAuth};
use async_trait::async_trait;
use radgate_protocol::{AttributeType, Packet};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, warn};

pub struct UserMacPlugin {
    users: PathBuf,
    caching: AtomicBool,
    cache: RwLock<HashMap<String, bool>>,
    log: DatedLog,
    callback: Vec<String>,
    disabled: HashSet<Mode>,
}

impl UserMacPlugin {
    pub const NAME: &'static str = "usermac";

    pub fn setup(ctx: &PluginContext) -> Result<Self, PluginError> {
        Ok(Self {
            users: ctx.lib.join("users"),
            caching: AtomicBool::new(ctx.cache),
            cache: RwLock::new(HashMap::new()),
            log: DatedLog::spawn(&ctx.logs, ctx.instance.clone())?,
            callback: ctx.settings.get_array("usermac_callback"),
            disabled: ctx.disabled_modes(Self::NAME),
        })
    }

    /// Toggle use of cached decisions. Probes keep filling the cache either way.
    pub fn set_caching(&self, enabled: bool) {
        self.caching.store(enabled, Ordering::Relaxed);
    }

    /// Cached decision for a normalized identity
    pub fn cached(&self, identity: &str) -> Option<bool> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(identity)
            .copied()
    }

    /// Handle to the audit writer
    pub fn audit_log(&self) -> &DatedLog {
        &self.log
    }

    async fn check(&self, packet: &Packet) -> Result<(), PluginError> {
        let user = packet
            .user_name()
            .ok_or(PluginError::AttributeNotFound(AttributeType::UserName))?;
        let station = packet
            .calling_station_id()
            .ok_or(PluginError::AttributeNotFound(AttributeType::CallingStationId))?;
        let user = normalize(&user);
        let station = normalize(&station);
        let identity = format!("{user}.{station}");

        if self.caching.load(Ordering::Relaxed) {
            if let Some(allowed) = self.cached(&identity) {
                debug!(identity = %identity, allowed, "cached decision");
                return if allowed {
                    Ok(())
                } else {
                    Err(PluginError::CachedDenial(identity))
                };
            }
        }

        let allowed = marker_exists(&self.users.join(&identity)).await;
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identity, allowed);

        let result = if allowed { "passed" } else { "failed" };
        let summary = summarize(&user, &station, packet);
        self.log.append("audit", result, vec![summary.clone()]);
        self.spawn_callback(format!("{result} -> {summary}"));

        if allowed {
            Ok(())
        } else {
            Err(PluginError::Denied { user, station })
        }
    }

    fn spawn_callback(&self, report: String) {
        let Some((program, args)) = self.callback.split_first() else {
            return;
        };
        let mut command = tokio::process::Command::new(program);
        command.args(args).arg(report).kill_on_drop(false);
        tokio::spawn(async move {
            match command.output().await {
                Ok(output) if output.status.success() => debug!("callback completed"),
                Ok(output) => warn!(status = %output.status, "callback failed"),
                Err(e) => warn!(error = %e, "unable to run callback"),
            }
        });
    }
}

impl Module for UserMacPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reload(&self) {
        self.cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn pre_auth(&self) -> Option<&dyn PreAuth> {
        Some(self)
    }
}

#[async_trait]
impl PreAuth for UserMacPlugin {
    async fn pre(&self, packet: &Packet) -> Result<(), PluginError> {
        if self.disabled.contains(&Mode::PreAuth) {
            return Ok(());
        }
        self.check(packet).await
    }
}

/// Lowercase and keep only `[a-z0-9.]`
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Only regular files count, so `.` or `..` identities never match a directory.
async fn marker_exists(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to probe users directory");
            false
        }
    }
}

fn summarize(user: &str, station: &str, packet: &Packet) -> String {
    let nas = packet
        .nas_identifier()
        .map(|id| normalize(&id))
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let nas_ip = packet
        .nas_ip_address()
        .map_or_else(|| "noip".to_string(), |ip| ip.to_string());
    let nas_port = packet.nas_port().unwrap_or(0);
    format!("{user} (mac:{station}) (nas:{nas},ip:{nas_ip},port:{nas_port})")
}
