use crate::logfile::DatedLog;
use crate::traits::{Accounting, Authing, Mode, Module, PluginContext, PluginError, PreAuth};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use radgate_protocol::Packet;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

/// Counters for one mode since setup or the last reload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeStats {
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    pub count: u64,
    pub mode: Mode,
}

impl fmt::Display for ModeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "first: {}", self.first.format("%Y-%m-%dT%H:%M:%S"))?;
        writeln!(f, "last: {}", self.last.format("%Y-%m-%dT%H:%M:%S"))?;
        writeln!(f, "count: {}", self.count)?;
        writeln!(f, "name: {}", self.mode)
    }
}

/// Counts packets per mode and keeps a `stats.<mode>` file current
pub struct StatsPlugin {
    log: DatedLog,
    disabled: HashSet<Mode>,
    state: Mutex<HashMap<Mode, ModeStats>>,
}

impl StatsPlugin {
    pub const NAME: &'static str = "stats";

    pub fn setup(ctx: &PluginContext) -> Result<Self, PluginError> {
        Ok(Self {
            log: DatedLog::spawn(&ctx.logs, ctx.instance.clone())?,
            disabled: ctx.disabled_modes(Self::NAME),
            state: Mutex::new(HashMap::new()),
        })
    }

    pub fn snapshot(&self, mode: Mode) -> Option<ModeStats> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&mode)
            .cloned()
    }

    pub fn log(&self) -> &DatedLog {
        &self.log
    }

    fn record(&self, mode: Mode) {
        if self.disabled.contains(&mode) {
            return;
        }
        let now = Local::now().naive_local();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state.entry(mode).or_insert_with(|| ModeStats {
            first: now,
            last: now,
            count: 0,
            mode,
        });
        entry.last = now;
        entry.count += 1;
        // Queued under the lock so rewrites land in count order.
        self.log
            .replace(&format!("stats.{mode}"), entry.to_string());
    }
}

impl Module for StatsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reload(&self) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn pre_auth(&self) -> Option<&dyn PreAuth> {
        Some(self)
    }

    fn authing(&self) -> Option<&dyn Authing> {
        Some(self)
    }

    fn accounting(&self) -> Option<&dyn Accounting> {
        Some(self)
    }
}

#[async_trait]
impl PreAuth for StatsPlugin {
    async fn pre(&self, _packet: &Packet) -> Result<(), PluginError> {
        self.record(Mode::PreAuth);
        Ok(())
    }
}

#[async_trait]
impl Authing for StatsPlugin {
    async fn auth(&self, _packet: &Packet) {
        self.record(Mode::Auth);
    }
}

#[async_trait]
impl Accounting for StatsPlugin {
    async fn account(&self, _packet: &Packet) {
        self.record(Mode::Accounting);
    }
}
