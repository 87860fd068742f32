use crate::logfile::DatedLog;
use crate::traits::{Accounting, Authing, Mode, Module, PluginContext, PluginError, PreAuth};
use async_trait::async_trait;
use radgate_protocol::Packet;
use std::collections::HashSet;

/// Appends every packet it sees to the dated `<mode>` log file
pub struct LoggerPlugin {
    log: DatedLog,
    disabled: HashSet<Mode>,
}

impl LoggerPlugin {
    pub const NAME: &'static str = "logger";

    pub fn setup(ctx: &PluginContext) -> Result<Self, PluginError> {
        Ok(Self {
            log: DatedLog::spawn(&ctx.logs, ctx.instance.clone())?,
            disabled: ctx.disabled_modes(Self::NAME),
        })
    }

    pub fn log(&self) -> &DatedLog {
        &self.log
    }

    fn write(&self, mode: Mode, packet: &Packet) {
        if self.disabled.contains(&mode) {
            return;
        }
        let mut lines = vec![format!("id -> {mode}")];
        lines.extend(packet.attribute_strings());
        self.log.append(mode.as_str(), mode.as_str(), lines);
    }
}

impl Module for LoggerPlugin {
    fn name(&self) -> &str {
        Self::NAME
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
impl PreAuth for LoggerPlugin {
    async fn pre(&self, packet: &Packet) -> Result<(), PluginError> {
        self.write(Mode::PreAuth, packet);
        Ok(())
    }
}

#[async_trait]
impl Authing for LoggerPlugin {
    async fn auth(&self, packet: &Packet) {
        self.write(Mode::Auth, packet);
    }
}

#[async_trait]
impl Accounting for LoggerPlugin {
    async fn account(&self, packet: &Packet) {
        self.write(Mode::Accounting, packet);
    }
}
