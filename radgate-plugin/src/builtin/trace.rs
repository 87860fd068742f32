use crate::traits::{Accounting, Authing, Mode, Module, PluginContext, PluginError};
use async_trait::async_trait;
use radgate_protocol::Packet;
use std::collections::HashSet;
use tracing::info;

/// Dumps packet attributes to the process log
pub struct TracePlugin {
    disabled: HashSet<Mode>,
}

impl TracePlugin {
    pub const NAME: &'static str = "trace";

    pub fn setup(ctx: &PluginContext) -> Result<Self, PluginError> {
        Ok(Self {
            disabled: ctx.disabled_modes(Self::NAME),
        })
    }

    /// Lines that would be emitted for `packet` in `mode`, if any
    pub fn dump(&self, mode: Mode, packet: &Packet) -> Vec<String> {
        if self.disabled.contains(&mode) {
            return Vec::new();
        }
        packet.attribute_strings()
    }

    fn emit(&self, mode: Mode, packet: &Packet) {
        let lines = self.dump(mode, packet);
        if lines.is_empty() {
            return;
        }
        info!(mode = %mode, code = ?packet.code, id = packet.identifier, "packet trace");
        for line in lines {
            info!(mode = %mode, "{line}");
        }
    }
}

impl Module for TracePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn authing(&self) -> Option<&dyn Authing> {
        Some(self)
    }

    fn accounting(&self) -> Option<&dyn Accounting> {
        Some(self)
    }
}

#[async_trait]
impl Authing for TracePlugin {
    async fn auth(&self, packet: &Packet) {
        self.emit(Mode::Auth, packet);
    }
}

#[async_trait]
impl Accounting for TracePlugin {
    async fn account(&self, packet: &Packet) {
        self.emit(Mode::Accounting, packet);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radgate_protocol::{AttributeType, Code};

    #[test]
    fn test_dump_respects_disabled_modes() {
        let (_, settings) =
            radgate_common::parse_config("trace_disable_accounting = true").unwrap();
        let plugin = TracePlugin::setup(&PluginContext {
            settings,
            ..Default::default()
        })
        .unwrap();

        let mut packet = Packet::new(Code::AccessRequest, 1, "secret");
        packet
            .add(AttributeType::CallingStationId, "11-22-33-44-55-66")
            .unwrap();

        assert_eq!(
            plugin.dump(Mode::Auth, &packet),
            vec![
                "Type: 31 (Calling-Station-Id)".to_string(),
                "Value: 11-22-33-44-55-66".to_string()
            ]
        );
        assert!(plugin.dump(Mode::Accounting, &packet).is_empty());
        assert!(plugin.pre_auth().is_none());
    }

    #[tokio::test]
    async fn test_emits_without_panicking() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let plugin = TracePlugin::setup(&PluginContext::default()).unwrap();
        let packet = Packet::new(Code::AccountingRequest, 9, "secret");
        plugin.account(&packet).await;
        plugin.auth(&packet).await;
    }
}
