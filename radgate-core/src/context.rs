//! Plugin dispatch for authorization and accounting traffic.
//!
//! An [`AuthContext`] owns the shared secret and the registered plugins, filed
//! per capability in registration order. The relay asks it whether a datagram
//! may be forwarded; the accounting sink hands it every datagram it receives.

use bytes::Bytes;
use radgate_plugin::Module;
use radgate_protocol::Packet;
use std::sync::Arc;
use tracing::{debug, info};

/// What to do with a datagram that cannot be decoded with the shared secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeFailurePolicy {
    /// Forward it anyway; the upstream authority makes the decision
    #[default]
    Permit,
    Deny,
}

impl DecodeFailurePolicy {
    pub fn allows(self) -> bool {
        matches!(self, DecodeFailurePolicy::Permit)
    }
}

pub struct AuthContext {
    secret: Bytes,
    modules: Vec<Arc<dyn Module>>,
    pre_auth: Vec<Arc<dyn Module>>,
    authing: Vec<Arc<dyn Module>>,
    accounting: Vec<Arc<dyn Module>>,
    decode_failure: DecodeFailurePolicy,
}

impl AuthContext {
    pub fn new(secret: impl Into<Bytes>) -> Self {
        Self {
            secret: secret.into(),
            modules: Vec::new(),
            pre_auth: Vec::new(),
            authing: Vec::new(),
            accounting: Vec::new(),
            decode_failure: DecodeFailurePolicy::default(),
        }
    }

    /// Override how `authorize` treats undecodable datagrams.
    #[must_use]
    pub fn with_decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    /// File a module under every capability it exposes. Registering the
    /// same instance twice is a no-op.
    pub fn register(&mut self, module: Arc<dyn Module>) {
        let known = self
            .modules
            .iter()
            .any(|m| std::ptr::addr_eq(Arc::as_ptr(m), Arc::as_ptr(&module)));
        if known {
            debug!(plugin = module.name(), "Plugin already registered");
            return;
        }
        if module.pre_auth().is_some() {
            self.pre_auth.push(module.clone());
        }
        if module.authing().is_some() {
            self.authing.push(module.clone());
        }
        if module.accounting().is_some() {
            self.accounting.push(module.clone());
        }
        info!(plugin = module.name(), "Registered plugin");
        self.modules.push(module);
    }

    pub fn has_pre_auth(&self) -> bool {
        !self.pre_auth.is_empty()
    }

    pub fn has_authing(&self) -> bool {
        !self.authing.is_empty()
    }

    pub fn has_accounting(&self) -> bool {
        !self.accounting.is_empty()
    }

    /// Names of the distinct registered modules, in registration order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Decide whether `datagram` may be forwarded upstream.
    ///
    /// Pre-authorization plugins run in order until one denies; observers are
    /// notified of every decoded packet whatever the outcome.
    pub async fn authorize(&self, datagram: &[u8]) -> bool {
        if !self.has_pre_auth() && !self.has_authing() {
            return true;
        }

        let packet = match Packet::decode(datagram, &self.secret) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(error = %e, policy = ?self.decode_failure, "Undecodable auth packet");
                #[cfg(feature = "metrics")]
                if let Some(m) = radgate_observability::relay_metrics() {
                    m.record_undecodable("auth");
                }
                return self.decode_failure.allows();
            }
        };

        let mut allowed = true;
        for module in &self.pre_auth {
            let Some(plugin) = module.pre_auth() else {
                continue;
            };
            if let Err(reason) = plugin.pre(&packet).await {
                debug!(plugin = module.name(), reason = %reason, "Pre-authorization denied");
                allowed = false;
                break;
            }
        }

        for module in &self.authing {
            if let Some(plugin) = module.authing() {
                plugin.auth(&packet).await;
            }
        }

        allowed
    }

    /// Dispatch an accounting datagram. Undecodable input reaches no plugin.
    pub async fn account(&self, datagram: &[u8]) {
        let packet = match Packet::decode(datagram, &self.secret) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(error = %e, "Undecodable accounting packet");
                #[cfg(feature = "metrics")]
                if let Some(m) = radgate_observability::relay_metrics() {
                    m.record_undecodable("accounting");
                }
                return;
            }
        };

        for module in &self.accounting {
            if let Some(plugin) = module.accounting() {
                plugin.account(&packet).await;
            }
        }

        #[cfg(feature = "metrics")]
        if let Some(m) = radgate_observability::relay_metrics() {
            m.accounting_records.inc();
        }
    }

    /// Reload every distinct module once.
    pub fn reload(&self) {
        for module in &self.modules {
            debug!(plugin = module.name(), "Reloading plugin");
            module.reload();
        }
    }
}
