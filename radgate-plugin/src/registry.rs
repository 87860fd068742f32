use crate::builtin::{LoggerPlugin, StatsPlugin, TracePlugin, UserMacPlugin};
use crate::traits::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds a plugin instance from the shared setup context
pub type PluginFactory =
    Box<dyn Fn(&PluginContext) -> Result<Arc<dyn Module>, PluginError> + Send + Sync>;

/// Registry maps configured plugin names to their constructors
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in plugin
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(UserMacPlugin::NAME, |ctx| {
            Ok(Arc::new(UserMacPlugin::setup(ctx)?) as Arc<dyn Module>)
        });
        registry.register(LoggerPlugin::NAME, |ctx| {
            Ok(Arc::new(LoggerPlugin::setup(ctx)?) as Arc<dyn Module>)
        });
        registry.register(StatsPlugin::NAME, |ctx| {
            Ok(Arc::new(StatsPlugin::setup(ctx)?) as Arc<dyn Module>)
        });
        registry.register(TracePlugin::NAME, |ctx| {
            Ok(Arc::new(TracePlugin::setup(ctx)?) as Arc<dyn Module>)
        });
        registry
    }

    /// Register a constructor, replacing any previous one under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginContext) -> Result<Arc<dyn Module>, PluginError> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct and set up a single plugin
    pub fn load(&self, name: &str, ctx: &PluginContext) -> Result<Arc<dyn Module>, PluginError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::UnknownPlugin(name.to_string()))?;
        tracing::info!("Loading plugin: {}", name);
        factory(ctx)
    }

    /// Construct plugins in the configured order. Any failure aborts the whole load.
    pub fn load_all<S: AsRef<str>>(
        &self,
        names: &[S],
        ctx: &PluginContext,
    ) -> Result<Vec<Arc<dyn Module>>, PluginError> {
        names
            .iter()
            .map(|name| self.load(name.as_ref(), ctx))
            .collect()
    }
}
