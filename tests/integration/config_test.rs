use radgate_common::{load_config, RelayError};
use radgate_plugin::{PluginContext, PluginError, PluginRegistry};
use radgate_tests::LibDir;

#[test]
fn test_config_file_defaults() {
    let lib = LibDir::new();
    let path = lib.path().join("radgate.toml");
    std::fs::write(&path, "plugins = ['usermac', 'logger']\nusermac_callback = ['/bin/true']\n")
        .unwrap();

    let (config, settings) = load_config(&path).unwrap();
    assert!(!config.accounting);
    assert_eq!(config.listen_port(), 1812);
    assert_eq!(config.upstream(), "localhost:1814");
    assert_eq!(config.plugins, vec!["usermac", "logger"]);
    assert_eq!(settings.get_array("usermac_callback"), vec!["/bin/true"]);
}

#[test]
fn test_missing_config_file() {
    let lib = LibDir::new();
    let err = load_config(lib.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, RelayError::Io(_) | RelayError::Config(_)));
}

#[tokio::test]
async fn test_unknown_plugin_is_fatal() {
    let lib = LibDir::new();
    let (config, settings) = lib.config("plugins = ['usermac', 'radius-magic']");
    let ctx = PluginContext {
        logs: config.logs_dir(),
        lib: config.dir.clone(),
        settings,
        ..Default::default()
    };
    let err = PluginRegistry::with_builtins()
        .load_all(&config.plugins, &ctx)
        .err()
        .unwrap();
    assert!(matches!(err, PluginError::UnknownPlugin(name) if name == "radius-magic"));
}

#[tokio::test]
async fn test_context_from_config() {
    let lib = LibDir::new();
    let (config, settings) = lib.config("plugins = ['usermac', 'logger', 'trace']");
    let context = lib.context(&config, settings);
    assert_eq!(context.module_names(), vec!["usermac", "logger", "trace"]);
    assert!(context.has_pre_auth());
    assert!(context.has_authing());
    assert!(context.has_accounting());
}
