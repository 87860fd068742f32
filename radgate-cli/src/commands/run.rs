//! Run subcommand implementation

use anyhow::{Context, Result};
use clap::Args;
use radgate_common::{load_config, load_secret, RelayConfig, Settings, DEFAULT_CONFIG_PATH};
use radgate_core::{AccountingServer, AuthContext, RelayServer};
use radgate_observability::{gather_metrics, init_logging, init_metrics, LoggingConfig};
use radgate_plugin::{PluginContext, PluginRegistry};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH, env = "RADGATE_CONFIG")]
    config: PathBuf,

    /// Instance label, used in log file names
    #[arg(long, env = "RADGATE_INSTANCE")]
    instance: Option<String>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, env = "RADGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long, env = "RADGATE_JSON_LOGS")]
    json_logs: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let (config, settings) = load_config(&args.config)
        .with_context(|| format!("unable to load {}", args.config.display()))?;

    let level = args.log_level.clone().unwrap_or_else(|| {
        if config.debug {
            "debug".to_string()
        } else {
            config.log_level.clone()
        }
    });
    init_logging(&LoggingConfig {
        level,
        json: args.json_logs,
    })?;

    let span = info_span!(
        "radgate",
        instance = args.instance.as_deref().unwrap_or("default")
    );
    serve(config, settings, args.instance)
        .instrument(span)
        .await
}

async fn serve(config: RelayConfig, settings: Settings, instance: Option<String>) -> Result<()> {
    info!("Starting radgate v{}", env!("CARGO_PKG_VERSION"));

    if config.debug {
        warn!("debugging is enabled");
        warn!("dumps from debugging may contain secrets");
        warn!("do NOT share debugging dumps");
    }

    let secret = load_secret(config.secrets_path())
        .with_context(|| format!("unable to load {}", config.secrets_path().display()))?;
    if config.debug {
        debug!(secret = %secret, "Loaded shared secret");
    }

    if let Some(addr) = config.metrics_bind {
        init_metrics().context("unable to register metrics")?;
        spawn_metrics_server(addr);
    }

    let logs = config.logs_dir();
    tokio::fs::create_dir_all(&logs)
        .await
        .with_context(|| format!("unable to create {}", logs.display()))?;

    info!("Initializing plugins");
    let plugin_ctx = PluginContext {
        logs,
        lib: config.dir.clone(),
        instance,
        cache: config.cache,
        settings,
    };
    let modules = PluginRegistry::with_builtins()
        .load_all(&config.plugins, &plugin_ctx)
        .context("unable to load plugins")?;

    let mut context = AuthContext::new(secret);
    for module in modules {
        context.register(module);
    }
    let context = Arc::new(context);

    if config.accounting {
        let server = Arc::new(
            AccountingServer::bind(&config, context)
                .await
                .context("unable to start accounting")?,
        );
        let reloader = server.clone();
        spawn_reload_listener(move || reloader.reload());
        info!("Accounting listening on {}", server.local_addr()?);
        server.run().await?;
    } else {
        let server = Arc::new(
            RelayServer::bind(&config, context)
                .await
                .context("unable to start relay")?,
        );
        let reloader = server.clone();
        spawn_reload_listener(move || reloader.reload());
        info!("Relay listening on {}", server.local_addr()?);
        server.run().await?;
    }

    Ok(())
}

/// Call `reload` on every interrupt signal without stopping the servers.
fn spawn_reload_listener<F>(reload: F)
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(
        async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Unable to listen for reload signal: {}", e);
                    break;
                }
                info!("Reload signal received");
                reload();
            }
        }
        .in_current_span(),
    );
}

fn spawn_metrics_server(addr: SocketAddr) {
    tokio::spawn(async move {
        use axum::{routing::get, Router};
        let app = Router::new()
            .route("/metrics", get(|| async { gather_metrics() }))
            .route("/health/ready", get(|| async { "OK" }));
        info!("Metrics server listening on http://{}", addr);
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app).await {
                    error!("Metrics server error: {}", e);
                }
            }
            Err(e) => error!("Failed to bind metrics server to {}: {}", addr, e),
        }
    });
}
