//! scout content server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use scout_core::config::{AppConfig, PrivateKeyConfig, SigningConfig};
use scout_server::state::{build_resolver, spawn_cache_purge_task};
use scout_server::{AppState, create_router};
use scout_signer::{ContentSigner, SecretKey};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// scoutd - signed script and binary distribution server
#[derive(Parser, Debug)]
#[command(name = "scoutd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SCOUT_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("scoutd v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    scout_server::metrics::register_metrics();
    tracing::info!("Prometheus metrics registered");

    // No key, no serving.
    let signer = load_signer(&config.signing).await?;

    let resolver = build_resolver(&config).context("failed to initialize content resolver")?;
    resolver
        .health_check()
        .await
        .context("content backend health check failed")?;
    tracing::info!(
        mode = ?config.content.mode,
        backend = resolver.backend_name(),
        fallback_to_local = config.content.fallback_to_local,
        "Content resolver initialized"
    );

    let state = AppState::new(config.clone(), resolver, signer);

    if let Some(interval) = state.cache_purge_interval() {
        spawn_cache_purge_task(state.resolver.clone(), interval);
        tracing::info!(
            interval_secs = interval.as_secs(),
            "Cache purge task spawned"
        );
    }

    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration: optional TOML file, then `SCOUT_` environment
/// variables, then the legacy `USE_GITHUB` flag.
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if std::path::Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}, using defaults and environment", path);
    }

    let mut config: AppConfig = figment
        .merge(Env::prefixed("SCOUT_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;

    let legacy = std::env::var("USE_GITHUB").ok();
    if legacy.is_some() {
        tracing::info!(use_github = ?legacy, "Applying legacy USE_GITHUB content mode flag");
    }
    config.content.apply_legacy_mode_flag(legacy.as_deref());

    Ok(config)
}

/// Load the content signer from configuration.
async fn load_signer(config: &SigningConfig) -> Result<ContentSigner> {
    let secret = match &config.private_key {
        PrivateKeyConfig::File { path } => {
            let pem = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read key file: {}", path.display()))?;
            let secret = SecretKey::from_pem(&pem).context("failed to parse signing key")?;
            tracing::info!(path = %path.display(), "Loaded signing key from file");
            secret
        }
        PrivateKeyConfig::Env { var } => {
            let pem = std::env::var(var)
                .with_context(|| format!("signing key env var not set: {var}"))?;
            let secret = SecretKey::from_pem(&pem).context("failed to parse signing key")?;
            tracing::info!(var = %var, "Loaded signing key from env");
            secret
        }
        PrivateKeyConfig::Value { key } => {
            tracing::warn!("Using inline signing key (not recommended for production)");
            SecretKey::from_pem(key).context("failed to parse signing key")?
        }
        PrivateKeyConfig::Generate { bits } => {
            tracing::warn!("Generating ephemeral signing key (not suitable for production)");
            let bits = *bits;
            tokio::task::spawn_blocking(move || SecretKey::generate(bits))
                .await
                .context("key generation task failed")?
                .context("failed to generate signing key")?
        }
    };

    let signer = ContentSigner::new(secret);
    let public_key = signer.public_key();
    tracing::info!(
        fingerprint = %public_key.fingerprint().context("failed to encode public key")?,
        "Signing key ready"
    );
    if matches!(config.private_key, PrivateKeyConfig::Generate { .. }) {
        tracing::info!(
            "Public key:\n{}",
            public_key.to_pem().context("failed to encode public key")?
        );
    }
    Ok(signer)
}
