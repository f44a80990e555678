use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "openapi")]
use std::fs;

use tracing::{debug, info, warn};

use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use anyhow::anyhow;

use voicebot_gateway::{
    ServerConfig, SessionStore,
    routes,
    smoke::{self, SmokeTestOptions},
    state::AppState,
};

/// Rates at or above this disable the limiter (load testing).
const UNLIMITED_RATE: u32 = 100_000;

/// Upper bound on how often idle sessions are swept.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Voicebot Gateway - Twilio voice webhooks answered by a chat-completion model
#[derive(Parser, Debug)]
#[command(name = "voicebot-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send synthetic webhooks to a running gateway
    SmokeTest {
        /// Gateway base URL
        #[arg(long = "base-url", default_value = "http://localhost:5000")]
        base_url: String,

        /// Utterance to send as one speech turn
        #[arg(long = "speech")]
        speech: Option<String>,
    },

    /// Generate OpenAPI specification
    #[cfg(feature = "openapi")]
    Openapi {
        /// Output format (yaml or json)
        #[arg(short = 'f', long = "format", default_value = "yaml")]
        format: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Crypto provider for TLS (outbound HTTPS and the optional TLS listener)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Commands::SmokeTest { base_url, speech } => {
                smoke::run(SmokeTestOptions {
                    base_url,
                    speech,
                    ..Default::default()
                })
                .await?;
                return Ok(());
            }
            #[cfg(feature = "openapi")]
            Commands::Openapi { format, output } => {
                let spec_content = match format.as_str() {
                    "yaml" => voicebot_gateway::docs::openapi::spec_yaml()
                        .map_err(|e| anyhow!("Failed to generate OpenAPI YAML: {}", e))?,
                    "json" => voicebot_gateway::docs::openapi::spec_json()
                        .map_err(|e| anyhow!("Failed to generate OpenAPI JSON: {}", e))?,
                    other => {
                        anyhow::bail!("Invalid format '{}'. Must be 'yaml' or 'json'", other)
                    }
                };

                if let Some(output_path) = output {
                    fs::write(&output_path, &spec_content).map_err(|e| {
                        anyhow!("Failed to write to {}: {}", output_path.display(), e)
                    })?;
                    println!("OpenAPI spec written to {}", output_path.display());
                } else {
                    println!("{}", spec_content);
                }

                return Ok(());
            }
        }
    }

    // Load configuration from file or environment
    let config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    if config.has_default_session_secret() {
        warn!("SESSION_SECRET is unset or still the default value; set a unique secret");
    }

    let address = config.address();
    let tls_config = config.tls.clone();
    let rate_limit_rps = config.rate_limit_requests_per_second;
    let rate_limit_burst = config.rate_limit_burst_size;
    let cors_origins = config.cors_allowed_origins.clone();
    let session_ttl = config.session_ttl();
    println!("Starting server on {address}");

    let app_state = AppState::new(config).await;

    if let Some(ttl) = session_ttl {
        spawn_session_sweeper(app_state.sessions.clone(), ttl);
    }

    let governor_layer = if rate_limit_rps < UNLIMITED_RATE {
        let governor_config = GovernorConfigBuilder::default()
            .per_second(rate_limit_rps as u64)
            .burst_size(rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limiter settings (rate and burst must be > 0)"))?;
        Some(GovernorLayer::new(governor_config))
    } else {
        info!("Rate limiting disabled (rate >= {UNLIMITED_RATE}/s)");
        None
    };
    let cors_layer = cors_layer(cors_origins.as_deref());

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    let app = routes::create_app_router(app_state)
        .layer(cors_layer)
        .layer(tower::util::option_layer(governor_layer))
        .layer(security_headers);

    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    if let Some(tls) = tls_config {
        let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(|e| {
                anyhow!(
                    "Failed to load TLS certificates from {} and {}: {}",
                    tls.cert_path.display(),
                    tls.key_path.display(),
                    e
                )
            })?;

        println!("Server listening on https://{} (TLS enabled)", socket_addr);

        axum_server::bind_rustls(socket_addr, rustls_config)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|e| anyhow!("TLS server error: {}", e))?;
    } else {
        println!("Server listening on http://{}", socket_addr);

        let listener = TcpListener::bind(&socket_addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }

    Ok(())
}

/// CORS for the dashboard. Twilio webhooks are server-to-server and unaffected.
fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    match origins {
        Some("*") => base.allow_origin(Any).allow_credentials(false),
        Some(list) => {
            let origins: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            base.allow_origin(origins).allow_credentials(true)
        }
        None => {
            info!("CORS_ALLOWED_ORIGINS not set; dashboard is same-origin only");
            base.allow_credentials(false)
        }
    }
}

/// Periodically drop sessions whose call-end webhook never arrived.
fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>, ttl: Duration) {
    let period = (ttl / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
    info!(
        ttl_secs = ttl.as_secs(),
        period_secs = period.as_secs(),
        "Idle session sweeper started"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match sessions.evict_idle(ttl).await {
                Ok(0) => debug!("No idle sessions"),
                Ok(removed) => info!(removed, "Removed idle call sessions"),
                Err(e) => warn!("Idle session sweep failed: {}", e),
            }
        }
    });
}
