//! dlnacast server - headless UPnP control point and media server.
//!
//! Loads a static device list and a local library from YAML, serves the
//! library to renderers and exposes the playback orchestrator over a JSON
//! control API.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dlnacast_core::{
    bootstrap_services_with_network, start_server, AppState, ContentId, LocalIpDetector,
    NetworkContext,
};
use tokio::signal;

use crate::config::ServerConfig;

/// dlnacast server - UPnP/DLNA control point and media server.
#[derive(Parser, Debug)]
#[command(name = "dlnacast-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "DLNACAST_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "DLNACAST_BIND_PORT")]
    port: Option<u16>,

    /// Advertise IP address (overrides config file).
    #[arg(short = 'a', long, env = "DLNACAST_ADVERTISE_IP")]
    advertise_ip: Option<std::net::IpAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("dlnacast server v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(ip) = args.advertise_ip {
        config.advertise_ip = Some(ip);
    }

    // Resolve advertise IP: use explicit config, or fall back to auto-detection
    let network = if let Some(ip) = config.advertise_ip {
        log::info!(
            "Configuration: bind_port={}, advertise_ip={}",
            config.bind_port,
            ip
        );
        NetworkContext::explicit(config.bind_port, ip)
    } else {
        log::info!(
            "Configuration: bind_port={}, advertise_ip=auto",
            config.bind_port
        );
        NetworkContext::auto_detect(config.bind_port, LocalIpDetector::arc()).context(
            "Failed to auto-detect local IP address. \
             Please specify --advertise-ip or set DLNACAST_ADVERTISE_IP to the IP \
             address that renderers can reach.",
        )?
    };

    let core_config = config.to_core_config();
    let index = Arc::new(config.build_index());
    log::info!(
        "Library: {} servable file(s), {} configured device(s)",
        index.len(),
        config.devices.len()
    );

    let services = bootstrap_services_with_network(
        &core_config,
        network.clone(),
        index,
        config.devices.clone(),
        tokio::runtime::Handle::current(),
    )
    .context("Failed to bootstrap services")?;

    services.start_background_tasks();
    log::info!("Services bootstrapped successfully");

    // Registered before the server can assign the port
    let port_assigned = network.port_notify.notified();
    tokio::pin!(port_assigned);
    port_assigned.as_mut().enable();

    let app_state = AppState::new(&services);
    let cancel = services.cancel_token.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(app_state, cancel).await {
            log::error!("Server error: {}", e);
        }
    });

    tokio::select! {
        _ = &mut port_assigned => log_media_urls(&config, &network),
        _ = tokio::time::sleep(Duration::from_secs(5)) => {
            log::warn!("HTTP server did not report a port, media URLs not listed");
        }
    }

    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");
    services.shutdown();

    if let Err(e) = server_handle.await {
        log::warn!("Server task ended abnormally: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

fn log_media_urls(config: &ServerConfig, network: &NetworkContext) {
    for entry in &config.library {
        if let Some(id) = ContentId::new(entry.kind, entry.id) {
            log::info!(
                "[Library] {} -> {}",
                entry.path.display(),
                network.media_url(id, entry.extension())
            );
        }
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
