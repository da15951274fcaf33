//! Standalone client binary.
//!
//! Usage:
//!   cargo run -p stellar_client -- [--addr 127.0.0.1:16383] [--config client.json] [--name Pilot]
//!
//! Connects to the authority, performs the blocking world fetch, then runs
//! the cooperative frame loop headless (the graphics backend plugs in behind
//! the `RenderSink` seam). Ctrl-C requests a graceful disconnect.

use std::env;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use stellar_client::frame::{FrameDriver, NullSink};
use stellar_client::input::InputIntent;
use stellar_client::session::Session;
use stellar_shared::config::ClientConfig;
use tracing::{error, info};

fn parse_args() -> anyhow::Result<ClientConfig> {
    let args: Vec<String> = env::args().collect();
    let mut cfg = ClientConfig::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                let raw = std::fs::read_to_string(&args[i + 1])
                    .with_context(|| format!("read config {}", args[i + 1]))?;
                cfg = ClientConfig::from_json_str(&raw).context("parse config")?;
                i += 2;
            }
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.player_name = args[i + 1].clone();
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args()?;
    let server: SocketAddr = cfg.server_addr.parse().context("parse server_addr")?;
    info!(server = %server, name = %cfg.player_name, "starting client");

    // Startup failures are fatal: there is nothing to render without a world.
    let mut session = match Session::connect(server, &cfg).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "could not connect");
            anyhow::bail!("connect: {e}");
        }
    };

    match session.local_port() {
        Ok(port) => info!(server = %session.server_addr(), local_port = port, "session established"),
        Err(e) => info!(server = %session.server_addr(), error = %e, "session established"),
    }

    let bodies = match session.fetch_initial_world(cfg.fetch_attempts).await {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "world fetch failed");
            session.disconnect_gracefully(Duration::from_millis(200)).await;
            anyhow::bail!("fetch world: {e}");
        }
    };
    info!(bodies = bodies.len(), "world received");

    let run = Arc::new(AtomicBool::new(true));
    {
        let run = run.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("quit requested");
            run.store(false, Ordering::Relaxed);
        });
    }

    let mut driver = FrameDriver::new(session, bodies, &cfg);
    let mut sink = NullSink;
    let tick_interval = Duration::from_secs_f32(1.0 / cfg.tick_hz as f32);
    let mut last_tick = Instant::now();

    while run.load(Ordering::Relaxed) && !driver.quit_requested() {
        let now = Instant::now();
        let dt = (now - last_tick).as_secs_f32();
        last_tick = now;

        // Headless intent; a windowing frontend would sample the keyboard
        // here, fill in speed-scaled deltas, and set `quit` on Escape.
        driver.step(InputIntent::default(), dt).await;
        driver.render_to(&mut sink);

        tokio::time::sleep(tick_interval).await;
    }

    driver.shutdown(Duration::from_millis(500)).await;
    info!("client stopped");
    Ok(())
}
