use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use podium::analyzer::{Analyzer, DisabledAnalyzer, NatsAnalyzer};
use podium::history::HistoryStore;
use podium::media::{CaptureConfig, CaptureSource};
use podium::session::SessionStateMachine;
use podium::{create_router, AppState, Config};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "podium", about = "Public-speaking practice backend")]
struct Args {
    /// Configuration file (without extension), e.g. config/podium
    #[arg(long, default_value = "config/podium")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let analyzer: Arc<dyn Analyzer> = match cfg.analyzer.api_key.clone() {
        Some(api_key) => {
            let client = NatsAnalyzer::connect(
                &cfg.analyzer.url,
                api_key,
                Duration::from_secs(cfg.analyzer.request_timeout_secs),
            )
            .await
            .context("Failed to reach the analysis service")?;
            Arc::new(client)
        }
        None => {
            warn!("No analyzer API credential configured, analysis calls are disabled");
            Arc::new(DisabledAnalyzer)
        }
    };

    let history = Arc::new(HistoryStore::new(&cfg.history.path));
    let machine = SessionStateMachine::new(Arc::clone(&analyzer), Arc::clone(&history));

    let capture_source = if cfg.media.synthetic {
        CaptureSource::Synthetic {
            frequency_hz: 440.0,
            amplitude: 0.4,
        }
    } else {
        CaptureSource::Device(cfg.media.device.clone())
    };
    let capture_config = CaptureConfig {
        sample_rate: cfg.media.sample_rate,
        channels: cfg.media.channels,
        buffer_duration_ms: cfg.media.buffer_duration_ms,
        want_video: cfg.media.want_video,
    };

    let state = AppState::new(machine, analyzer, capture_source, capture_config);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
