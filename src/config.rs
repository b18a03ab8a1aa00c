use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub analyzer: AnalyzerConfig,
    pub media: MediaConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzerConfig {
    /// Service bus URL the analysis/coach service is reachable at
    pub url: String,

    /// API credential; when absent, analyzer calls are disabled
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_duration_ms: u64,

    /// Pin capture to a named input device
    pub device: Option<String>,

    /// Also request a camera track where the platform provides one
    pub want_video: bool,

    /// Use the synthetic tone backend instead of real hardware
    pub synthetic: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryConfig {
    /// Path of the JSON archive file
    pub path: String,
}

impl Config {
    /// Load layered configuration: defaults, then an optional config file,
    /// then `PODIUM_*` environment overrides (e.g. PODIUM_ANALYZER__API_KEY).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "podium")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8787)?
            .set_default("analyzer.url", "nats://localhost:4222")?
            .set_default("analyzer.request_timeout_secs", 120)?
            .set_default("media.sample_rate", 16000)?
            .set_default("media.channels", 1)?
            .set_default("media.buffer_duration_ms", 100)?
            .set_default("media.want_video", true)?
            .set_default("media.synthetic", false)?
            .set_default("history.path", "data/history.json")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PODIUM").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
