use chrono::FixedOffset;
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 600 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub upload: UploadSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    pub analytics: AnalyticsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadSettings {
    pub max_bytes: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageSettings {
    /// When unset, samples live only in memory.
    pub journal_path: Option<PathBuf>,
}

/// Which day counts as "today" for windowed analytics.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    /// Local day of the newest stored sample.
    LatestSample,
    /// Wall-clock day in the configured offset.
    Now,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    pub anchor: WindowAnchor,
    pub utc_offset_minutes: i32,
    pub timeline_days: u32,
    pub insight_days: u32,
}

impl AnalyticsSettings {
    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow::anyhow!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
        })
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            anchor: WindowAnchor::LatestSample,
            utc_offset_minutes: 0,
            timeline_days: 30,
            insight_days: 7,
        }
    }
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8000")?
        .set_default("upload.max_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
        .set_default("analytics.anchor", "latest_sample")?
        .set_default("analytics.utc_offset_minutes", 0)?
        .set_default("analytics.timeline_days", 30)?
        .set_default("analytics.insight_days", 7)?)
}

/// Defaults, then `config/server.*` if present, then `HEALTH__…` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(
            config::Environment::with_prefix("HEALTH")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.analytics.utc_offset()?;
    Ok(settings)
}
