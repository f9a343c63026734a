//! Configuration loading: bootstrap TOML file + CLI overrides + database
//! runtime settings, following `wkmp-ap`'s layering.

use crate::error::Error;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub database_path: PathBuf,

    #[serde(default)]
    pub media_root: Option<PathBuf>,

    #[serde(default = "default_gstreamer_bin")]
    pub gstreamer_bin: String,

    #[serde(default)]
    pub icecast_url: Option<String>,

    #[serde(default)]
    pub icecast_source_password: Option<String>,

    #[serde(default)]
    pub webrtc_enabled: bool,

    #[serde(default = "default_webrtc_rtp_port_base")]
    pub webrtc_rtp_port_base: u16,

    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_gstreamer_bin() -> String {
    "gst-launch-1.0".to_string()
}

fn default_webrtc_rtp_port_base() -> u16 {
    42000
}

fn default_tick_interval_ms() -> u64 {
    250
}

fn default_port() -> u16 {
    5730
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub gstreamer_bin: String,
    pub icecast_url: Option<String>,
    pub icecast_source_password: Option<String>,
    pub webrtc_enabled: bool,
    pub webrtc_rtp_port_base: u16,
    pub tick_interval_ms: u64,
    pub port: u16,
    pub db_pool: Option<SqlitePool>,
}

impl Config {
    pub async fn load(
        config_path: &PathBuf,
        database_override: Option<PathBuf>,
        port_override: Option<u16>,
        media_root_override: Option<PathBuf>,
    ) -> crate::Result<Self> {
        let toml_str = tokio::fs::read_to_string(config_path)
            .await
            .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;

        let toml_config: TomlConfig = toml::from_str(&toml_str)
            .map_err(|e| Error::Config(format!("failed to parse TOML: {e}")))?;

        let database_path = database_override.unwrap_or(toml_config.database_path);
        let port = port_override.unwrap_or(toml_config.port);
        let media_root = media_root_override.or(toml_config.media_root);

        let db_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let db_pool = SqlitePool::connect(&db_url).await.map_err(Error::Database)?;

        let media_root = match media_root {
            Some(root) => root,
            None => wkmp_common::config::resolve_root_folder(None, "WKMP_MEDIA_ROOT", Some("media_root"))
                .map_err(|e| Error::Config(e.to_string()))?,
        };

        Ok(Config {
            database_path,
            media_root,
            gstreamer_bin: toml_config.gstreamer_bin,
            icecast_url: toml_config.icecast_url,
            icecast_source_password: toml_config.icecast_source_password,
            webrtc_enabled: toml_config.webrtc_enabled,
            webrtc_rtp_port_base: toml_config.webrtc_rtp_port_base,
            tick_interval_ms: toml_config.tick_interval_ms,
            port,
            db_pool: Some(db_pool),
        })
    }

    pub fn db_pool(&self) -> &SqlitePool {
        self.db_pool.as_ref().expect("database pool not initialized")
    }
}
