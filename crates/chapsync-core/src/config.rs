use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default distribution-resolution endpoint; the chapter id is appended as a path segment.
pub const DEFAULT_RESOLVE_ENDPOINT: &str = "https://api.mangadex.org/at-home/server";

/// Transport settings handed to the HTTP client (optional `[http]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (resolve call or one page).
    pub timeout_secs: u64,
    /// Optional User-Agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
            user_agent: Some(format!("chapsync/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Global configuration loaded from `~/.config/chapsync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root for per-chapter staging directories. Empty = system temp dir.
    #[serde(default)]
    pub temp_directory: PathBuf,
    /// Maximum page transfers in flight across all chapters.
    pub transfer_slots: usize,
    /// Number of chapter workers.
    pub workers: usize,
    /// Path of the change report. Empty disables reporting.
    #[serde(default)]
    pub export_changes: PathBuf,
    /// Distribution-resolution endpoint.
    #[serde(default = "default_resolve_endpoint")]
    pub resolve_endpoint: String,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_resolve_endpoint() -> String {
    DEFAULT_RESOLVE_ENDPOINT.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            temp_directory: PathBuf::new(),
            transfer_slots: 20,
            workers: 4,
            export_changes: PathBuf::new(),
            resolve_endpoint: default_resolve_endpoint(),
            http: HttpConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Staging root, falling back to the system temp dir when unset.
    pub fn temp_root(&self) -> PathBuf {
        if self.temp_directory.as_os_str().is_empty() {
            std::env::temp_dir()
        } else {
            self.temp_directory.clone()
        }
    }

    /// Report path, or `None` when reporting is disabled.
    pub fn report_path(&self) -> Option<&Path> {
        if self.export_changes.as_os_str().is_empty() {
            None
        } else {
            Some(&self.export_changes)
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chapsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SyncConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SyncConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.transfer_slots, 20);
        assert_eq!(cfg.workers, 4);
        assert!(cfg.report_path().is_none());
        assert_eq!(cfg.resolve_endpoint, DEFAULT_RESOLVE_ENDPOINT);
        assert_eq!(cfg.temp_root(), std::env::temp_dir());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = SyncConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SyncConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.transfer_slots, cfg.transfer_slots);
        assert_eq!(parsed.workers, cfg.workers);
        assert_eq!(parsed.http.timeout_secs, cfg.http.timeout_secs);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            temp_directory = "/var/tmp/chapsync"
            transfer_slots = 8
            workers = 2
            export_changes = "/srv/www/changes.html"

            [http]
            connect_timeout_secs = 5
            timeout_secs = 60
        "#;
        let cfg: SyncConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.transfer_slots, 8);
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.temp_root(), PathBuf::from("/var/tmp/chapsync"));
        assert_eq!(
            cfg.report_path(),
            Some(Path::new("/srv/www/changes.html"))
        );
        assert_eq!(cfg.resolve_endpoint, DEFAULT_RESOLVE_ENDPOINT);
        assert_eq!(cfg.http.connect_timeout(), Duration::from_secs(5));
        assert!(cfg.http.user_agent.is_none());
    }

    #[test]
    fn load_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "transfer_slots = \"many\"").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parse config"));
    }
}
