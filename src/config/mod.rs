use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 4500;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 720;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Observability settings (`[observability]` in config.toml).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// SQL statements slower than this (in ms) are logged at WARN level.
    /// 0 disables slow-query logging.
    pub slow_query_threshold_ms: u64,
}

// ─── AuthConfig ──────────────────────────────────────────────────────────────

/// Token issuance settings (`[auth]` in config.toml).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of issued bearer tokens, in hours. Default: 720 (30 days).
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }
}

// ─── ServerConfig ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the REST server (CAMPUSD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Path to the admissions cutoff CSV. None = start with an empty table.
    pub cutoff_csv: Option<PathBuf>,
    /// How many days before answered counseling questions are pruned (0 = never).
    pub question_prune_days: u32,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    pub log_format: String,
    /// Token issuance settings.
    pub auth: AuthConfig,
    /// Observability: slow query threshold.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        cutoff_csv: Option<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("CAMPUSD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let cutoff_csv = cutoff_csv
            .or(std::env::var("CAMPUSD_CUTOFF_CSV")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from))
            .or(toml.cutoff_csv);

        let question_prune_days = toml.question_prune_days.unwrap_or(0);

        let log_format = std::env::var("CAMPUSD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let auth = toml.auth.unwrap_or_default();
        let observability = toml.observability.unwrap_or_default();

        Self {
            port,
            data_dir,
            log,
            bind_address,
            cutoff_csv,
            question_prune_days,
            log_format,
            auth,
            observability,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/campusd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("campusd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/campusd or ~/.local/share/campusd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("campusd");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("campusd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\campusd
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("campusd");
        }
    }
    // Fallback
    PathBuf::from(".campusd")
}

// ─── TOML file layer ─────────────────────────────────────────────────────────

/// Raw shape of `config.toml`. Every field is optional — absent fields fall
/// through to env vars or built-in defaults.
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    port: Option<u16>,
    log: Option<String>,
    bind_address: Option<String>,
    cutoff_csv: Option<PathBuf>,
    question_prune_days: Option<u32>,
    log_format: Option<String>,
    auth: Option<AuthConfig>,
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            // A malformed config file must not silently vanish — surface the
            // parse error, then run on defaults.
            tracing::warn!(path = %path.display(), err = %e, "config.toml is invalid — using defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.auth.token_ttl_hours, DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(cfg.question_prune_days, 0);
    }

    #[test]
    fn cli_overrides_beat_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 9000\nlog = \"debug\"\n\n[auth]\ntoken_ttl_hours = 24\n",
        )
        .unwrap();
        let cfg = ServerConfig::new(
            Some(4800),
            Some(dir.path().to_path_buf()),
            None,
            None,
            None,
        );
        assert_eq!(cfg.port, 4800); // CLI wins
        assert_eq!(cfg.log, "debug"); // TOML fills the gap
        assert_eq!(cfg.auth.token_ttl_hours, 24);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number").unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
