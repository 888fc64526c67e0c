use std::time::Duration;

use anyhow::anyhow;
use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub member: MemberConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Apply pending migrations when the server starts.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

/// Member core tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberConfig {
    /// Per repository call deadline; unset means no deadline.
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
    /// Buffer size of the in-process registration broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for MemberConfig {
    fn default() -> Self {
        Self { query_timeout_ms: None, event_capacity: default_event_capacity() }
    }
}

impl MemberConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_log_format() -> String { "compact".into() }
fn default_event_capacity() -> usize { 64 }

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Like [`load_from_file`], but a file that does not exist yields defaults. Unreadable or
/// malformed files are still errors.
pub fn load_from_file_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).with_context(|| format!("invalid config file {path}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow::Error::new(e).context(format!("cannot read config file {path}"))),
    }
}

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`). Only a missing file falls back to defaults plus
    /// environment, so a bare `DATABASE_URL` is enough to boot.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_from_file_or_default(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.logging.normalize();
        self.member.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // the file wins; the environment only fills a missing URL
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        let f = self.format.trim().to_lowercase();
        self.format = if f == "json" { f } else { default_log_format() };
    }
}

impl MemberConfig {
    fn validate(&self) -> Result<()> {
        if self.query_timeout_ms == Some(0) {
            return Err(anyhow!("member.query_timeout_ms must be > 0 when set"));
        }
        if self.event_capacity == 0 {
            return Err(anyhow!("member.event_capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [database]
        url = "postgres://u:p@localhost:5432/member"
        max_connections = 5
        min_connections = 1

        [logging]
        format = "JSON"

        [member]
        query_timeout_ms = 1500
    "#;

    #[test]
    fn parses_full_file() {
        let mut cfg = parse(SAMPLE).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.database.acquire_timeout_secs, 30);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.member.query_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(cfg.member.event_capacity, 64);
    }

    #[test]
    fn defaults_when_sections_missing() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.logging.format, "compact");
        assert!(cfg.member.query_timeout().is_none());
    }

    #[test]
    fn rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let db = DatabaseConfig {
            url: "postgres://localhost/x".into(),
            max_connections: 1,
            min_connections: 2,
            ..Default::default()
        };
        assert!(db.validate().is_err());
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{name}-{}.toml", std::process::id()))
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_path("configs-missing");
        let cfg = load_from_file_or_default(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_path("configs-malformed");
        std::fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();
        let res = load_from_file_or_default(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        let err = res.unwrap_err();
        assert!(err.to_string().contains("invalid config file"), "{err:#}");
    }

    #[test]
    fn rejects_zero_query_timeout() {
        let m = MemberConfig { query_timeout_ms: Some(0), ..Default::default() };
        assert!(m.validate().is_err());
    }
}
