use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

pub const MEMORIAL_HOME_ENV: &str = "MEMORIAL_HOME";
pub const TOKEN_SECRET_ENV: &str = "MEMORIAL_TOKEN_SECRET";
pub const LISTEN_ADDR_ENV: &str = "MEMORIAL_LISTEN_ADDR";

const CONFIG_FILE: &str = "config.toml";
const DATA_SUBDIR: &str = "data";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5001";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Returns `$MEMORIAL_HOME` when set, otherwise `~/.memorial`. The directory
/// is not required to exist.
pub fn find_memorial_home() -> std::io::Result<PathBuf> {
    if let Some(home) = std::env::var_os(MEMORIAL_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    let mut home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "could not find home directory",
        )
    })?;
    home.push(".memorial");
    Ok(home)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigToml {
    listen_addr: Option<SocketAddr>,
    token_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    audit_mirror: Option<bool>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub memorial_home: PathBuf,
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub token_secret: Option<String>,
    pub token_ttl: Duration,
    /// Whether grants also write the `roles_admin` mirror.
    pub audit_mirror: bool,
}

impl Config {
    /// Loads `config.toml` from `memorial_home` (if present) and applies
    /// environment overrides on top.
    pub fn load(memorial_home: &Path) -> anyhow::Result<Self> {
        let path = memorial_home.join(CONFIG_FILE);
        let parsed = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<ConfigToml>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => ConfigToml::default(),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        Self::from_toml(memorial_home, parsed)
    }

    fn from_toml(memorial_home: &Path, parsed: ConfigToml) -> anyhow::Result<Self> {
        let listen_addr = match std::env::var(LISTEN_ADDR_ENV) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {LISTEN_ADDR_ENV}: {raw}"))?,
            Err(_) => match parsed.listen_addr {
                Some(addr) => addr,
                None => DEFAULT_LISTEN_ADDR.parse()?,
            },
        };
        let token_secret = std::env::var(TOKEN_SECRET_ENV)
            .ok()
            .or(parsed.token_secret)
            .filter(|secret| !secret.is_empty());
        let data_dir = match parsed.data_dir {
            Some(dir) if dir.is_relative() => memorial_home.join(dir),
            Some(dir) => dir,
            None => memorial_home.join(DATA_SUBDIR),
        };

        Ok(Self {
            memorial_home: memorial_home.to_path_buf(),
            data_dir,
            listen_addr,
            token_secret,
            token_ttl: Duration::from_secs(parsed.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS)),
            audit_mirror: parsed.audit_mirror.unwrap_or(true),
        })
    }

    pub fn load_default() -> anyhow::Result<Self> {
        let home = find_memorial_home().context("failed to resolve MEMORIAL_HOME")?;
        Self::load(&home)
    }

    pub fn require_token_secret(&self) -> anyhow::Result<&str> {
        self.token_secret.as_deref().with_context(|| {
            format!("no token secret configured: set {TOKEN_SECRET_ENV} or token_secret in {CONFIG_FILE}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn parses_config_file() {
        let parsed: ConfigToml = toml::from_str(
            r#"
listen_addr = "0.0.0.0:8080"
token_secret = "s3cret"
token_ttl_secs = 120
audit_mirror = false
data_dir = "store"
"#,
        )
        .expect("valid toml");
        let home = TempDir::new().expect("tempdir");

        let config = Config::from_toml(home.path(), parsed).expect("config");
        assert_eq!(config.data_dir, home.path().join("store"));
        assert_eq!(config.token_ttl, Duration::from_secs(120));
        assert!(!config.audit_mirror);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let home = TempDir::new().expect("tempdir");
        let config = Config::load(home.path()).expect("config");

        assert_eq!(config.data_dir, home.path().join("data"));
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert!(config.audit_mirror);
    }

    #[test]
    fn rejects_unparseable_file() {
        let home = TempDir::new().expect("tempdir");
        std::fs::write(home.path().join("config.toml"), "token_ttl_secs = \"soon\"").expect("write");

        let err = Config::load(home.path()).expect_err("bad ttl type");
        assert!(err.to_string().contains("failed to parse"));
    }
}
