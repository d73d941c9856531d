//! Startup configuration, read from the environment once.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flashweb_auth::{MAX_EXPIRE_MINUTES, TokenOptions};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_SQLITE_FILE: &str = "App.db";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0:?} requires DATABASE_URL")]
    MissingDatabaseUrl(DatabaseKind),

    #[error("{0:?} is not supported by this build")]
    UnsupportedDatabase(DatabaseKind),
}

/// Relational backends the user store can be pointed at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseKind {
    Mysql,
    Postgresql,
    Sqlite,
    Sqlserver,
}

impl FromStr for DatabaseKind {
    type Err = ();

    /// Case-insensitive match on the variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "postgresql" => Ok(Self::Postgresql),
            "sqlite" => Ok(Self::Sqlite),
            "sqlserver" => Ok(Self::Sqlserver),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,
    pub url: String,
}

impl DatabaseConfig {
    /// SQLite file under `base_dir`, created on first connect.
    pub fn default_sqlite(base_dir: &Path) -> Self {
        Self {
            kind: DatabaseKind::Sqlite,
            url: format!(
                "sqlite://{}?mode=rwc",
                base_dir.join(DEFAULT_SQLITE_FILE).to_string_lossy()
            ),
        }
    }
}

/// Credentials of an administrator created at startup if missing.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub development: bool,
    /// Root for the log directory and the default SQLite file.
    pub base_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub token: TokenOptions,
    pub database: DatabaseConfig,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let development =
            get("FLASHWEB_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"));
        let base_dir = base_dir(development);

        let bind_raw = get("FLASHWEB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "FLASHWEB_BIND",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let mut token = TokenOptions::default();
        if let Some(v) = get("TOKEN_SECRET_KEY") {
            token.secret_key = v;
        }
        if let Some(v) = get("TOKEN_ISSUER") {
            token.issuer = v;
        }
        if let Some(v) = get("TOKEN_AUDIENCE") {
            token.audience = v;
        }
        if let Some(v) = get("TOKEN_EXPIRE_MINUTES") {
            token.expire_minutes = match v.parse::<i64>() {
                Ok(minutes) if (1..=MAX_EXPIRE_MINUTES).contains(&minutes) => minutes,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "TOKEN_EXPIRE_MINUTES",
                        value: v,
                        reason: format!("must be between 1 and {MAX_EXPIRE_MINUTES}"),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: "TOKEN_EXPIRE_MINUTES",
                        value: v,
                        reason: e.to_string(),
                    });
                }
            };
        }
        let token = token.with_generated_defaults();

        let database = database_config(
            get("DATABASE_KIND").and_then(|k| k.parse().ok()),
            get("DATABASE_URL"),
            &base_dir,
        )?;

        let admin = match (get("FLASHWEB_ADMIN_USERNAME"), get("FLASHWEB_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            _ => None,
        };

        Ok(Self {
            development,
            base_dir,
            bind_addr,
            token,
            database,
            admin,
        })
    }
}

/// Unknown or missing kinds fall back to the bundled SQLite file.
fn database_config(
    kind: Option<DatabaseKind>,
    url: Option<String>,
    base_dir: &Path,
) -> Result<DatabaseConfig, ConfigError> {
    match kind {
        None => Ok(DatabaseConfig::default_sqlite(base_dir)),
        Some(DatabaseKind::Sqlserver) => {
            Err(ConfigError::UnsupportedDatabase(DatabaseKind::Sqlserver))
        }
        Some(DatabaseKind::Sqlite) => Ok(match url {
            Some(url) => DatabaseConfig {
                kind: DatabaseKind::Sqlite,
                url,
            },
            None => DatabaseConfig::default_sqlite(base_dir),
        }),
        Some(kind) => url
            .map(|url| DatabaseConfig { kind, url })
            .ok_or(ConfigError::MissingDatabaseUrl(kind)),
    }
}

/// Working directory in development, the executable's directory otherwise.
fn base_dir(development: bool) -> PathBuf {
    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if development {
        return cwd();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(cwd)
}
