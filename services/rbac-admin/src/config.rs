use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

// Service configuration sourced from environment variables, optionally
// overridden by a YAML file named in RBAC_ADMIN_CONFIG.
#[derive(Debug, Clone)]
pub struct RbacAdminConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub seed_demo: bool,
    pub lowercase_commands: bool,
}

#[derive(Debug, Deserialize)]
struct RbacAdminConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres_url: Option<String>,
    postgres_max_connections: Option<u32>,
    seed_demo: Option<bool>,
    lowercase_commands: Option<bool>,
}

impl RbacAdminConfig {
    pub fn from_env() -> Result<Self> {
        let metrics_bind = std::env::var("RBAC_ADMIN_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse RBAC_ADMIN_METRICS_BIND")?;
        let bind_addr = std::env::var("RBAC_ADMIN_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| "parse RBAC_ADMIN_BIND")?;
        let storage = match std::env::var("RBAC_ADMIN_STORAGE") {
            Ok(value) => StorageBackend::parse(&value).with_context(|| "parse RBAC_ADMIN_STORAGE")?,
            Err(_) => StorageBackend::Memory,
        };
        let postgres = match std::env::var("RBAC_ADMIN_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "RBAC_ADMIN_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "RBAC_ADMIN_PG_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "RBAC_ADMIN_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_TIMEOUT_MS,
                )?,
            }),
            Err(_) => None,
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            seed_demo: env_parse("RBAC_ADMIN_SEED_DEMO", false)?,
            lowercase_commands: env_parse("RBAC_ADMIN_LOWERCASE_COMMANDS", true)?,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("RBAC_ADMIN_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read RBAC_ADMIN_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: RbacAdminConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse rbac admin config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = StorageBackend::parse(&value).with_context(|| "parse storage")?;
        }
        if let Some(url) = override_cfg.postgres_url {
            let pg = self.postgres.get_or_insert_with(|| PostgresConfig {
                url: String::new(),
                max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                connect_timeout_ms: DEFAULT_PG_TIMEOUT_MS,
                acquire_timeout_ms: DEFAULT_PG_TIMEOUT_MS,
            });
            pg.url = url;
        }
        if let Some(value) = override_cfg.postgres_max_connections {
            if let Some(pg) = self.postgres.as_mut() {
                pg.max_connections = value;
            }
        }
        if let Some(value) = override_cfg.seed_demo {
            self.seed_demo = value;
        }
        if let Some(value) = override_cfg.lowercase_commands {
            self.lowercase_commands = value;
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
