use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:5000";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted Supabase project over PostgREST
    Supabase,
    /// In-process tables, lost on restart
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Supabase => write!(f, "supabase"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    pub store: StoreBackend,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub store_timeout: Duration,
    pub graceful_shutdown_timeout: Duration,
    /// Recompute pet status after each application write.
    pub sync_pet_status: bool,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_bind_address: default_bind(),
            store: StoreBackend::Memory,
            store_url: None,
            store_api_key: None,
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            graceful_shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            sync_pet_status: true,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            store: cli_store,
            store_url: cli_store_url,
            store_api_key: cli_store_api_key,
            store_timeout_secs: cli_store_timeout,
            graceful_shutdown_timeout_secs: cli_shutdown_timeout,
            sync_pet_status: cli_sync_pet_status,
            cors_allowed_origins: cli_cors,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            store: file_store,
            store_url: file_store_url,
            store_api_key: file_store_api_key,
            store_timeout_secs: file_store_timeout,
            graceful_shutdown_timeout_secs: file_shutdown_timeout,
            sync_pet_status: file_sync_pet_status,
            cors_allowed_origins: file_cors,
        } = file_config;

        let store_url = cli_store_url
            .or(file_store_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let store_api_key = cli_store_api_key
            .or(file_store_api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        // Default to the hosted store only when it has been configured.
        let store = cli_store.or(file_store).unwrap_or(if store_url.is_some() {
            StoreBackend::Supabase
        } else {
            StoreBackend::Memory
        });

        let store_timeout_secs = cli_store_timeout
            .or(file_store_timeout)
            .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS)
            .max(1);
        let shutdown_timeout_secs = cli_shutdown_timeout
            .or(file_shutdown_timeout)
            .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS);

        let cors_allowed_origins = cli_cors
            .or(file_cors)
            .unwrap_or_default()
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let config = Self {
            http_bind_address: cli_http_bind.or(file_http_bind).unwrap_or_else(default_bind),
            store,
            store_url,
            store_api_key,
            store_timeout: Duration::from_secs(store_timeout_secs),
            graceful_shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
            sync_pet_status: cli_sync_pet_status.or(file_sync_pet_status).unwrap_or(true),
            cors_allowed_origins,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on settings the chosen backend cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.store == StoreBackend::Supabase {
            let url = self
                .store_url
                .as_deref()
                .context("the supabase store requires --store-url")?;
            let parsed = reqwest::Url::parse(url)
                .with_context(|| format!("store url {url:?} is not a valid URL"))?;
            anyhow::ensure!(
                matches!(parsed.scheme(), "http" | "https"),
                "store url {url:?} must use http or https"
            );
            anyhow::ensure!(
                self.store_api_key.is_some(),
                "the supabase store requires --store-api-key"
            );
        }
        Ok(())
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "pet-adoption", about = "Pet adoption REST API", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "PET_ADOPTION_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address (default 127.0.0.1:5000)"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "PET_ADOPTION_STORE",
        value_enum,
        value_name = "BACKEND",
        help = "Entity store backend"
    )]
    pub store: Option<StoreBackend>,

    #[arg(
        long,
        env = "PET_ADOPTION_STORE_URL",
        value_name = "URL",
        help = "Supabase project URL"
    )]
    pub store_url: Option<String>,

    #[arg(
        long,
        env = "PET_ADOPTION_STORE_API_KEY",
        value_name = "KEY",
        hide_env_values = true,
        help = "Supabase API key"
    )]
    pub store_api_key: Option<String>,

    #[arg(
        long,
        env = "PET_ADOPTION_STORE_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Timeout for each store request",
        value_parser = clap::value_parser!(u64)
    )]
    pub store_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "PET_ADOPTION_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Time allowed for in-flight requests on shutdown",
        value_parser = clap::value_parser!(u64)
    )]
    pub graceful_shutdown_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "PET_ADOPTION_SYNC_PET_STATUS",
        value_name = "BOOL",
        help = "Update pet status when applications change",
        value_parser = clap::value_parser!(bool)
    )]
    pub sync_pet_status: Option<bool>,

    #[arg(
        long,
        env = "PET_ADOPTION_CORS_ORIGINS",
        value_name = "ORIGIN",
        value_delimiter = ',',
        help = "Comma-separated list of allowed CORS origins (default any)"
    )]
    pub cors_allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    store: Option<StoreBackend>,
    store_url: Option<String>,
    store_api_key: Option<String>,
    store_timeout_secs: Option<u64>,
    graceful_shutdown_timeout_secs: Option<u64>,
    sync_pet_status: Option<bool>,
    cors_allowed_origins: Option<Vec<String>>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
