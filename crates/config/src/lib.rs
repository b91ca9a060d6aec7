use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "staybook.toml",
    "config/staybook.toml",
    "crates/config/staybook.toml",
    "../staybook.toml",
    "../config/staybook.toml",
];

const ENV_PREFIX: &str = "STAYBOOK";
const CONFIG_PATH_VAR: &str = "STAYBOOK_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub tasks: TaskQueueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    #[serde(default = "HttpConfig::default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

impl HttpConfig {
    fn default_cors_origins() -> Vec<String> {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
            "http://localhost:8080".to_string(),
        ]
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Self::default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://staybook.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl AuthConfig {
    const fn default_session_ttl() -> u64 {
        86_400
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: Self::default_session_ttl(),
        }
    }
}

/// Page-number pagination applied to every list endpoint.
///
/// ```
/// use staybook_config::PaginationConfig;
///
/// let pagination = PaginationConfig::default();
/// assert_eq!(pagination.page_size, 20);
/// assert_eq!(pagination.max_page_size, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Chapa payment gateway credentials. Loaded and reported at startup only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    #[serde(default)]
    pub chapa_secret_key: Option<String>,
    #[serde(default)]
    pub chapa_public_key: Option<String>,
    #[serde(default = "PaymentsConfig::default_base_url")]
    pub chapa_base_url: String,
}

impl PaymentsConfig {
    fn default_base_url() -> String {
        "https://api.chapa.co/v1".to_string()
    }

    pub fn is_configured(&self) -> bool {
        self.chapa_secret_key.is_some() && self.chapa_public_key.is_some()
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            chapa_secret_key: None,
            chapa_public_key: None,
            chapa_base_url: Self::default_base_url(),
        }
    }
}

/// Background task broker settings. Loaded and reported at startup only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQueueConfig {
    pub broker_url: String,
    pub result_backend: String,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            broker_url: "amqp://localhost".to_string(),
            result_backend: "database".to_string(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use staybook_config::load;
///
/// std::env::remove_var("STAYBOOK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default(
            "http.cors_allowed_origins",
            defaults.http.cors_allowed_origins.clone(),
        )?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("pagination.page_size", i64::from(defaults.pagination.page_size))?
        .set_default(
            "pagination.max_page_size",
            i64::from(defaults.pagination.max_page_size),
        )?
        .set_default("payments.chapa_base_url", defaults.payments.chapa_base_url.clone())?
        .set_default("tasks.broker_url", defaults.tasks.broker_url.clone())?
        .set_default("tasks.result_backend", defaults.tasks.result_backend.clone())?;

    let environment_overrides = config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("http.cors_allowed_origins")
        .try_parsing(true);

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via STAYBOOK_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    anyhow::ensure!(
        config.pagination.page_size > 0,
        "pagination.page_size must be greater than zero"
    );
    if config.pagination.max_page_size < config.pagination.page_size {
        config.pagination.max_page_size = config.pagination.page_size;
    }

    debug!(
        http = ?config.http,
        database = ?config.database,
        pagination = ?config.pagination,
        "loaded backend configuration"
    );
    Ok(config)
}
