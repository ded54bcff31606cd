use anyhow::Context;

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Operator configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// Prefix for the `links` rendered into serialized entities.
    pub api_base_url: String,
}

impl AdminConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `DATABASE_URL`       | required                 |
    /// | `DB_MAX_CONNECTIONS` | `20`                     |
    /// | `API_BASE_URL`       | `http://localhost:5000`  |
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .context("DB_MAX_CONNECTIONS must be a valid u32")?;

        let api_base_url =
            std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".into());

        Ok(Self {
            database_url,
            max_connections,
            api_base_url,
        })
    }
}

/// `LOG_FORMAT` (default `pretty`), read on its own so logging can start
/// before the rest of the configuration is loaded.
pub fn log_format_from_env() -> anyhow::Result<LogFormat> {
    match std::env::var("LOG_FORMAT").as_deref() {
        Err(_) | Ok("pretty") => Ok(LogFormat::Pretty),
        Ok("json") => Ok(LogFormat::Json),
        Ok(other) => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', not '{other}'"),
    }
}
