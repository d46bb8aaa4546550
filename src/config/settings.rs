//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// JWT authentication settings
    pub jwt: JwtSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Page sizes for listings
    pub pagination: PaginationSettings,

    /// Full-text search index
    pub search: SearchSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens
    pub secret: String,

    /// Access token expiry in minutes
    pub access_token_expiry_minutes: i64,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Listing page sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    /// Items per page for posts, comments, users and messages
    pub posts_per_page: i64,
}

/// Full-text index configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// Directory of the on-disk index. `None` keeps the index in memory.
    pub index_path: Option<String>,

    /// Writer heap budget in bytes
    pub writer_memory_bytes: usize,

    /// Rebuild the index from the database at startup
    pub reindex_on_startup: bool,
}

/// Minimum required length for JWT secret (256 bits = 32 bytes)
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the settings fail validation.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .set_override_option(
                "search.index_path",
                std::env::var("SEARCH_INDEX_PATH").ok(),
            )?
            .set_override_option(
                "pagination.posts_per_page",
                std::env::var("POSTS_PER_PAGE").ok(),
            )?
            .build()?
            .try_deserialize::<Self>()
            .and_then(Self::validate)
    }

    /// Builder pre-populated with every default value.
    pub fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry_minutes", 60)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", 1_577_836_800_000_u64)?
            .set_default("cors.allowed_origins", vec!["http://localhost:5000"])?
            .set_default("pagination.posts_per_page", 25)?
            .set_default("search.writer_memory_bytes", 50_000_000_i64)?
            .set_default("search.reindex_on_startup", true)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Message(format!(
                "JWT secret must be at least {} characters. Current length: {}",
                MIN_JWT_SECRET_LENGTH,
                self.jwt.secret.len()
            )));
        }
        if self.pagination.posts_per_page < 1 {
            return Err(ConfigError::Message(
                "pagination.posts_per_page must be positive".into(),
            ));
        }
        // tantivy refuses writer budgets below 15MB per thread
        if self.search.writer_memory_bytes < 15_000_000 {
            return Err(ConfigError::Message(
                "search.writer_memory_bytes must be at least 15000000".into(),
            ));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(overrides: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let mut builder = Settings::builder("test")?;
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        builder.build()?.try_deserialize::<Settings>().and_then(Settings::validate)
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_defaults_apply() {
        let settings = load_with(&[
            ("database.url", "postgres://localhost/microblog"),
            ("jwt.secret", SECRET),
        ])
        .unwrap();

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.pagination.posts_per_page, 25);
        assert!(settings.search.index_path.is_none());
        assert!(settings.search.reindex_on_startup);
        assert_eq!(settings.environment, "test");
        assert_eq!(settings.server_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_short_jwt_secret_is_rejected() {
        let err = load_with(&[
            ("database.url", "postgres://localhost/microblog"),
            ("jwt.secret", "short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("JWT secret"));
    }

    #[test]
    fn test_small_writer_budget_is_rejected() {
        let err = load_with(&[
            ("database.url", "postgres://localhost/microblog"),
            ("jwt.secret", SECRET),
            ("search.writer_memory_bytes", "1000"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("writer_memory_bytes"));
    }
}
