use anyhow::{bail, Context};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Longest accepted token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

/// Connection settings; `url` wins over the individual parts when set.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: get("DATABASE_URL").filter(|v| !v.is_empty()),
            host: get("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: parse_or(&get, "DB_PORT", 5432)?,
            name: get("DB_NAME"),
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
        };

        let secret = get("SECRET_KEY")
            .or_else(|| get("JWT_SECRET"))
            .context("SECRET_KEY is not set")?;
        if secret.is_empty() {
            bail!("SECRET_KEY must not be empty");
        }
        let ttl_minutes: i64 = parse_or(&get, "JWT_TTL_MINUTES", 60)?;
        if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
            bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {ttl_minutes}");
        }
        let jwt = JwtConfig { secret, ttl_minutes };

        let port = match get("PORT").or_else(|| get("APP_PORT")) {
            Some(v) => v.parse().with_context(|| format!("invalid port {v:?}"))?,
            None => 3000,
        };

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database,
            jwt,
        })
    }
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse().context("parse DATABASE_URL");
        }
        let mut opts = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(name) = &self.name {
            opts = opts.database(name);
        }
        if let Some(user) = &self.user {
            opts = opts.username(user);
        }
        if let Some(password) = &self.password {
            opts = opts.password(password);
        }
        Ok(opts)
    }
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        None => Ok(default),
    }
}
