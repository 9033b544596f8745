/// Configuration management for the API server
///
/// Configuration is read from environment variables; a `.env` file is loaded
/// first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: HS256 secret, at least 32 characters (required)
/// - `MAX_OWNED_PROJECTS`: projects a user may own (default: 5)
/// - `INVITATION_TTL_HOURS`: invitation lifetime; unset means never expire
/// - `RUST_LOG`: log filter (default: `teamboard_api=debug,tower_http=debug`)
///
/// # Example
///
/// ```no_run
/// use teamboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};
use teamboard_shared::membership::{MembershipPolicy, DEFAULT_MAX_OWNED_PROJECTS};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub membership: MembershipConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS on)
    pub production: bool,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for HS256
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Membership rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipConfig {
    pub max_owned_projects: i64,

    /// None keeps invitations open indefinitely
    pub invitation_ttl_hours: Option<i64>,
}

impl MembershipConfig {
    pub fn policy(&self) -> MembershipPolicy {
        MembershipPolicy {
            max_owned_projects: self.max_owned_projects,
            invitation_ttl: self.invitation_ttl_hours.map(chrono::Duration::hours),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} environment variable is required"))
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let max_owned_projects: i64 =
            parse_or(&lookup, "MAX_OWNED_PROJECTS", DEFAULT_MAX_OWNED_PROJECTS)?;
        if max_owned_projects < 1 {
            anyhow::bail!("MAX_OWNED_PROJECTS must be at least 1");
        }

        let invitation_ttl_hours = match lookup("INVITATION_TTL_HOURS") {
            Some(raw) if !raw.trim().is_empty() => {
                let hours: i64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("INVITATION_TTL_HOURS has invalid value {raw:?}"))?;
                if hours < 1 {
                    anyhow::bail!("INVITATION_TTL_HOURS must be at least 1");
                }
                Some(hours)
            }
            _ => None,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 8080)?,
                cors_origins,
                production: parse_or(&lookup, "PRODUCTION", false)?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig { secret: jwt_secret },
            membership: MembershipConfig {
                max_owned_projects,
                invitation_ttl_hours,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value {raw:?}")),
        _ => Ok(default),
    }
}
