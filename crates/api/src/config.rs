//! Application configuration

use std::env;

/// Credentials for the bootstrap admin account
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Argon2 cost parameters; `None` keeps the argon2 crate default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_key: String,
    pub jwt_expiry_hours: i64,
    pub hash_cost: HashCost,

    // Bootstrap
    pub admin: Option<AdminSeed>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),

            // Database
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://gods.db?mode=rwc".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Authentication
            jwt_key: {
                let key = env::var("JWT_KEY").map_err(|_| ConfigError::Missing("JWT_KEY"))?;
                if key.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_KEY must be at least 32 characters",
                    ));
                }
                key
            },
            jwt_expiry_hours: jwt_expiry_hours()?,
            hash_cost: HashCost {
                memory_kib: optional_number("HASH_MEMORY_KIB")?,
                iterations: optional_number("HASH_ITERATIONS")?,
                parallelism: optional_number("HASH_PARALLELISM")?,
            },

            // Bootstrap admin is only seeded when all three values are present
            admin: match (
                env::var("ADMIN_NAME"),
                env::var("ADMIN_EMAIL"),
                env::var("ADMIN_PASSWORD"),
            ) {
                (Ok(name), Ok(email), Ok(password)) => Some(AdminSeed {
                    name,
                    email,
                    password,
                }),
                _ => None,
            },
        })
    }
}

/// Longest accepted session lifetime: one year
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

fn jwt_expiry_hours() -> Result<i64, ConfigError> {
    let Ok(value) = env::var("JWT_EXPIRY_HOURS") else {
        return Ok(24);
    };

    match value.parse::<i64>() {
        Ok(hours) if (1..=MAX_JWT_EXPIRY_HOURS).contains(&hours) => Ok(hours),
        _ => Err(ConfigError::Invalid("JWT_EXPIRY_HOURS")),
    }
}

fn optional_number(name: &'static str) -> Result<Option<u32>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}
