//! Centralized configuration (environment variables + defaults).

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_ALLOWED_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "TABLE", "SHOW"];
pub const DEFAULT_MAX_STATEMENT_CHARS: usize = 10_000;
pub const DEFAULT_MAX_ROWS: usize = 1_000;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing with a connection error.
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            url: database_url()?,
            max_connections: env_parse("DB_MAX_CONNECTIONS", 5u32).max(1),
            acquire_timeout: Duration::from_secs(env_parse("DB_ACQUIRE_TIMEOUT_SECS", 5u64).max(1)),
        })
    }
}

/// Limits applied by the ad-hoc query gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upper-cased leading keywords a statement may start with.
    pub allowed_keywords: Vec<String>,
    pub max_statement_chars: usize,
    pub max_rows: usize,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allowed_keywords: DEFAULT_ALLOWED_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            max_statement_chars: DEFAULT_MAX_STATEMENT_CHARS,
            max_rows: DEFAULT_MAX_ROWS,
            timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let allowed_keywords = match std::env::var("QUERY_ALLOWED_KEYWORDS") {
            Ok(raw) => parse_keyword_list(&raw)?,
            Err(_) => defaults.allowed_keywords,
        };

        Ok(Self {
            allowed_keywords,
            max_statement_chars: env_parse("QUERY_MAX_STATEMENT_CHARS", DEFAULT_MAX_STATEMENT_CHARS)
                .max(1),
            max_rows: env_parse("QUERY_MAX_ROWS", DEFAULT_MAX_ROWS).max(1),
            timeout: Duration::from_millis(env_parse("QUERY_TIMEOUT_MS", DEFAULT_QUERY_TIMEOUT_MS).max(1)),
        })
    }
}

/// Parses a comma separated keyword list. `SELECT` must always be present.
pub fn parse_keyword_list(raw: &str) -> anyhow::Result<Vec<String>> {
    let mut keywords: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let kw = part.trim().to_ascii_uppercase();
        if kw.is_empty() {
            continue;
        }
        if !kw.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("QUERY_ALLOWED_KEYWORDS contains an invalid keyword: {}", part.trim());
        }
        if !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    if !keywords.iter().any(|k| k == "SELECT") {
        anyhow::bail!("QUERY_ALLOWED_KEYWORDS must include SELECT");
    }
    Ok(keywords)
}

/// Everything the API server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_raw = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a valid socket address: {}", bind_raw))?;

        Ok(Self {
            bind_addr,
            database: DatabaseConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_list_is_normalized_and_deduplicated() {
        let kws = parse_keyword_list(" select, With ,SELECT,,values").unwrap();
        assert_eq!(kws, vec!["SELECT", "WITH", "VALUES"]);
    }

    #[test]
    fn keyword_list_requires_select() {
        assert!(parse_keyword_list("WITH,SHOW").is_err());
    }

    #[test]
    fn keyword_list_rejects_non_alphabetic_entries() {
        assert!(parse_keyword_list("SELECT,DROP TABLE").is_err());
    }
}
