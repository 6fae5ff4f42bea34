use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// Optional account provisioned at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub geo: GeoConfig,
    pub seed_user: Option<SeedUser>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "geotrace".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "geotrace-users".into()),
            ttl_minutes: parse_or(
                "JWT_TTL_MINUTES",
                std::env::var("JWT_TTL_MINUTES").ok(),
                60,
            )?,
        };
        let geo = GeoConfig {
            base_url: std::env::var("GEO_PROVIDER_URL")
                .unwrap_or_else(|_| "https://ipinfo.io".into()),
            token: std::env::var("IPINFO_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout_secs: parse_or(
                "GEO_TIMEOUT_SECS",
                std::env::var("GEO_TIMEOUT_SECS").ok(),
                10,
            )?,
        };
        let seed_user = match (
            std::env::var("SEED_USER_EMAIL"),
            std::env::var("SEED_USER_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(SeedUser { email, password }),
            _ => None,
        };
        // PORT takes precedence over APP_PORT
        let port = parse_or(
            "PORT",
            std::env::var("PORT").or_else(|_| std::env::var("APP_PORT")).ok(),
            5000,
        )?;

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            jwt,
            geo,
            seed_user,
        })
    }
}

/// Unset falls back to `default`; a set but malformed value is an error.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={v:?}: {e}")),
    }
}
