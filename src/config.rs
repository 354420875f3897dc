use std::env;

use chrono::{FixedOffset, Offset, Utc};

#[derive(Clone, Debug)]
pub struct Config {
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub session_ttl_hours: i64,
    pub utc_offset: FixedOffset,
    pub seed_admin: Option<SeedAdmin>,
}

/// Master account created at startup when it does not exist yet.
#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub username: String,
    pub password_hash: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(24);
        let utc_offset = match env::var("SALON_UTC_OFFSET") {
            Ok(raw) => parse_offset(&raw)?,
            Err(_) => utc(),
        };
        let seed_admin = match (env::var("SEED_ADMIN_USERNAME"), env::var("SEED_ADMIN_PASSWORD_HASH")) {
            (Ok(username), Ok(password_hash)) => Some(SeedAdmin { username, password_hash }),
            _ => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            session_ttl_hours,
            utc_offset,
            seed_admin,
        })
    }
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Accepts `+HH:MM` / `-HH:MM`, or `Z`.
pub fn parse_offset(raw: &str) -> anyhow::Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(utc());
    }
    raw.parse::<FixedOffset>()
        .map_err(|e| anyhow::anyhow!("SALON_UTC_OFFSET must look like +02:00, got {raw:?}: {e}"))
}
