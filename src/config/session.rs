use anyhow::Result;
use std::env;

/// Fourteen days, the lifetime of a login session unless overridden.
const DEFAULT_SESSION_TTL: i64 = 1_209_600;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub ttl_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Result<Self> {
        let ttl_seconds = match env::var("SESSION_TTL_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_SECONDS must be an integer"))?,
            Err(_) => DEFAULT_SESSION_TTL,
        };

        if ttl_seconds <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_SECONDS must be positive"));
        }

        Ok(Self { ttl_seconds })
    }

    pub fn cookie_max_age(&self) -> u64 {
        self.ttl_seconds as u64
    }
}
