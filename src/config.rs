use anyhow::{Context, Result, anyhow, bail};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::workflow::{SimulatedMatcherConfig, VerificationPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Client side
    pub api_base_url: String,
    pub use_mocks: bool,
    pub session_store_path: PathBuf,

    // Verification workflow
    pub max_document_attempts: u32,
    pub match_probability_with_image: f64,
    pub match_probability_without_image: f64,

    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            server_addr: var("SERVER_ADDR", "127.0.0.1:5000"),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_default(),
            access_token_ttl: parse(&lookup, "ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parse(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parse(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: var("API_PREFIX", "/api"),

            api_base_url: var("API_BASE_URL", "http://localhost:5000/api"),
            use_mocks: parse_bool(&lookup, "USE_MOCKS", true)?,
            session_store_path: PathBuf::from(var("SESSION_STORE_PATH", ".iirs-session.json")),

            max_document_attempts: parse(&lookup, "MAX_DOCUMENT_ATTEMPTS", 3)?,
            match_probability_with_image: parse(&lookup, "MATCH_PROBABILITY_WITH_IMAGE", 0.75)?,
            match_probability_without_image: parse(
                &lookup,
                "MATCH_PROBABILITY_WITHOUT_IMAGE",
                0.55,
            )?,

            log_dir: var("LOG_DIR", "logs"),
            log_level: var("LOG_LEVEL", "debug"),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_document_attempts == 0 {
            bail!("MAX_DOCUMENT_ATTEMPTS must be at least 1");
        }
        for (key, p) in [
            ("MATCH_PROBABILITY_WITH_IMAGE", self.match_probability_with_image),
            ("MATCH_PROBABILITY_WITHOUT_IMAGE", self.match_probability_without_image),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("{key} must be within [0, 1], got {p}");
            }
        }
        Ok(())
    }

    /// The server refuses to start without a signing secret.
    pub fn require_jwt_secret(&self) -> Result<&str> {
        if self.jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET must be set"));
        }
        Ok(&self.jwt_secret)
    }

    pub fn verification_policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            max_document_attempts: self.max_document_attempts,
        }
    }

    pub fn simulated_matcher(&self) -> SimulatedMatcherConfig {
        SimulatedMatcherConfig {
            with_image: self.match_probability_with_image,
            without_image: self.match_probability_without_image,
        }
    }
}

fn parse<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => bail!("{key} must be a boolean, got {other:?}"),
    }
}
