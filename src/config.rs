use std::env;
use std::str::FromStr;
use std::time::Duration;

use strum_macros::{Display, EnumString};
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 4201;
const DEFAULT_IMAGE_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";
const DEFAULT_FACTS_API_URL: &str = "https://freetestapi.com/api/v1/birds";
const DEFAULT_FACTS_ID_RANGE: u32 = 50;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BirdSourceKind {
    /// builtin list of birds
    Catalog,
    /// remote facts service
    Facts,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} is not a valid url: {reason}")]
    InvalidUrl {
        key: &'static str,
        reason: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub image_search_url: Url,
    pub image_search_client_id: Option<String>,
    pub bird_source: BirdSourceKind,
    pub facts_api_url: Url,
    pub facts_id_range: u32,
    pub upstream_timeout: Duration,
    pub user_agent: String,
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn url(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<Url, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_owned());
    Url::parse(value.trim()).map_err(|reason| ConfigError::InvalidUrl { key, reason })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok().filter(|value| !value.is_empty()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bird_source = match lookup("BIRD_SOURCE") {
            None => BirdSourceKind::Catalog,
            Some(value) => BirdSourceKind::from_str(&value.trim().to_lowercase())
                .map_err(|_| ConfigError::Invalid {
                    key: "BIRD_SOURCE",
                    value,
                })?,
        };
        let facts_id_range = parsed(&lookup, "FACTS_ID_RANGE", DEFAULT_FACTS_ID_RANGE)?;
        if facts_id_range == 0 {
            return Err(ConfigError::Invalid {
                key: "FACTS_ID_RANGE",
                value: facts_id_range.to_string(),
            });
        }
        let timeout_secs = parsed(
            &lookup,
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        Ok(Config {
            port: parsed(&lookup, "PORT", DEFAULT_PORT)?,
            image_search_url: url(&lookup, "IMAGE_SEARCH_URL", DEFAULT_IMAGE_SEARCH_URL)?,
            image_search_client_id: lookup("IMAGE_SEARCH_CLIENT_ID"),
            bird_source,
            facts_api_url: url(&lookup, "FACTS_API_URL", DEFAULT_FACTS_API_URL)?,
            facts_id_range,
            upstream_timeout: Duration::from_secs(timeout_secs),
            user_agent: lookup("USER_AGENT").unwrap_or_else(|| {
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned()
            }),
        })
    }
}
