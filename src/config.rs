//! Process configuration read from environment variables.
//!
//! A `.env` file in the working directory is loaded by `main` before this
//! module reads anything.

use std::{env, time::Duration};

use tracing::warn;

use crate::{constants::*, error::AppError};

/// A display column on the list page backed by a named attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    pub name: String,
    pub attachment_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Full URL of the mail-capture endpoint.
    pub ses_api_url: String,
    pub fetch_timeout: Option<Duration>,
    pub relay: RelayConfig,
    pub extra_columns: Vec<ExtraColumn>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_empty(lookup(ENV_LOCALSTACK_HOST))
            .unwrap_or_else(|| DEFAULT_LOCALSTACK_HOST.to_string());
        let api_path =
            non_empty(lookup(ENV_SES_API_PATH)).unwrap_or_else(|| DEFAULT_SES_API_PATH.to_string());

        let relay = RelayConfig {
            enabled: lookup(ENV_SMTP_FORWARD_ENABLED).as_deref() == Some("true"),
            host: non_empty(lookup(ENV_SMTP_FORWARD_HOST))
                .unwrap_or_else(|| DEFAULT_SMTP_FORWARD_HOST.to_string()),
            port: parse_number(ENV_SMTP_FORWARD_PORT, lookup(ENV_SMTP_FORWARD_PORT))?
                .unwrap_or(DEFAULT_SMTP_FORWARD_PORT),
        };

        let fetch_timeout = parse_number::<u64>(
            ENV_FETCH_TIMEOUT_SECS,
            lookup(ENV_FETCH_TIMEOUT_SECS),
        )?
        .map(Duration::from_secs);

        Ok(AppConfig {
            ses_api_url: join_url(&base_url, &api_path),
            fetch_timeout,
            relay,
            extra_columns: lookup(ENV_EXTRA_COLUMNS)
                .map(|value| parse_extra_columns(&value))
                .unwrap_or_default(),
            host: non_empty(lookup(ENV_HOST)).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_number(ENV_PORT, lookup(ENV_PORT))?.unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Parses `Name=filename,Other=other.png` into display columns.
pub fn parse_extra_columns(value: &str) -> Vec<ExtraColumn> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once('=') {
            Some((name, filename)) if !name.trim().is_empty() && !filename.trim().is_empty() => {
                Some(ExtraColumn {
                    name: name.trim().to_string(),
                    attachment_filename: filename.trim().to_string(),
                })
            }
            _ => {
                warn!(entry, "Ignoring malformed extra column");
                None
            }
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(
    key: &str,
    value: Option<String>,
) -> Result<Option<T>, AppError> {
    match non_empty(value) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(None),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
