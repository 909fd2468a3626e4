use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::sheets::ServiceAccountKey;

const DEFAULT_SPREADSHEET_NAME: &str = "2025 Attendance";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STATUS_FILE: &str = "user_status.json";
const DEFAULT_SHEETS_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub google_credentials: ServiceAccountKey,
    pub spreadsheet_name: String,
    /// Порт health-эндпоинта
    pub port: u16,
    pub status_file: PathBuf,
    pub sheets_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let bot_token = required("BOT_TOKEN")?;

        let google_credentials = serde_json::from_str::<ServiceAccountKey>(&required("GOOGLE_CREDENTIALS")?)
            .map_err(|e| ConfigError::Invalid {
                var: "GOOGLE_CREDENTIALS",
                reason: e.to_string(),
            })?;

        let spreadsheet_name = lookup("SPREADSHEET_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SPREADSHEET_NAME.to_string());

        let port = match lookup("PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let status_file = lookup("STATUS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATUS_FILE));

        let sheets_timeout = match lookup("SHEETS_TIMEOUT_SECS") {
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "SHEETS_TIMEOUT_SECS",
                        reason: "must be positive".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "SHEETS_TIMEOUT_SECS",
                        reason: e.to_string(),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_SHEETS_TIMEOUT_SECS),
        };

        Ok(Config {
            bot_token,
            google_credentials,
            spreadsheet_name,
            port,
            status_file,
            sheets_timeout,
        })
    }
}
