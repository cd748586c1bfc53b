use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use thiserror::Error;
use warp::http::StatusCode;

use crate::errors::{ErrorSeverity, IntoErrorResponse};

/// Longest pause a renderer may be asked to insert between cards.
pub const MAX_DELAY_MS: u64 = 5_000;
/// Sessions may idle for at most a day.
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = 24 * 60;

/// Presentation settings shared with browser clients.
///
/// The engine resolves rounds instantly; these values only tell the UI how to
/// pace the events it receives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub sound_enabled: bool,
    /// Pause between cards of the initial deal
    pub deal_delay_ms: u64,
    /// Pause between dealer draws once the hole card is revealed
    pub dealer_draw_delay_ms: u64,
    pub session_timeout_minutes: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            deal_delay_ms: 600,
            dealer_draw_delay_ms: 800,
            session_timeout_minutes: 30,
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.deal_delay_ms > MAX_DELAY_MS {
            return Err(SettingsError::InvalidValue(format!(
                "deal_delay_ms must be at most {MAX_DELAY_MS}"
            )));
        }

        if self.dealer_draw_delay_ms > MAX_DELAY_MS {
            return Err(SettingsError::InvalidValue(format!(
                "dealer_draw_delay_ms must be at most {MAX_DELAY_MS}"
            )));
        }

        if self.session_timeout_minutes == 0
            || self.session_timeout_minutes > MAX_SESSION_TIMEOUT_MINUTES
        {
            return Err(SettingsError::InvalidValue(format!(
                "session_timeout_minutes must be between 1 and {MAX_SESSION_TIMEOUT_MINUTES}"
            )));
        }

        Ok(())
    }
}

/// In-memory settings store with validation
#[derive(Debug)]
pub struct SettingsStore {
    settings: RwLock<AppSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(AppSettings::default()),
        }
    }

    pub fn with_settings(settings: AppSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    pub fn get(&self) -> Result<AppSettings, SettingsError> {
        self.settings
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SettingsError::StoragePoisoned)
    }

    /// Replaces the settings. Invalid values leave the current ones in place.
    pub fn update(&self, new_settings: AppSettings) -> Result<AppSettings, SettingsError> {
        new_settings.validate()?;

        let mut guard = self
            .settings
            .write()
            .map_err(|_| SettingsError::StoragePoisoned)?;
        *guard = new_settings.clone();
        tracing::debug!(settings = ?new_settings, "settings updated");
        Ok(new_settings)
    }

    pub fn update_field(
        &self,
        field: &str,
        value: serde_json::Value,
    ) -> Result<AppSettings, SettingsError> {
        let mut current = self.get()?;

        match field {
            "sound_enabled" => {
                current.sound_enabled = value.as_bool().ok_or_else(|| {
                    SettingsError::InvalidValue("sound_enabled must be a boolean".to_string())
                })?;
            }
            "deal_delay_ms" => {
                current.deal_delay_ms = as_millis(field, &value)?;
            }
            "dealer_draw_delay_ms" => {
                current.dealer_draw_delay_ms = as_millis(field, &value)?;
            }
            "session_timeout_minutes" => {
                current.session_timeout_minutes = value.as_u64().ok_or_else(|| {
                    SettingsError::InvalidValue(
                        "session_timeout_minutes must be a number".to_string(),
                    )
                })?;
            }
            _ => {
                return Err(SettingsError::UnknownField(field.to_string()));
            }
        }

        self.update(current)
    }

    pub fn reset(&self) -> Result<AppSettings, SettingsError> {
        self.update(AppSettings::default())
    }
}

fn as_millis(field: &str, value: &serde_json::Value) -> Result<u64, SettingsError> {
    value
        .as_u64()
        .ok_or_else(|| SettingsError::InvalidValue(format!("{field} must be a number")))
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
    #[error("Unknown settings field: {0}")]
    UnknownField(String),
    #[error("Settings storage poisoned")]
    StoragePoisoned,
}

impl IntoErrorResponse for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SettingsError::InvalidValue(_) | SettingsError::UnknownField(_) => {
                StatusCode::BAD_REQUEST
            }
            SettingsError::StoragePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SettingsError::InvalidValue(_) => "invalid_settings",
            SettingsError::UnknownField(_) => "unknown_settings_field",
            SettingsError::StoragePoisoned => "settings_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SettingsError::StoragePoisoned => ErrorSeverity::Critical,
            _ => ErrorSeverity::Client,
        }
    }
}
