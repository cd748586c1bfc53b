use crate::errors::IntoErrorResponse;
use crate::session::SessionManager;
use crate::settings::{AppSettings, SettingsError, SettingsStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Partial update; omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub sound_enabled: Option<bool>,
    pub deal_delay_ms: Option<u64>,
    pub dealer_draw_delay_ms: Option<u64>,
    pub session_timeout_minutes: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: String,
    pub value: serde_json::Value,
}

pub async fn get_settings(store: Arc<SettingsStore>) -> Response {
    match store.get() {
        Ok(settings) => success_response(StatusCode::OK, settings),
        Err(err) => settings_error(err),
    }
}

pub async fn update_settings(
    store: Arc<SettingsStore>,
    sessions: Arc<SessionManager>,
    request: UpdateSettingsRequest,
) -> Response {
    let mut current = match store.get() {
        Ok(s) => s,
        Err(err) => return settings_error(err),
    };

    if let Some(sound) = request.sound_enabled {
        current.sound_enabled = sound;
    }
    if let Some(delay) = request.deal_delay_ms {
        current.deal_delay_ms = delay;
    }
    if let Some(delay) = request.dealer_draw_delay_ms {
        current.dealer_draw_delay_ms = delay;
    }
    if let Some(timeout) = request.session_timeout_minutes {
        current.session_timeout_minutes = timeout;
    }

    applied(store.update(current), &sessions)
}

pub async fn update_field(
    store: Arc<SettingsStore>,
    sessions: Arc<SessionManager>,
    request: UpdateFieldRequest,
) -> Response {
    applied(store.update_field(&request.field, request.value), &sessions)
}

pub async fn reset_settings(store: Arc<SettingsStore>, sessions: Arc<SessionManager>) -> Response {
    applied(store.reset(), &sessions)
}

/// Pushes the session timeout to the manager once the new settings are stored.
fn applied(result: Result<AppSettings, SettingsError>, sessions: &SessionManager) -> Response {
    match result {
        Ok(settings) => {
            sessions.set_ttl(session_ttl(&settings));
            success_response(StatusCode::OK, settings)
        }
        Err(err) => settings_error(err),
    }
}

pub fn session_ttl(settings: &AppSettings) -> Duration {
    Duration::from_secs(settings.session_timeout_minutes * 60)
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn settings_error(err: SettingsError) -> Response {
    err.into_http_response()
}
