use crate::errors::IntoErrorResponse;
use crate::session::{SessionError, SessionId, SessionManager, TableConfig};
use blackjack_engine::engine::Command;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub seed: Option<u64>,
    pub profile: Option<String>,
    pub player_name: Option<String>,
}

impl CreateSessionRequest {
    fn into_config(self) -> TableConfig {
        let mut config = TableConfig {
            seed: self.seed,
            profile: self.profile,
            ..TableConfig::default()
        };
        if let Some(name) = self.player_name.filter(|n| !n.trim().is_empty()) {
            config.player_name = name.trim().to_string();
        }
        config
    }
}

/// Creates a table.
///
/// `POST /api/sessions` with an optional body:
///
/// ```json
/// { "seed": 42, "profile": "alice", "player_name": "Alice" }
/// ```
///
/// Responds `201 Created` with the session info. A named profile loads its
/// saved chips, stats and achievements; an invalid name is `400 invalid_profile`.
pub async fn create_session(
    sessions: Arc<SessionManager>,
    request: CreateSessionRequest,
) -> Response {
    let config = request.into_config();

    match sessions
        .create_session(config)
        .and_then(|id| sessions.info(&id))
    {
        Ok(info) => success_response(StatusCode::CREATED, info),
        Err(err) => session_error(err),
    }
}

/// `GET /api/sessions/{id}`: config, creation time and current table state.
pub async fn get_session(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.info(&session_id) {
        Ok(info) => success_response(StatusCode::OK, info),
        Err(err) => session_error(err),
    }
}

pub async fn get_session_state(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.state(&session_id) {
        Ok(state) => success_response(StatusCode::OK, state),
        Err(err) => session_error(err),
    }
}

/// Applies one table command.
///
/// `POST /api/sessions/{id}/commands` with a tagged command body, e.g.
/// `{"command": "bet", "amount": 50}` or `{"command": "hit"}`.
///
/// Responds `200 OK` with the events the command produced and the resulting
/// state. Commands not valid in the current phase are `409`; bad amounts `400`.
pub async fn submit_command(
    sessions: Arc<SessionManager>,
    session_id: SessionId,
    command: Command,
) -> Response {
    match sessions.process_command(&session_id, command) {
        Ok(result) => success_response(StatusCode::OK, result),
        Err(err) => session_error(err),
    }
}

pub async fn get_stats(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.stats(&session_id) {
        Ok(stats) => success_response(StatusCode::OK, stats),
        Err(err) => session_error(err),
    }
}

pub async fn get_achievements(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.achievements(&session_id) {
        Ok(achievements) => success_response(StatusCode::OK, achievements),
        Err(err) => session_error(err),
    }
}

pub async fn delete_session(sessions: Arc<SessionManager>, session_id: SessionId) -> Response {
    match sessions.delete_session(&session_id) {
        Ok(()) => empty_response(StatusCode::NO_CONTENT),
        Err(err) => session_error(err),
    }
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn empty_response(status: StatusCode) -> Response {
    reply::with_status(warp::reply(), status).into_response()
}

fn session_error(err: SessionError) -> Response {
    err.into_http_response()
}
