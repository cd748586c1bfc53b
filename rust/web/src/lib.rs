//! HTTP front-end for the blackjack engine.
//!
//! Each browser session owns one table. Commands go in over JSON
//! (`POST /api/sessions/{id}/commands`), the resulting round events come back
//! in the response and are also pushed to Server-Sent Event subscribers.

pub mod errors;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod session;
pub mod settings;
pub mod static_handler;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use events::{EventBus, EventSubscription, GameEvent};
pub use logging::{
    capture_logs, init_logging, init_test_logging, CapturedLogs, LogEntry, LogFormat,
};
pub use middleware::{log_response, with_request_logging, RequestMetrics};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use session::{
    AchievementsResponse, CommandResponse, DealerView, HandView, SessionError, SessionId,
    SessionInfo, SessionManager, StatsResponse, TableConfig, TableSession, TableStateResponse,
};
pub use settings::{AppSettings, SettingsError, SettingsStore};
pub use static_handler::{StaticError, StaticHandler};
