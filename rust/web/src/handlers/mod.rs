pub mod game;
pub mod health;
pub mod settings;
pub mod sse;

pub use game::{
    create_session, delete_session, get_achievements, get_session, get_session_state, get_stats,
    submit_command, CreateSessionRequest,
};
pub use health::health;
pub use settings::{
    get_settings, reset_settings, session_ttl, update_field, update_settings, UpdateFieldRequest,
    UpdateSettingsRequest,
};
pub use sse::stream_events;
