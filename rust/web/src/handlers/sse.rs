use crate::errors::IntoErrorResponse;
use crate::events::{EventSubscription, GameEvent};
use crate::session::{SessionId, SessionManager, TableStateResponse};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use warp::http;
use warp::reply::{self, Response};
use warp::sse;
use warp::Reply;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /api/sessions/{id}/events`
///
/// Opens with a `snapshot` event carrying the current table state, then
/// relays every bus event for the session as a `game_event`.
pub async fn stream_events(session_id: SessionId, sessions: Arc<SessionManager>) -> Response {
    let snapshot = match sessions.state(&session_id) {
        Ok(state) => state,
        Err(err) => return err.into_http_response(),
    };

    let subscription = sessions.event_bus().subscribe(session_id);
    let stream = tokio_stream::once(Ok(render_snapshot(&snapshot)))
        .chain(subscription_stream(subscription));
    let keep_alive = sse::keep_alive()
        .interval(KEEP_ALIVE_INTERVAL)
        .text(":keep-alive\n");

    let reply = sse::reply(keep_alive.stream(stream));
    reply::with_header(reply, http::header::CACHE_CONTROL, "no-cache").into_response()
}

fn subscription_stream(
    mut subscription: EventSubscription,
) -> impl Stream<Item = Result<sse::Event, Infallible>> {
    // The subscription must outlive the stream so that dropping the
    // connection unsubscribes.
    let (_, placeholder_rx) = mpsc::channel(1);
    let receiver = std::mem::replace(&mut subscription.receiver, placeholder_rx);

    ReceiverStream::new(receiver).map(move |event| {
        let _held = &subscription;
        Ok(render_event(&event))
    })
}

fn render_snapshot(state: &TableStateResponse) -> sse::Event {
    match serde_json::to_string(state) {
        Ok(json) => sse::Event::default().event("snapshot").data(json),
        Err(err) => serialization_failure(err),
    }
}

fn render_event(event: &GameEvent) -> sse::Event {
    match serde_json::to_string(event) {
        Ok(json) => sse::Event::default().event("game_event").data(json),
        Err(err) => serialization_failure(err),
    }
}

fn serialization_failure(err: serde_json::Error) -> sse::Event {
    tracing::error!(error = %err, "failed to serialize sse payload");
    let fallback = serde_json::json!({
        "type": "error",
        "message": format!("failed to serialize event: {err}")
    })
    .to_string();
    sse::Event::default().event("game_event").data(fallback)
}
