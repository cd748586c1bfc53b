use serde::Serialize;
use warp::reply::Json;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    active_sessions: usize,
}

pub fn health(active_sessions: usize) -> Json {
    warp::reply::json(&HealthBody {
        status: "ok",
        active_sessions,
    })
}
