#![allow(dead_code)]

use blackjack_engine::cards::{Card, Rank, Suit};
use blackjack_engine::shoe::Shoe;
use blackjack_web::{AppContext, ServerConfig, SessionId, TableConfig};
use serde_json::Value;
use warp::http::StatusCode;

pub const NATURAL_WIN: [Rank; 4] = [Rank::Ace, Rank::Nine, Rank::King, Rank::Seven];
pub const STAND_18_LOSES_TO_20: [Rank; 5] =
    [Rank::Ten, Rank::Six, Rank::Eight, Rank::Ten, Rank::Four];

pub fn context() -> AppContext {
    AppContext::new(ServerConfig::for_tests()).expect("test context")
}

pub fn context_with_data_dir(dir: &std::path::Path) -> AppContext {
    AppContext::new(ServerConfig::for_tests().with_data_dir(dir)).expect("test context")
}

/// A shoe dealing `ranks` in order: player, dealer up, player, dealer hole, then draws.
pub fn stacked(ranks: &[Rank]) -> Shoe {
    const SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
    Shoe::stacked(
        ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| Card::new(SUITS[i % 4], r)),
        21,
    )
}

pub fn table_on(ctx: &AppContext, config: TableConfig, ranks: &[Rank]) -> SessionId {
    ctx.sessions()
        .create_session_with_shoe(config, stacked(ranks))
        .expect("create stacked session")
}

pub async fn request(
    ctx: &AppContext,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let routes = blackjack_web::WebServer::routes(ctx);
    let mut req = warp::test::request().method(method).path(path);
    if let Some(body) = body {
        req = req.json(&body);
    }
    let response = req.reply(&routes).await;
    let status = response.status();
    let json = if response.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(response.body()).expect("json body")
    };
    (status, json)
}

pub async fn command(ctx: &AppContext, id: &str, body: Value) -> (StatusCode, Value) {
    request(ctx, "POST", &format!("/api/sessions/{id}/commands"), Some(body)).await
}
