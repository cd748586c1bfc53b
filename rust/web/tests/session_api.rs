mod common;

use blackjack_web::TableConfig;
use common::*;
use serde_json::json;
use warp::http::StatusCode;

#[tokio::test]
async fn session_api_lifecycle() {
    let ctx = context();

    let (status, created) = request(
        &ctx,
        "POST",
        "/api/sessions",
        Some(json!({ "seed": 1337, "player_name": "Dana" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["session_id"].as_str().expect("session id").to_string();
    assert_eq!(created["config"]["seed"], 1337);
    assert_eq!(created["state"]["player_name"], "Dana");
    assert_eq!(created["state"]["phase"], "betting");
    assert_eq!(created["state"]["chips"], 1000);

    let (status, info) = request(&ctx, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["session_id"], id.as_str());
    assert!(info["created_at"].as_str().unwrap().ends_with('Z'));

    let (status, state) = request(&ctx, "GET", &format!("/api/sessions/{id}/state"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["available_actions"], json!(["bet", "clear_bet"]));

    let (status, _) = request(&ctx, "DELETE", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = request(&ctx, "GET", &format!("/api/sessions/{id}/state"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn create_accepts_an_empty_body() {
    let ctx = context();
    let routes = blackjack_web::WebServer::routes(&ctx);
    let response = warp::test::request()
        .method("POST")
        .path("/api/sessions")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["state"]["player_name"], "Player");
}

#[tokio::test]
async fn full_round_through_commands() {
    let ctx = context();
    let id = table_on(&ctx, TableConfig::default(), &STAND_18_LOSES_TO_20);

    let (status, bet) = command(&ctx, &id, json!({ "command": "bet", "amount": 75 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bet["state"]["bet"], 75);
    let (status, bet) = command(&ctx, &id, json!({ "command": "add_chip", "amount": 25 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bet["state"]["bet"], 100);
    assert_eq!(bet["events"][0]["kind"], "bet_changed");

    let (status, dealt) = command(&ctx, &id, json!({ "command": "deal" })).await;
    assert_eq!(status, StatusCode::OK);
    let state = &dealt["state"];
    assert_eq!(state["phase"], "playing");
    assert_eq!(state["chips"], 900);
    assert_eq!(state["player_hand"]["score"], 18);
    assert_eq!(state["dealer_hand"]["score"], 6);
    assert_eq!(state["dealer_hand"]["hole_hidden"], true);
    assert!(state["dealer_hand"]["cards"][1].is_null());
    assert_eq!(
        state["available_actions"],
        json!(["hit", "stand", "double_down"])
    );
    let hole = dealt["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["kind"] == "card_dealt" && e["seat"] == "dealer")
        .nth(1)
        .expect("hole card event")
        .clone();
    assert!(hole["card"].is_null());

    let (status, stood) = command(&ctx, &id, json!({ "command": "stand" })).await;
    assert_eq!(status, StatusCode::OK);
    let state = &stood["state"];
    assert_eq!(state["phase"], "game_over");
    assert_eq!(state["dealer_hand"]["hole_hidden"], false);
    assert_eq!(state["dealer_hand"]["score"], 20);
    assert_eq!(state["last_result"]["outcome"], "lose");
    assert_eq!(state["last_result"]["message"], "Dealer wins with a higher score!");
    assert_eq!(state["chips"], 900);

    let (status, stats) = request(&ctx, "GET", &format!("/api/sessions/{id}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["gamesPlayed"], 1);
    assert_eq!(stats["stats"]["gamesLost"], 1);
    assert_eq!(stats["stats"]["totalWinnings"], -100);
    assert_eq!(stats["stats"]["currentStreak"], -1);
    assert_eq!(stats["win_rate"], 0.0);

    let (status, next) = command(&ctx, &id, json!({ "command": "new_round" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["state"]["phase"], "betting");
    assert!(next["state"]["player_hand"]["cards"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn natural_pays_three_to_two_and_unlocks_first_win() {
    let ctx = context();
    let id = table_on(&ctx, TableConfig::default(), &NATURAL_WIN);

    command(&ctx, &id, json!({ "command": "bet", "amount": 100 })).await;
    let (status, dealt) = command(&ctx, &id, json!({ "command": "deal" })).await;
    assert_eq!(status, StatusCode::OK);

    let result = &dealt["state"]["last_result"];
    assert_eq!(result["outcome"], "win");
    assert_eq!(result["payout"], 250);
    assert_eq!(result["unlocked"][0]["title"], "🎉 First Victory");
    assert_eq!(dealt["state"]["chips"], 1150);

    let (status, achievements) =
        request(&ctx, "GET", &format!("/api/sessions/{id}/achievements"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(achievements["unlocked"], 1);
    assert_eq!(achievements["total"], 8);
}

#[tokio::test]
async fn rejected_commands_map_to_status_codes() {
    let ctx = context();
    let id = table_on(&ctx, TableConfig::default(), &STAND_18_LOSES_TO_20);

    let (status, body) = command(&ctx, &id, json!({ "command": "hit" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_command");
    assert_eq!(body["details"]["command"], "hit");
    assert_eq!(body["details"]["phase"], "betting");

    let (status, body) = command(&ctx, &id, json!({ "command": "deal" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no_bet_placed");
    assert_eq!(body["message"], "Please place a bet first");

    let (status, body) = command(&ctx, &id, json!({ "command": "bet", "amount": 5000 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_bet");
    assert_eq!(body["details"]["chips"], 1000);

    let (status, body) = command(&ctx, &id, json!({ "command": "grant_chips", "amount": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");

    let (status, body) =
        command(&ctx, &id, json!({ "command": "grant_chips", "amount": u32::MAX })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "chip_limit");
    assert_eq!(body["details"]["amount"], u32::MAX);

    let (status, body) = command(&ctx, &id, json!({ "command": "split" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");

    // nothing above changed the table
    let (_, state) = request(&ctx, "GET", &format!("/api/sessions/{id}/state"), None).await;
    assert_eq!(state["chips"], 1000);
    assert_eq!(state["bet"], 0);
}

#[tokio::test]
async fn unknown_routes_and_sessions_are_json_404s() {
    let ctx = context();

    let (status, body) = request(&ctx, "GET", "/api/sessions/nope/stats", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["session_id"], "nope");

    let (status, body) = request(&ctx, "GET", "/api/tables", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = request(&ctx, "DELETE", "/api/sessions/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "session_not_found");
}

#[tokio::test]
async fn reset_progress_over_http() {
    let ctx = context();
    let id = table_on(&ctx, TableConfig::default(), &NATURAL_WIN);
    command(&ctx, &id, json!({ "command": "bet", "amount": 100 })).await;
    command(&ctx, &id, json!({ "command": "deal" })).await;

    let (status, reset) = command(&ctx, &id, json!({ "command": "reset_progress" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reset["state"]["phase"], "betting");
    assert_eq!(reset["state"]["chips"], 1000);
    assert!(reset["events"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["kind"] == "progress_reset"));

    let (_, achievements) =
        request(&ctx, "GET", &format!("/api/sessions/{id}/achievements"), None).await;
    assert_eq!(achievements["unlocked"], 0);
}

#[tokio::test]
async fn health_reports_open_tables() {
    let ctx = context();
    ctx.sessions()
        .create_session(TableConfig::default())
        .expect("create");

    let (status, body) = request(&ctx, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 1);
}
