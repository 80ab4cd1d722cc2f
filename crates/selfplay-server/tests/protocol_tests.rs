//! Worker protocol integration tests
//!
//! Drives `POST /next_game` and `POST /match_result` through the full router
//! the way workers do: form-encoded requests, JSON responses.

use axum::http::StatusCode;
use selfplay_server::config::{Config, DispatchConfig};
use serde_json::json;

mod helpers;

use helpers::{credentials, TestApp};

/// Best network "abcd" (id 1), candidate "efgh" (id 2), one active run
async fn app_with_open_match() -> (TestApp, i64) {
    let app = TestApp::new().await;
    let best = app.seed_network("abcd").await;
    let candidate = app.seed_network("efgh").await;
    let run = app.seed_training_run(best).await;
    let match_id = app.seed_match(run, candidate, best, "[\"--visits 10\"]").await;
    (app, match_id)
}

#[tokio::test]
async fn test_anonymous_request_gets_train_work() {
    let app = TestApp::new().await;
    let best = app.seed_network("abcd").await;
    app.seed_training_run(best).await;

    let (status, body) = app.post_form("/next_game", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"type": "train", "trainingId": 1, "networkId": 1, "sha": "abcd", "params": ""})
    );
    assert_eq!(app.scalar("SELECT COUNT(*) FROM users").await, 0);
}

#[tokio::test]
async fn test_open_match_takes_precedence() {
    let (app, _) = app_with_open_match().await;

    let (status, body) = app
        .post_form("/next_game", &credentials("default", "1234", "2"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "type": "match",
            "matchGameId": 1,
            "sha": "abcd",
            "candidateSha": "efgh",
            "params": "[\"--visits 10\"]"
        })
    );
    assert_eq!(app.scalar("SELECT COUNT(*) FROM users").await, 1);
}

#[tokio::test]
async fn test_done_match_is_never_dispatched() {
    let (app, match_id) = app_with_open_match().await;
    sqlx::query("UPDATE matches SET done = 1 WHERE id = ?")
        .bind(match_id)
        .execute(app.store.pool())
        .await
        .unwrap();

    let (status, body) = app
        .post_form("/next_game", &credentials("default", "1234", "2"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"type": "train", "trainingId": 1, "networkId": 1, "sha": "abcd", "params": ""})
    );
    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games").await, 0);
}

#[tokio::test]
async fn test_old_workers_only_train() {
    let (app, _) = app_with_open_match().await;

    let (_, old) = app.post_form("/next_game", &credentials("default", "1234", "1")).await;
    assert_eq!(old["type"], "train");

    let (_, unversioned) = app
        .post_form("/next_game", &[("user", "default"), ("password", "1234")])
        .await;
    assert_eq!(unversioned["type"], "train");

    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games").await, 0);
}

#[tokio::test]
async fn test_flip_alternates_between_allocations() {
    let (app, _) = app_with_open_match().await;

    let mut flips = Vec::new();
    for _ in 0..3 {
        let (_, body) = app.post_form("/next_game", &credentials("default", "1234", "2")).await;
        flips.push(body["flip"].as_bool().unwrap_or(false));
    }

    assert_eq!(flips, vec![false, true, false]);
}

#[tokio::test]
async fn test_bodiless_next_game_gets_train_work() {
    let (app, _) = app_with_open_match().await;

    let (status, body) = app.post_untyped("/next_game", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"type": "train", "trainingId": 1, "networkId": 1, "sha": "abcd", "params": ""})
    );

    let (status, body) = app.post_untyped("/next_game", "version=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games").await, 0);
}

#[tokio::test]
async fn test_anonymous_worker_claiming_new_version_only_trains() {
    let (app, _) = app_with_open_match().await;

    let (status, body) = app.post_form("/next_game", &[("version", "2")]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "train");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games").await, 0);
}

#[tokio::test]
async fn test_anonymous_match_result_is_unauthorized() {
    let (app, _) = app_with_open_match().await;
    app.post_form("/next_game", &credentials("default", "1234", "2")).await;

    let (status, body) = app
        .post_form(
            "/match_result",
            &[("version", "2"), ("match_game_id", "1"), ("result", "1"), ("pgn", "1. e4")],
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games WHERE done = 1").await, 0);
}

#[tokio::test]
async fn test_match_result_recorded() {
    let (app, _) = app_with_open_match().await;
    app.post_form("/next_game", &credentials("default", "1234", "2")).await;

    let mut form = credentials("default", "1234", "2");
    form.extend([("match_game_id", "1"), ("result", "-1"), ("pgn", "asdf")]);
    let (status, body) = app.post_form("/match_result", &form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["match_done"], false);

    let (result, pgn, done): (i64, String, bool) =
        sqlx::query_as("SELECT result, pgn, done FROM match_games WHERE id = 1")
            .fetch_one(app.store.pool())
            .await
            .unwrap();
    assert_eq!((result, pgn.as_str(), done), (-1, "asdf", true));

    let (status, body) = app.post_form("/match_result", &form).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_match_result_rejections() {
    let (app, _) = app_with_open_match().await;
    app.post_form("/next_game", &credentials("default", "1234", "2")).await;

    let mut unknown = credentials("default", "1234", "2");
    unknown.extend([("match_game_id", "42"), ("result", "1"), ("pgn", "")]);
    let (status, body) = app.post_form("/match_result", &unknown).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let mut out_of_range = credentials("default", "1234", "2");
    out_of_range.extend([("match_game_id", "1"), ("result", "3")]);
    let (status, body) = app.post_form("/match_result", &out_of_range).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut intruder = credentials("default", "guess", "2");
    intruder.extend([("match_game_id", "1"), ("result", "1")]);
    let (status, body) = app.post_form("/match_result", &intruder).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games WHERE done = 1").await, 0);
}

#[tokio::test]
async fn test_wrong_password_gets_no_work() {
    let (app, _) = app_with_open_match().await;
    app.post_form("/next_game", &credentials("default", "1234", "2")).await;

    let (status, body) = app.post_form("/next_game", &credentials("default", "4321", "2")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(app.scalar("SELECT COUNT(*) FROM match_games").await, 1);
}

#[tokio::test]
async fn test_no_active_training_run() {
    let app = TestApp::new().await;

    let (status, body) = app.post_form("/next_game", &[]).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_completion_policy_closes_match() {
    let config = Config {
        dispatch: DispatchConfig {
            match_games: 1,
            ..DispatchConfig::default()
        },
        ..Config::default()
    };
    let app = TestApp::with_config(config).await;
    let best = app.seed_network("abcd").await;
    let candidate = app.seed_network("efgh").await;
    let run = app.seed_training_run(best).await;
    app.seed_match(run, candidate, best, "").await;

    let (_, work) = app.post_form("/next_game", &credentials("default", "1234", "2")).await;
    assert_eq!(work["type"], "match");

    let mut report = credentials("default", "1234", "2");
    report.extend([("match_game_id", "1"), ("result", "1"), ("pgn", "1. e4 e5")]);
    let (_, body) = app.post_form("/match_result", &report).await;
    assert_eq!(body["data"]["match_done"], true);

    let (_, work) = app.post_form("/next_game", &credentials("default", "1234", "2")).await;
    assert_eq!(work["type"], "train");
}
