use crate::interface_adapters::handlers::{animation_complete, create_match, match_state, submit_action};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/matches", post(create_match))
        .route("/matches/{match_id}/actions", post(submit_action))
        .route("/matches/{match_id}/animation-complete", post(animation_complete))
        .route("/matches/{match_id}/state", get(match_state))
        .route("/matches/{match_id}/ws", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::clients::auth::{TokenVerifier, VerifiedIdentity, VerifyTokenError};
    use crate::interface_adapters::state::{InMemoryMatchStore, SystemClock};
    use crate::use_cases::{MatchRegistry, MatchSettings};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    // Tokens are `player-<id>`; `expired` and `down` simulate auth failures.
    struct FakeVerifier;

    #[async_trait]
    impl TokenVerifier for FakeVerifier {
        async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyTokenError> {
            match token {
                "expired" => Err(VerifyTokenError::SessionExpired),
                "down" => Err(VerifyTokenError::UpstreamUnavailable),
                _ => {
                    let user_id = token
                        .strip_prefix("player-")
                        .and_then(|id| id.parse().ok())
                        .ok_or(VerifyTokenError::InvalidToken)?;
                    Ok(VerifiedIdentity {
                        user_id,
                        session_id: format!("session-{user_id}"),
                    })
                }
            }
        }
    }

    fn build_test_app() -> Router {
        let registry = MatchRegistry::new(
            MatchSettings::default(),
            Arc::new(InMemoryMatchStore::default()),
            Arc::new(SystemClock),
        );
        app(AppState {
            registry: Arc::new(registry),
            verifier: Arc::new(FakeVerifier),
        })
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("expected request to build")
    }

    fn empty_request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .expect("expected request to build")
    }

    async fn body_json(response: Response<Body>) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("expected response body");
        serde_json::from_slice(&body).expect("expected json body")
    }

    async fn create(app: &Router, match_id: &str) -> Response<Body> {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/matches",
                None,
                json!({ "player1": 1, "player2": 2, "matchId": match_id }),
            ))
            .await
            .unwrap()
    }

    async fn submit(app: &Router, token: &str, piece: &str, col: i32, row: i32) -> Response<Body> {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/matches/m-1/actions",
                Some(token),
                json!({ "actingPieceId": piece, "kind": "move", "destination": { "col": col, "row": row } }),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn when_match_is_created_then_returns_201_with_match_id() {
        let app = build_test_app();

        let response = create(&app, "m-1").await;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["matchId"], "m-1");
    }

    #[tokio::test]
    async fn when_match_id_is_reused_then_returns_409() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = create(&app, "m-1").await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn when_players_are_identical_then_returns_400_invalid_argument() {
        let app = build_test_app();

        let response = app
            .oneshot(json_request("POST", "/matches", None, json!({ "player1": 4, "player2": 4 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn when_bearer_is_missing_then_returns_401() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/matches/m-1/state")
                    .body(Body::empty())
                    .expect("expected request to build"),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn when_session_is_expired_then_returns_401() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app.oneshot(empty_request("GET", "/matches/m-1/state", "expired")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn when_auth_is_down_then_returns_500_internal() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app.oneshot(empty_request("GET", "/matches/m-1/state", "down")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "internal");
    }

    #[tokio::test]
    async fn when_match_is_unknown_then_returns_404() {
        let app = build_test_app();

        let response = app.oneshot(empty_request("GET", "/matches/nope/state", "player-1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "not-found");
    }

    #[tokio::test]
    async fn when_caller_is_not_a_player_then_returns_403() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app.oneshot(empty_request("GET", "/matches/m-1/state", "player-3")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "permission-denied");
    }

    #[tokio::test]
    async fn when_state_is_requested_then_enemy_pieces_are_concealed() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app.oneshot(empty_request("GET", "/matches/m-1/state", "player-2")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["playerRole"], "guest");
        assert_eq!(payload["turnCounter"], 0);
        assert_eq!(payload["turnReady"], true);
        assert_eq!(payload["pieces"]["host_0"]["concealed"], true);
        assert_eq!(payload["pieces"]["host_0"]["hp"], 0);
        assert_eq!(payload["pieces"]["guest_0"]["hp"], 3);
    }

    #[tokio::test]
    async fn when_both_players_submit_then_second_gets_resolved_turn() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let first = submit(&app, "player-1", "host_0", 0, 5).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(body_json(first).await["status"], "waiting");

        let second = submit(&app, "player-2", "guest_0", 0, 1).await;
        assert_eq!(second.status(), StatusCode::OK);
        let payload = body_json(second).await;
        assert_eq!(payload["status"], "resolved");
        assert_eq!(payload["playerRole"], "guest");
        assert_eq!(payload["animationCommands"][0]["type"], "move");
        assert_eq!(payload["animationCommands"][0]["cardId"], "host_0");
        assert_eq!(payload["state"]["turnCounter"], 1);
    }

    #[tokio::test]
    async fn when_action_is_submitted_twice_then_returns_409_already_submitted() {
        let app = build_test_app();
        create(&app, "m-1").await;
        submit(&app, "player-1", "host_0", 0, 5).await;

        let response = submit(&app, "player-1", "host_1", 1, 5).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "already-submitted");
    }

    #[tokio::test]
    async fn when_piece_belongs_to_opponent_then_returns_403() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = submit(&app, "player-1", "guest_0", 0, 1).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn when_destination_is_off_board_then_returns_400() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = submit(&app, "player-1", "host_0", 3, 5).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn when_previous_turn_is_animating_then_returns_412_until_both_confirm() {
        let app = build_test_app();
        create(&app, "m-1").await;
        submit(&app, "player-1", "host_0", 0, 5).await;
        submit(&app, "player-2", "guest_0", 0, 1).await;

        let locked = submit(&app, "player-1", "host_0", 0, 4).await;
        assert_eq!(locked.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(body_json(locked).await["code"], "failed-precondition");

        let first = app
            .clone()
            .oneshot(empty_request("POST", "/matches/m-1/animation-complete", "player-1"))
            .await
            .unwrap();
        assert_eq!(body_json(first).await["nextTurnReady"], false);
        let second = app
            .clone()
            .oneshot(empty_request("POST", "/matches/m-1/animation-complete", "player-2"))
            .await
            .unwrap();
        assert_eq!(body_json(second).await["nextTurnReady"], true);

        let reopened = submit(&app, "player-1", "host_0", 0, 4).await;
        assert_eq!(reopened.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn when_action_payload_is_missing_fields_then_returns_400_invalid_argument() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app
            .oneshot(json_request("POST", "/matches/m-1/actions", Some("player-1"), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn when_action_kind_is_unknown_then_returns_400_invalid_argument() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/matches/m-1/actions",
                Some("player-1"),
                json!({ "actingPieceId": "host_0", "kind": "fly", "destination": { "col": 0, "row": 5 } }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = body_json(response).await;
        assert_eq!(payload["code"], "invalid-argument");
        assert!(payload["message"].as_str().is_some_and(|m| m.contains("fly")));
    }

    #[tokio::test]
    async fn when_malformed_action_has_no_bearer_then_returns_401_first() {
        let app = build_test_app();
        create(&app, "m-1").await;

        let response = app
            .oneshot(json_request("POST", "/matches/m-1/actions", None, json!({ "kind": 7 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn when_create_body_is_not_json_then_returns_400_invalid_argument() {
        let app = build_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/matches")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("expected request to build"),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn when_matches_route_is_called_with_get_then_returns_405() {
        let app = build_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/matches")
                    .body(Body::empty())
                    .expect("expected request to build"),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
