use crate::domain::errors::MatchError;
use crate::interface_adapters::clients::auth::{TokenVerifier, VerifyTokenError};
use crate::interface_adapters::http::{ApiError, json_rejection, match_error, registry_error};
use crate::interface_adapters::protocol::{
    AnimationCompleteResponse, CreateMatchRequest, CreateMatchResponse, SubmitActionRequest,
    SubmitActionResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MatchView, PlayerId, SidePair};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use tracing::{debug, warn};

// Upper bound on accepted bearer tokens.
const MAX_TOKEN_LEN: usize = 4096;

// Handler for creating a match; called by matchmaking, not by players.
pub async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMatchResponse>), ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;
    let handle = state
        .registry
        .create_match(payload.match_id, SidePair::new(payload.player1, payload.player2))
        .await
        .map_err(|err| {
            warn!(error = %err, "match creation rejected");
            registry_error(err)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateMatchResponse {
            match_id: handle.match_id.to_string(),
        }),
    ))
}

// Handler for submitting the caller's action for the current turn.
pub async fn submit_action(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<SubmitActionRequest>, JsonRejection>,
) -> Result<Json<SubmitActionResponse>, ApiError> {
    let player = authenticate(state.verifier.as_ref(), &headers).await.map_err(match_error)?;
    let Json(payload) = payload.map_err(|rejection| {
        debug!(%match_id, player, error = %rejection, "action payload rejected");
        json_rejection(rejection)
    })?;

    let receipt = state
        .registry
        .submit_action(&match_id, player, payload.into())
        .await
        .map_err(|err| {
            debug!(%match_id, player, error = %err, "action rejected");
            match_error(err)
        })?;

    Ok(Json(receipt.into()))
}

// Handler for the ready-for-next-turn handshake.
pub async fn animation_complete(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AnimationCompleteResponse>, ApiError> {
    let player = authenticate(state.verifier.as_ref(), &headers).await.map_err(match_error)?;

    let next_turn_ready = state
        .registry
        .confirm_animation(&match_id, player)
        .await
        .map_err(match_error)?;

    Ok(Json(AnimationCompleteResponse { next_turn_ready }))
}

// Handler for the caller's filtered view of a match.
pub async fn match_state(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MatchView>, ApiError> {
    let player = authenticate(state.verifier.as_ref(), &headers).await.map_err(match_error)?;

    let view = state
        .registry
        .state_for(&match_id, player)
        .await
        .map_err(match_error)?;

    Ok(Json(view))
}

// Resolves `Authorization: Bearer <token>` into a verified player id.
async fn authenticate(verifier: &dyn TokenVerifier, headers: &HeaderMap) -> Result<PlayerId, MatchError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.len() <= MAX_TOKEN_LEN)
        .ok_or(MatchError::Unauthenticated)?;

    verify(verifier, token).await
}

pub(crate) async fn verify(verifier: &dyn TokenVerifier, token: &str) -> Result<PlayerId, MatchError> {
    match verifier.verify_token(token).await {
        Ok(identity) => {
            debug!(player_id = identity.user_id, session_id = %identity.session_id, "token verified");
            Ok(identity.user_id)
        }
        Err(VerifyTokenError::InvalidToken | VerifyTokenError::SessionExpired) => {
            Err(MatchError::Unauthenticated)
        }
        Err(VerifyTokenError::UpstreamUnavailable) => {
            warn!("auth service unavailable during token verification");
            Err(MatchError::AuthUnavailable)
        }
    }
}
