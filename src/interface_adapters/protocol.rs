// Wire protocol DTOs for the public match API and the push channel.

use crate::domain::action::{Action, ActionKind, AnimationCommand};
use crate::domain::entities::{Position, Side};
use crate::domain::resolver::Outcome;
use crate::use_cases::{MatchView, SubmitReceipt};
use serde::{Deserialize, Serialize};

/// Body of `POST /matches`, sent by matchmaking once two players are paired.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    // Attacker participant.
    pub player1: u64,
    // Defender participant.
    pub player2: u64,
    // Optional match id; when omitted the server generates one.
    #[serde(default)]
    pub match_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchResponse {
    pub match_id: String,
}

/// Body of `POST /matches/{id}/actions`. The acting side comes from the caller's identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActionRequest {
    pub acting_piece_id: String,
    pub kind: ActionKind,
    pub destination: Position,
}

impl From<SubmitActionRequest> for Action {
    fn from(request: SubmitActionRequest) -> Self {
        Action::new(request.acting_piece_id, request.kind, request.destination)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitActionResponse {
    #[serde(rename_all = "camelCase")]
    Waiting { player_role: Side, state: MatchView },
    #[serde(rename_all = "camelCase")]
    Resolved {
        player_role: Side,
        animation_commands: Vec<AnimationCommand>,
        outcome: Option<Outcome>,
        state: MatchView,
    },
}

impl From<SubmitReceipt> for SubmitActionResponse {
    fn from(receipt: SubmitReceipt) -> Self {
        match receipt.resolution {
            None => SubmitActionResponse::Waiting {
                player_role: receipt.side,
                state: receipt.view,
            },
            // The raw snapshot covers hidden enemies; callers get the filtered view instead.
            Some(resolution) => SubmitActionResponse::Resolved {
                player_role: receipt.side,
                animation_commands: resolution.commands,
                outcome: resolution.outcome,
                state: receipt.view,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationCompleteResponse {
    pub next_turn_ready: bool,
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Verified identity for the connection after Join is accepted.
    Identity { player_id: String },
    // Filtered match state for this connection's player.
    MatchState(MatchView),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message carrying the auth session token.
    Join(JoinPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub session_token: String,
}
