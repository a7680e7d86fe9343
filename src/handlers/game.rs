use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::auth::RequestContext;
use crate::database::{GameResult, GameSession, NewGameSession};
use crate::error::RpcError;
use crate::rpc::{FieldErrors, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionInput {
    pub game_type: String,
    pub participants: Vec<i32>,
}

impl Validate for StartSessionInput {
    fn validate(&self) -> Result<(), RpcError> {
        let mut errors = FieldErrors::new();
        errors.required("gameType", &self.game_type, 100);

        if self.participants.is_empty() {
            errors.add("participants", "At least one participant is required");
        } else {
            let unique: HashSet<i32> = self.participants.iter().copied().collect();
            if unique.len() != self.participants.len() {
                errors.add("participants", "Participants must be unique");
            }
        }
        errors.finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionInput {
    pub session_id: i32,
    pub winner: Option<i32>,
    pub scores: Option<BTreeMap<String, i64>>,
}

impl Validate for EndSessionInput {}

/// game.startSession
pub async fn start_session(
    state: AppState,
    ctx: RequestContext,
    input: StartSessionInput,
) -> Result<GameSession, RpcError> {
    let user = ctx.require_user()?;
    let session = state
        .store
        .create_game_session(NewGameSession {
            game_type: input.game_type.trim().to_string(),
            participants: input.participants,
        })
        .await?;

    tracing::info!(session_id = session.id, started_by = user.id, "Game session started");
    Ok(session)
}

/// game.endSession - only an active session can end, and only with one of its participants
/// as winner
pub async fn end_session(
    state: AppState,
    _ctx: RequestContext,
    input: EndSessionInput,
) -> Result<GameSession, RpcError> {
    let result = GameResult {
        winner: input.winner,
        scores: input.scores,
    };
    Ok(state.store.complete_game_session(input.session_id, result).await?)
}
