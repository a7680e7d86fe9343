use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::LeaderboardEntry;
use crate::error::RpcError;
use crate::rpc::{FieldErrors, Validate};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct TopInput {
    pub limit: Option<i64>,
}

impl Validate for TopInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .range("limit", self.limit, 1, MAX_LIMIT)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRankInput {
    pub user_id: i32,
}

impl Validate for UserRankInput {}

/// leaderboard.getTop - highest total XP first; tied users share a rank
pub async fn get_top(state: AppState, _ctx: RequestContext, input: TopInput) -> Result<Vec<LeaderboardEntry>, RpcError> {
    let limit = input.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(state.store.leaderboard_top(limit).await?)
}

/// leaderboard.getUserRank - null when the user has no leaderboard row yet
pub async fn get_user_rank(
    state: AppState,
    _ctx: RequestContext,
    input: UserRankInput,
) -> Result<Option<LeaderboardEntry>, RpcError> {
    Ok(state.store.leaderboard_entry(input.user_id).await?)
}
