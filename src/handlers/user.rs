use serde::{Deserialize, Serialize};

use crate::auth::RequestContext;
use crate::database::{ProfileUpdate, User};
use crate::error::RpcError;
use crate::rpc::{FieldErrors, NoInput, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub hydra_head_avatar: Option<String>,
}

impl Validate for UpdateProfileInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .optional_max_len("name", self.name.as_deref(), 255)
            .optional_max_len("hydraHeadAvatar", self.hydra_head_avatar.as_deref(), 255)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: User,
}

/// user.profile - the caller's own record, read fresh from the store
pub async fn profile(state: AppState, ctx: RequestContext, _input: NoInput) -> Result<User, RpcError> {
    let user = ctx.require_user()?;
    state
        .store
        .user_by_id(user.id)
        .await?
        .ok_or_else(|| RpcError::not_found("User not found"))
}

/// user.updateProfile - name and avatar only; role and id are never client-writable
pub async fn update_profile(
    state: AppState,
    ctx: RequestContext,
    input: UpdateProfileInput,
) -> Result<UpdateProfileResponse, RpcError> {
    let user = ctx.require_user()?;
    let update = ProfileUpdate {
        name: input.name,
        hydra_head_avatar: input.hydra_head_avatar,
    };

    let user = state
        .store
        .update_profile(user.id, update)
        .await?
        .ok_or_else(|| RpcError::not_found("User not found"))?;

    Ok(UpdateProfileResponse { success: true, user })
}
