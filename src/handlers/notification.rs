use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::Notification;
use crate::error::RpcError;
use crate::rpc::{NoInput, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadInput {
    pub notification_id: i32,
}

impl Validate for MarkReadInput {}

/// notification.list - newest first
pub async fn list(state: AppState, ctx: RequestContext, _input: NoInput) -> Result<Vec<Notification>, RpcError> {
    let user = ctx.require_user()?;
    Ok(state.store.user_notifications(user.id).await?)
}

/// notification.markAsRead - someone else's notification reads as missing
pub async fn mark_as_read(
    state: AppState,
    ctx: RequestContext,
    input: MarkReadInput,
) -> Result<Notification, RpcError> {
    let user = ctx.require_user()?;
    state
        .store
        .mark_notification_read(user.id, input.notification_id)
        .await?
        .ok_or_else(|| RpcError::not_found(format!("Notification {} not found", input.notification_id)))
}
