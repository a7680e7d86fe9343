use super::Ack;
use crate::auth::RequestContext;
use crate::database::User;
use crate::error::RpcError;
use crate::rpc::NoInput;
use crate::state::AppState;

/// auth.me - the resolved identity, or null for anonymous callers
pub async fn me(_state: AppState, ctx: RequestContext, _input: NoInput) -> Result<Option<User>, RpcError> {
    Ok(ctx.user)
}

/// auth.logout - ask the transport to drop the session cookie
pub async fn logout(_state: AppState, ctx: RequestContext, _input: NoInput) -> Result<Ack, RpcError> {
    if let Some(user) = ctx.user() {
        tracing::info!(user_id = user.id, "User signed out");
    }
    ctx.session.clear_session();
    Ok(Ack::ok())
}
