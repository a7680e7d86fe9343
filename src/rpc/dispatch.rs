use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use super::registry::{ProcedureKind, Registry};
use crate::auth::RequestContext;
use crate::error::{ErrorKind, RpcError};
use crate::state::AppState;

/// Entry point for every procedure call: lookup, guard, then decode and run
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    state: AppState,
}

impl Dispatcher {
    pub fn new(registry: Registry, state: AppState) -> Self {
        Self {
            registry: Arc::new(registry),
            state,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn kind_of(&self, name: &str) -> Option<ProcedureKind> {
        self.registry.get(name).map(|p| p.kind())
    }

    pub async fn dispatch(&self, name: &str, raw: Value, ctx: RequestContext) -> Result<Value, RpcError> {
        let procedure = self
            .registry
            .get(name)
            .ok_or_else(|| RpcError::not_found(format!("No procedure named '{}'", name)))?;

        let user_id = ctx.user().map(|u| u.id);
        let request_id = ctx.request_id;

        // The guard runs before the input is even decoded
        if let Err(err) = procedure.tier().check(ctx.user()) {
            tracing::warn!(
                %request_id,
                procedure = name,
                tier = %procedure.tier(),
                user_id = ?user_id,
                code = %err.kind(),
                "Access denied"
            );
            return Err(err);
        }

        let input = match raw {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let started = Instant::now();
        let result = procedure.invoke(self.state.clone(), ctx, input).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::debug!(%request_id, procedure = name, user_id = ?user_id, elapsed_ms, "Procedure completed"),
            Err(err) if matches!(err.kind(), ErrorKind::Internal | ErrorKind::UpstreamUnavailable) => {
                tracing::error!(%request_id, procedure = name, user_id = ?user_id, code = %err.kind(), "Procedure failed: {}", err.message())
            }
            Err(err) => {
                tracing::info!(%request_id, procedure = name, user_id = ?user_id, code = %err.kind(), "Procedure rejected: {}", err.message())
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Role;
    use crate::handlers::app_registry;
    use crate::testing::{test_state, user_with_role};
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(app_registry().unwrap(), test_state())
    }

    #[tokio::test]
    async fn unknown_procedure_is_not_found() {
        let err = dispatcher()
            .dispatch("lesson.delete", json!({}), RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn guard_runs_before_input_decoding() {
        let d = dispatcher();

        // Garbage input, but the anonymous caller never gets that far
        let err = d
            .dispatch("lesson.create", json!("garbage"), RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let student = RequestContext::for_user(user_with_role(Role::User));
        let err = d.dispatch("lesson.create", json!("garbage"), student).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let teacher = RequestContext::for_user(user_with_role(Role::Teacher));
        let err = d.dispatch("lesson.create", json!("garbage"), teacher).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[tokio::test]
    async fn null_input_counts_as_empty_object() {
        let d = dispatcher();
        let top = d
            .dispatch("leaderboard.getTop", Value::Null, RequestContext::anonymous())
            .await
            .unwrap();
        assert_eq!(top, json!([]));

        let err = d
            .dispatch("lesson.get", Value::Null, RequestContext::anonymous())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadInput);
    }

    #[test]
    fn kind_lookup() {
        let d = dispatcher();
        assert_eq!(d.kind_of("auth.me"), Some(ProcedureKind::Query));
        assert_eq!(d.kind_of("auth.logout"), Some(ProcedureKind::Mutation));
        assert_eq!(d.kind_of("nope"), None);
    }
}
