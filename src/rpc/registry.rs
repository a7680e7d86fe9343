use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use super::tier::AccessTier;
use super::validate::Validate;
use crate::auth::RequestContext;
use crate::error::RpcError;
use crate::state::AppState;

/// Top-level procedure groups. Closed so nothing registers outside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Auth,
    User,
    Lesson,
    Progress,
    Leaderboard,
    Report,
    Game,
    Inventory,
    Notification,
    Ai,
}

impl Namespace {
    pub const ALL: [Namespace; 10] = [
        Namespace::Auth,
        Namespace::User,
        Namespace::Lesson,
        Namespace::Progress,
        Namespace::Leaderboard,
        Namespace::Report,
        Namespace::Game,
        Namespace::Inventory,
        Namespace::Notification,
        Namespace::Ai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Auth => "auth",
            Namespace::User => "user",
            Namespace::Lesson => "lesson",
            Namespace::Progress => "progress",
            Namespace::Leaderboard => "leaderboard",
            Namespace::Report => "report",
            Namespace::Game => "game",
            Namespace::Inventory => "inventory",
            Namespace::Notification => "notification",
            Namespace::Ai => "ai",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKind {
    Query,
    Mutation,
}

impl ProcedureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureKind::Query => "query",
            ProcedureKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Procedure registered twice: {0}")]
    Duplicate(String),
}

type ErasedHandler =
    Arc<dyn Fn(AppState, RequestContext, Value) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// One registered procedure with its type-erased handler
#[derive(Clone)]
pub struct Procedure {
    name: String,
    namespace: Namespace,
    kind: ProcedureKind,
    tier: AccessTier,
    handler: ErasedHandler,
}

impl Procedure {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    pub fn tier(&self) -> AccessTier {
        self.tier
    }

    /// Decode and validate `input`, run the handler, encode its output
    pub async fn invoke(
        &self,
        state: AppState,
        ctx: RequestContext,
        input: Value,
    ) -> Result<Value, RpcError> {
        (self.handler)(state, ctx, input).await
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tier", &self.tier)
            .finish()
    }
}

fn erase<I, O, F, Fut>(handler: F) -> ErasedHandler
where
    I: DeserializeOwned + Validate + Send + 'static,
    O: Serialize + Send + 'static,
    F: Fn(AppState, RequestContext, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    Arc::new(
        move |state: AppState, ctx: RequestContext, raw: Value| -> BoxFuture<'static, Result<Value, RpcError>> {
            let handler = handler.clone();
            Box::pin(async move {
                let input: I = serde_json::from_value(raw)
                    .map_err(|e| RpcError::bad_input(format!("Invalid input: {}", e)))?;
                input.validate()?;

                let output = (*handler)(state, ctx, input).await?;
                serde_json::to_value(output).map_err(|e| {
                    tracing::error!("Failed to encode procedure output: {}", e);
                    RpcError::internal("Failed to encode response")
                })
            })
        },
    )
}

/// Collects registrations; duplicates surface when the registry is built
#[derive(Default)]
pub struct RegistryBuilder {
    procedures: BTreeMap<String, Procedure>,
    duplicate: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query<I, O, F, Fut>(self, namespace: Namespace, name: &str, tier: AccessTier, handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(AppState, RequestContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.register(namespace, name, ProcedureKind::Query, tier, erase(handler))
    }

    pub fn mutation<I, O, F, Fut>(self, namespace: Namespace, name: &str, tier: AccessTier, handler: F) -> Self
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(AppState, RequestContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, RpcError>> + Send + 'static,
    {
        self.register(namespace, name, ProcedureKind::Mutation, tier, erase(handler))
    }

    fn register(
        mut self,
        namespace: Namespace,
        name: &str,
        kind: ProcedureKind,
        tier: AccessTier,
        handler: ErasedHandler,
    ) -> Self {
        let full_name = format!("{}.{}", namespace, name);
        if self.procedures.contains_key(&full_name) {
            self.duplicate.get_or_insert(full_name);
            return self;
        }

        self.procedures.insert(
            full_name.clone(),
            Procedure {
                name: full_name,
                namespace,
                kind,
                tier,
                handler,
            },
        );
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        match self.duplicate {
            Some(name) => Err(RegistryError::Duplicate(name)),
            None => Ok(Registry {
                procedures: self.procedures,
            }),
        }
    }
}

/// Immutable name → procedure table, built once at startup
#[derive(Debug)]
pub struct Registry {
    procedures: BTreeMap<String, Procedure>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }

    /// Every registered name, sorted
    pub fn names(&self) -> Vec<&str> {
        self.procedures.keys().map(String::as_str).collect()
    }

    /// Every registered procedure, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}
