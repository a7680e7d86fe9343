use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::oauth::{complete_login, decode_state, OAuthClient, OAuthError};
use crate::auth::RequestContext;
use crate::config::ServerConfig;
use crate::error::RpcError;
use crate::middleware::{resolve_identity, ApiResponse, ApiResult};
use crate::rpc::{Dispatcher, ProcedureKind};

/// Router state: the dispatcher (which owns the shared collaborators) plus the login client
#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Dispatcher,
    pub oauth: Option<Arc<OAuthClient>>,
}

impl ServerState {
    pub fn new(dispatcher: Dispatcher, oauth: Option<OAuthClient>) -> Self {
        Self {
            dispatcher,
            oauth: oauth.map(Arc::new),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    let cors = cors_layer(&state.dispatcher.state().config.server);

    let rpc = Router::new()
        .route("/api/rpc/:procedure", get(rpc_query).post(rpc_call))
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_identity));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/oauth/callback", get(oauth_callback))
        .merge(rpc)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[derive(Debug, Deserialize)]
struct RpcQuery {
    input: Option<String>,
}

/// GET /api/rpc/:procedure?input=<json> - queries only
async fn rpc_query(
    State(server): State<ServerState>,
    Path(procedure): Path<String>,
    Query(query): Query<RpcQuery>,
    Extension(ctx): Extension<RequestContext>,
) -> ApiResult<Value> {
    if server.dispatcher.kind_of(&procedure) == Some(ProcedureKind::Mutation) {
        return Err(RpcError::bad_input(format!(
            "{} is a mutation and must be sent with POST",
            procedure
        )));
    }

    let input = match query.input.as_deref().map(str::trim) {
        None | Some("") => Value::Null,
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| RpcError::bad_input(format!("Input is not valid JSON: {}", e)))?,
    };

    let data = server.dispatcher.dispatch(&procedure, input, ctx).await?;
    Ok(ApiResponse::success(data))
}

/// POST /api/rpc/:procedure - queries and mutations, JSON body as input
async fn rpc_call(
    State(server): State<ServerState>,
    Path(procedure): Path<String>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> ApiResult<Value> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| RpcError::bad_input(format!("Body is not valid JSON: {}", e)))?
    };

    let data = server.dispatcher.dispatch(&procedure, input, ctx).await?;
    Ok(ApiResponse::success(data))
}

#[derive(Debug, Deserialize)]
struct OAuthCallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// GET /api/oauth/callback - finish an external login and start a session
async fn oauth_callback(
    State(server): State<ServerState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Response, RpcError> {
    let (Some(code), Some(state)) = (query.code, query.state) else {
        return Err(RpcError::bad_input("code and state are required"));
    };

    let client = server.oauth.as_ref().ok_or(OAuthError::NotConfigured)?;
    let redirect_uri = decode_state(&state)?;
    let access_token = client.exchange_code(&code, &redirect_uri).await?;
    let profile = client.user_info(&access_token).await?;

    let app = server.dispatcher.state();
    let (_user, token) = complete_login(
        app.store.as_ref(),
        &app.sessions,
        app.config.oauth.owner_open_id.as_deref(),
        &profile,
    )
    .await?;

    let cookie = HeaderValue::from_str(&app.sessions.session_cookie(&token)).map_err(|e| {
        tracing::error!("Invalid session cookie: {}", e);
        RpcError::internal("Failed to create session")
    })?;

    let mut response = (StatusCode::FOUND, [(header::LOCATION, HeaderValue::from_static("/"))]).into_response();
    response.headers_mut().append(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn root(State(server): State<ServerState>) -> Json<Value> {
    let registry = server.dispatcher.registry();

    Json(json!({
        "success": true,
        "data": {
            "name": "HydraLearn API",
            "version": env!("CARGO_PKG_VERSION"),
            "procedures": registry.len(),
            "endpoints": {
                "health": "/health (public)",
                "rpc": "/api/rpc/:procedure (GET for queries, POST for queries and mutations)",
                "login": "/api/oauth/callback (public)",
            }
        }
    }))
}

async fn health(State(server): State<ServerState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match server.dispatcher.state().store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "code": "UPSTREAM_UNAVAILABLE",
                    "message": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
