use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::resolve;
use crate::server::ServerState;

/// Resolve the caller's identity into a `RequestContext` extension. After the call, emits the
/// cookie-clearing header if a handler asked for it.
pub async fn resolve_identity(
    State(server): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let app = server.dispatcher.state();
    let ctx = match resolve(app.store.as_ref(), &app.sessions, request.headers()).await {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };

    let session = ctx.session.clone();
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;

    if session.should_clear() {
        match HeaderValue::from_str(&app.sessions.clear_cookie()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid clear-cookie header: {}", e),
        }
    }

    response
}
