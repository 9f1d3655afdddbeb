use cart_shared::{cart, AppState};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use std::sync::Arc;

/// Main Lambda handler - routes cart requests
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("Cart Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
            .header(
                "Access-Control-Allow-Headers",
                "Content-Type,Authorization,X-User-Id",
            )
            .body(Body::Empty)
            .map_err(Box::new)?);
    }

    let path = path.trim_end_matches('/');
    if path != "/api/cart/update" && path != "/api/cart/get" {
        tracing::warn!("No route matched - Method: {} Path: {}", method, path);
        return error_response(StatusCode::NOT_FOUND, "Not found");
    }

    // Identity is resolved only once a route has matched.
    match (method, path) {
        (&Method::POST, "/api/cart/update") => {
            let user_id = resolve_user_id(&state, &event).await;
            cart::update_cart_response(state.users.as_ref(), user_id.as_deref(), event.body())
                .await
        }
        (&Method::GET, "/api/cart/get") => {
            let user_id = resolve_user_id(&state, &event).await;
            cart::get_cart_response(state.users.as_ref(), user_id.as_deref()).await
        }
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}

async fn resolve_user_id(state: &AppState, event: &Request) -> Option<String> {
    let user_id = state.identity.resolve_identity(event).await;
    tracing::info!("User ID: {}", user_id.as_deref().unwrap_or("<none>"));
    user_id
}

fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
}
