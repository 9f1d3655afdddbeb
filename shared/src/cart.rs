use crate::error::CartError;
use crate::types::{CartEnvelope, FailureEnvelope, UpdateCartRequest, User, UserEnvelope};
use crate::users::UserRepository;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use serde_json::Value;

/// Replace the caller's cart with the `cartData` payload.
///
/// The payload is stored as sent and only `cartItem` is written. An absent
/// identity is not rejected here; it matches no document and fails as
/// `UserNotFound`, as does a document deleted before the write lands.
pub async fn update_cart(
    users: &dyn UserRepository,
    user_id: Option<&str>,
    body: &[u8],
) -> Result<User, CartError> {
    let req: UpdateCartRequest = serde_json::from_slice(body)?;

    match user_id {
        Some(id) => users.replace_cart(id, req.cart_data).await,
        None => Err(CartError::UserNotFound),
    }
}

/// Fetch the caller's stored cart.
pub async fn get_cart(users: &dyn UserRepository, user_id: Option<&str>) -> Result<Value, CartError> {
    let user = load_user(users, user_id).await?;
    Ok(user.cart_item)
}

async fn load_user(users: &dyn UserRepository, user_id: Option<&str>) -> Result<User, CartError> {
    let found = match user_id {
        Some(id) => users.find_by_id(id).await?,
        None => None,
    };
    found.ok_or(CartError::UserNotFound)
}

/// POST /api/cart/update
pub async fn update_cart_response(
    users: &dyn UserRepository,
    user_id: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    match update_cart(users, user_id, body).await {
        Ok(user) => {
            tracing::info!("Cart updated for user: {}", user.id);
            json_response(&UserEnvelope {
                success: true,
                user: &user,
            })
        }
        Err(e) => failure_response(user_id, e),
    }
}

/// GET /api/cart/get
pub async fn get_cart_response(
    users: &dyn UserRepository,
    user_id: Option<&str>,
) -> Result<Response<Body>, Error> {
    match get_cart(users, user_id).await {
        Ok(cart_items) => json_response(&CartEnvelope {
            success: true,
            cart_items: &cart_items,
        }),
        Err(e) => failure_response(user_id, e),
    }
}

// Failures are reported in the body; the status stays 200.
fn failure_response(user_id: Option<&str>, error: CartError) -> Result<Response<Body>, Error> {
    tracing::error!(
        "Cart request failed for user {}: {:?}",
        user_id.unwrap_or("<none>"),
        error
    );
    json_response(&FailureEnvelope::new(error.to_string()))
}

fn json_response<T: Serialize>(payload: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(payload)?.into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::InMemoryUserRepository;
    use async_trait::async_trait;
    use serde_json::json;

    fn repo_with_u1() -> InMemoryUserRepository {
        InMemoryUserRepository::with_users([User::new("u1")])
    }

    fn body_json(response: &Response<Body>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    struct UnavailableStore;

    #[async_trait]
    impl UserRepository for UnavailableStore {
        async fn find_by_id(&self, _user_id: &str) -> Result<Option<User>, CartError> {
            Err(CartError::Store("connection refused".to_string()))
        }

        async fn replace_cart(&self, _user_id: &str, _cart: Value) -> Result<User, CartError> {
            Err(CartError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_update_replaces_cart() {
        let repo = repo_with_u1();

        let user = update_cart(&repo, Some("u1"), br#"{"cartData": {"p1": 2}}"#)
            .await
            .unwrap();
        assert_eq!(user.cart_item, json!({"p1": 2}));

        let stored = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.cart_item, json!({"p1": 2}));
    }

    #[tokio::test]
    async fn test_update_leaves_other_fields_alone() {
        let mut user = User::new("u1");
        user.email = Some("a@b.c".to_string());
        user.extra.insert("role".to_string(), json!("admin"));
        user.extra.insert("created_at".to_string(), json!("2026-01-01T00:00:00Z"));
        let repo = InMemoryUserRepository::with_users([user]);

        let updated = update_cart(&repo, Some("u1"), br#"{"cartData": {"p1": 2}}"#)
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("a@b.c"));
        assert_eq!(updated.name, None);

        let stored = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.extra.get("role"), Some(&json!("admin")));
        assert_eq!(stored.extra.get("created_at"), Some(&json!("2026-01-01T00:00:00Z")));
        assert_eq!(stored.cart_item, json!({"p1": 2}));
    }

    #[tokio::test]
    async fn test_update_after_user_deleted_does_not_recreate() {
        let repo = repo_with_u1();
        assert!(repo.find_by_id("u1").await.unwrap().is_some());
        repo.remove("u1").await.unwrap();

        let err = update_cart(&repo, Some("u1"), br#"{"cartData": {"p1": 1}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn test_update_does_not_merge() {
        let repo = repo_with_u1();

        update_cart(&repo, Some("u1"), br#"{"cartData": {"p1": 2, "p2": 1}}"#)
            .await
            .unwrap();
        update_cart(&repo, Some("u1"), br#"{"cartData": {"p3": 5}}"#)
            .await
            .unwrap();

        let stored = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.cart_item, json!({"p3": 5}));
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let repo = repo_with_u1();
        let body = br#"{"cartData": {"p1": 2}}"#;

        let once = update_cart(&repo, Some("u1"), body).await.unwrap();
        let twice = update_cart(&repo, Some("u1"), body).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(repo.find_by_id("u1").await.unwrap().unwrap(), once);
    }

    #[tokio::test]
    async fn test_missing_user_fails_without_creating_document() {
        let repo = repo_with_u1();

        let err = update_cart(&repo, Some("u404"), br#"{"cartData": {"p1": 1}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
        assert!(repo.find_by_id("u404").await.unwrap().is_none());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_absent_identity_fails_as_missing_user() {
        let repo = repo_with_u1();

        let err = update_cart(&repo, None, br#"{"cartData": {}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
    }

    #[tokio::test]
    async fn test_malformed_body_fails() {
        let repo = repo_with_u1();

        let err = update_cart(&repo, Some("u1"), br#"{"items": {}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidBody(_)));

        let err = update_cart(&repo, Some("u1"), b"not json").await.unwrap_err();
        assert!(matches!(err, CartError::InvalidBody(_)));

        // stored cart untouched
        let stored = repo.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(stored.cart_item, json!({}));
    }

    #[tokio::test]
    async fn test_concurrent_updates_last_write_wins() {
        let repo = repo_with_u1();
        let a = br#"{"cartData": {"a": 1}}"#;
        let b = br#"{"cartData": {"b": 2}}"#;

        let (ra, rb) = tokio::join!(
            update_cart(&repo, Some("u1"), a),
            update_cart(&repo, Some("u1"), b)
        );
        ra.unwrap();
        rb.unwrap();

        let stored = repo.find_by_id("u1").await.unwrap().unwrap().cart_item;
        assert!(stored == json!({"a": 1}) || stored == json!({"b": 2}));
    }

    #[tokio::test]
    async fn test_update_response_success_envelope() {
        let repo = repo_with_u1();

        let response = update_cart_response(&repo, Some("u1"), br#"{"cartData": {"p1": 2}}"#)
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let body = body_json(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["_id"], "u1");
        assert_eq!(body["user"]["cartItem"], json!({"p1": 2}));
    }

    #[tokio::test]
    async fn test_update_response_failure_envelope() {
        let repo = repo_with_u1();

        let response = update_cart_response(&repo, Some("u404"), br#"{"cartData": {"p1": 1}}"#)
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = body_json(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User not found");
        assert!(body.get("user").is_none());
    }

    #[tokio::test]
    async fn test_store_failure_message_is_passed_through() {
        let response = update_cart_response(&UnavailableStore, Some("u1"), br#"{"cartData": {}}"#)
            .await
            .unwrap();

        let body = body_json(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Document store error: connection refused");
    }

    #[tokio::test]
    async fn test_get_cart_after_update() {
        let repo = repo_with_u1();
        update_cart(&repo, Some("u1"), br#"{"cartData": {"p1": 2}}"#)
            .await
            .unwrap();

        let response = get_cart_response(&repo, Some("u1")).await.unwrap();
        let body = body_json(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["cartItems"], json!({"p1": 2}));

        let response = get_cart_response(&repo, None).await.unwrap();
        assert_eq!(body_json(&response)["success"], false);
    }
}
