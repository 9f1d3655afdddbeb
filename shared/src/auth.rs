use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use lambda_http::{Request, RequestExt};

/// Header honoured in local development when the authorizer is not in front of us
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Resolves the caller of a request to a user id issued by the identity provider.
///
/// Returns `None` when no identity can be established. Callers do not reject
/// that up front; the lookup by id simply finds nothing.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn resolve_identity(&self, request: &Request) -> Option<String>;
}

/// Reads the `sub` claim the API Gateway JWT authorizer (Cognito user pool)
/// attaches to the request context.
#[derive(Debug, Default)]
pub struct AuthorizerIdentity {
    allow_header_override: bool,
}

impl AuthorizerIdentity {
    pub fn new(allow_header_override: bool) -> Self {
        Self {
            allow_header_override,
        }
    }
}

#[async_trait]
impl IdentityVerifier for AuthorizerIdentity {
    async fn resolve_identity(&self, request: &Request) -> Option<String> {
        if self.allow_header_override {
            if let Some(user_id) = header_user_id(request) {
                tracing::info!("Using {} header override: {}", USER_ID_HEADER, user_id);
                return Some(user_id);
            }
        }

        let user_id = request
            .request_context_ref()
            .and_then(|ctx| ctx.authorizer())
            .and_then(|auth| auth.jwt.as_ref())
            .and_then(|jwt| jwt.claims.get("sub"))
            .map(|s| s.to_string());

        if user_id.is_none() {
            tracing::warn!("Could not extract user ID from authorizer claims");
        }
        user_id
    }
}

/// Verifies the bearer access token with Cognito `GetUser`.
pub struct CognitoIdentity {
    client: CognitoClient,
}

impl CognitoIdentity {
    pub fn new(client: CognitoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityVerifier for CognitoIdentity {
    async fn resolve_identity(&self, request: &Request) -> Option<String> {
        let token = bearer_token(request)?;

        match self.client.get_user().access_token(token).send().await {
            Ok(output) => {
                let sub = output
                    .user_attributes()
                    .iter()
                    .find(|attr| attr.name() == "sub")
                    .and_then(|attr| attr.value())
                    .map(|s| s.to_string());
                Some(sub.unwrap_or_else(|| output.username().to_string()))
            }
            Err(e) => {
                tracing::error!("Cognito GetUser failed: {:?}", e);
                None
            }
        }
    }
}

fn header_user_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get("Authorization")?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
