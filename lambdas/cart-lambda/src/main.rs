use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use cart_shared::auth::{AuthorizerIdentity, CognitoIdentity, IdentityVerifier};
use cart_shared::config::{Config, IdentitySource, StoreBackend};
use cart_shared::users::{DynamoUserRepository, InMemoryUserRepository, UserRepository};
use cart_shared::AppState;
use lambda_http::{run, service_fn, tracing, Error, Request};
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env()?;

    // Initialize AWS clients once at startup
    let sdk_config = aws_config::load_from_env().await;

    let identity: Box<dyn IdentityVerifier> = match config.identity_source {
        IdentitySource::Authorizer => {
            Box::new(AuthorizerIdentity::new(config.allow_user_id_header))
        }
        IdentitySource::Cognito => Box::new(CognitoIdentity::new(CognitoClient::new(&sdk_config))),
    };

    let users: Box<dyn UserRepository> = match config.store {
        StoreBackend::DynamoDb => Box::new(DynamoUserRepository::new(
            DynamoClient::new(&sdk_config),
            config.table_name.clone(),
        )),
        StoreBackend::Memory => {
            tracing::warn!("USER_STORE=memory: user documents will not outlive this process");
            Box::new(InMemoryUserRepository::new())
        }
    };

    tracing::info!(
        "Cart lambda starting - table: {} store: {:?} identity: {:?}",
        config.table_name,
        config.store,
        config.identity_source
    );

    let state = AppState::new(config, identity, users);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
