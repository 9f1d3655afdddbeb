use crate::attributes;
use crate::error::CartError;
use crate::types::User;
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    operation::update_item::builders::UpdateItemFluentBuilder,
    types::{AttributeValue, ReturnValue},
    Client as DynamoClient,
};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Persistence for user documents. Documents are owned by the sign-up flow;
/// this service reads them and writes only the cart field.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, CartError>;

    /// Overwrites `cartItem` on an existing document and returns the updated user.
    /// Other attributes are left alone. A missing document is `UserNotFound`
    /// and is never created. No version check: last write wins.
    async fn replace_cart(&self, user_id: &str, cart: Value) -> Result<User, CartError>;
}

/// Users stored in a single DynamoDB table under `PK = SK = USER#<id>`.
pub struct DynamoUserRepository {
    client: DynamoClient,
    table_name: String,
}

impl DynamoUserRepository {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Conditional single-attribute update; fails instead of creating the item.
    fn cart_update(&self, user_id: &str, cart: Value) -> UpdateItemFluentBuilder {
        let pk = user_key(user_id);

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
            .update_expression("SET cartItem = :cart")
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_values(":cart", attributes::to_attribute(cart))
            .return_values(ReturnValue::AllNew)
    }
}

fn user_key(user_id: &str) -> String {
    format!("USER#{}", user_id)
}

/// Rebuilds a user from its item, dropping the key attributes.
fn user_from_item(user_id: &str, item: &HashMap<String, AttributeValue>) -> Result<User, CartError> {
    let mut fields = attributes::from_item(item)?;
    fields.remove("PK");
    fields.remove("SK");
    fields.insert("_id".to_string(), Value::String(user_id.to_string()));

    serde_json::from_value(Value::Object(fields)).map_err(|e| CartError::Corrupt(e.to_string()))
}

#[async_trait]
impl UserRepository for DynamoUserRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, CartError> {
        let pk = user_key(user_id);

        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
            .send()
            .await
            .map_err(|e| CartError::Store(DisplayErrorContext(&e).to_string()))?;

        result
            .item()
            .map(|item| user_from_item(user_id, item))
            .transpose()
    }

    async fn replace_cart(&self, user_id: &str, cart: Value) -> Result<User, CartError> {
        let result = self.cart_update(user_id, cart).send().await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception());
                if missing {
                    return Err(CartError::UserNotFound);
                }
                return Err(CartError::Store(DisplayErrorContext(&e).to_string()));
            }
        };

        tracing::info!("Replaced cart on user document {}", user_id);

        let item = output
            .attributes()
            .ok_or_else(|| CartError::Corrupt("update returned no attributes".to_string()))?;
        user_from_item(user_id, item)
    }
}

/// Process-local store for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Drops a document, as the sign-up flow's account deletion would.
    pub async fn remove(&self, user_id: &str) -> Option<User> {
        self.users.write().await.remove(user_id)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, CartError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn replace_cart(&self, user_id: &str, cart: Value) -> Result<User, CartError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or(CartError::UserNotFound)?;
        user.cart_item = cart;
        Ok(user.clone())
    }
}
