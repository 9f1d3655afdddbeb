use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    // product id -> quantity by convention; shape is whatever the client last sent
    #[serde(rename = "cartItem", default = "empty_cart")]
    pub cart_item: Value,
    /// Attributes owned by other writers (role, created_at, ...), passed through as stored
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: None,
            image_url: None,
            cart_item: empty_cart(),
            extra: serde_json::Map::new(),
        }
    }
}

fn empty_cart() -> Value {
    Value::Object(serde_json::Map::new())
}

// ========== CART ==========
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    #[serde(rename = "cartData")]
    pub cart_data: Value,
}

// ========== RESPONSES ==========
#[derive(Debug, Serialize)]
pub struct UserEnvelope<'a> {
    pub success: bool,
    pub user: &'a User,
}

#[derive(Debug, Serialize)]
pub struct CartEnvelope<'a> {
    pub success: bool,
    #[serde(rename = "cartItems")]
    pub cart_items: &'a Value,
}

#[derive(Debug, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub message: String,
}

impl FailureEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
