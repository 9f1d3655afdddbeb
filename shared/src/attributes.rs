//! Conversion between JSON documents and DynamoDB attribute maps.
//!
//! User documents are stored attribute-per-field, with nested JSON (the cart)
//! kept as native `M`/`L` values so the table stays readable in the console.

use crate::error::CartError;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

pub fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(items.into_iter().map(to_attribute).collect()),
        Value::Object(fields) => AttributeValue::M(to_item(fields)),
    }
}

pub fn to_item(fields: Map<String, Value>) -> HashMap<String, AttributeValue> {
    fields
        .into_iter()
        .map(|(k, v)| (k, to_attribute(v)))
        .collect()
}

pub fn from_attribute(attr: &AttributeValue) -> Result<Value, CartError> {
    let value = match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(from_attribute)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(fields) => Value::Object(from_item(fields)?),
        other => {
            return Err(CartError::Corrupt(format!(
                "unsupported attribute type: {:?}",
                other
            )))
        }
    };
    Ok(value)
}

pub fn from_item(item: &HashMap<String, AttributeValue>) -> Result<Map<String, Value>, CartError> {
    item.iter()
        .map(|(k, v)| from_attribute(v).map(|v| (k.clone(), v)))
        .collect()
}

fn parse_number(n: &str) -> Result<Number, CartError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Number::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| CartError::Corrupt(format!("invalid number attribute: {}", n)))
}
