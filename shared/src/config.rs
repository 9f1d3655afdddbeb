use crate::error::ConfigError;
use std::env;

const DEFAULT_TABLE_NAME: &str = "quickcart-users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// `sub` claim placed in the request context by the API Gateway JWT authorizer
    Authorizer,
    /// Bearer access token checked against Cognito `GetUser`
    Cognito,
}

/// Runtime settings, read once at cold start.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub store: StoreBackend,
    pub identity_source: IdentitySource,
    pub allow_user_id_header: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());

        let store = match lookup("USER_STORE").as_deref() {
            None | Some("dynamodb") => StoreBackend::DynamoDb,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "USER_STORE",
                    value: other.to_string(),
                })
            }
        };

        let identity_source = match lookup("IDENTITY_SOURCE").as_deref() {
            None | Some("authorizer") => IdentitySource::Authorizer,
            Some("cognito") => IdentitySource::Cognito,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "IDENTITY_SOURCE",
                    value: other.to_string(),
                })
            }
        };

        let allow_user_id_header = match lookup("ALLOW_USER_ID_HEADER").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "ALLOW_USER_ID_HEADER",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            table_name,
            store,
            identity_source,
            allow_user_id_header,
        })
    }
}
