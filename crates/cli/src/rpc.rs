//! Minimal JSON-RPC 2.0 over HTTP

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Credentials from flags or environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// The `auth` parameter: a token wins over username/password
    pub fn to_auth(&self) -> Result<Value> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(json!({ "token": token }));
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(json!({ "username": username, "password": password }))
            }
            _ => anyhow::bail!(
                "no credentials: pass --token (QND_TOKEN) or --username/--password (QND_USERNAME/QND_PASSWORD)"
            ),
        }
    }
}

/// Params object for an authenticated method: `auth` plus `fields`
pub fn authed(credentials: &Credentials, fields: Value) -> Result<Value> {
    let mut params = match fields {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => anyhow::bail!("params must be an object, got {}", other),
    };
    params.insert("auth".to_string(), credentials.to_auth()?);
    Ok(Value::Object(params))
}

pub async fn call(url: &str, method: &str, params: Value) -> Result<Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0",
        method,
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {}", url))?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preferred_over_password() {
        let creds = Credentials {
            token: Some("t".into()),
            username: Some("alice".into()),
            password: Some("pw".into()),
        };
        assert_eq!(creds.to_auth().unwrap(), json!({"token": "t"}));
    }

    #[test]
    fn test_empty_token_falls_back_to_password() {
        let creds = Credentials {
            token: Some(String::new()),
            username: Some("alice".into()),
            password: Some("pw".into()),
        };
        assert_eq!(
            creds.to_auth().unwrap(),
            json!({"username": "alice", "password": "pw"})
        );
    }

    #[test]
    fn test_missing_credentials() {
        let creds = Credentials {
            username: Some("alice".into()),
            ..Default::default()
        };
        assert!(creds.to_auth().is_err());
    }

    #[test]
    fn test_authed_merges_fields() {
        let creds = Credentials {
            token: Some("t".into()),
            ..Default::default()
        };
        let params = authed(&creds, json!({"queue": "orders"})).unwrap();
        assert_eq!(params, json!({"queue": "orders", "auth": {"token": "t"}}));
    }
}
