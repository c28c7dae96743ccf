//! qnd Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    Auth, ClearResponse, DeleteMessageResponse, DeleteUserResponse, InstallResponse,
    ListResponse, PostResponse, QueuesResponse, TokenResponse, TruncateResponse, UpdateUser,
    UserView, UsersResponse, VersionResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Named JSON-RPC parameters
#[derive(Default)]
struct Params(Map<String, Value>);

impl Params {
    fn with(mut self, name: &str, value: impl Serialize) -> Result<Self> {
        self.0.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    fn into_object(self) -> Result<ObjectParams> {
        let mut params = ObjectParams::new();
        for (name, value) in self.0 {
            params.insert(&name, value)?;
        }
        Ok(params)
    }
}

/// HTTP JSON-RPC connection plus optional credentials
struct Connection {
    client: HttpClient,
    auth: Option<Auth>,
}

impl Connection {
    fn open(url: &str) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client, auth: None })
    }

    /// Parameters pre-filled with `auth`
    fn authed(&self) -> Result<Params> {
        let auth = self.auth.as_ref().ok_or(SdkError::MissingCredentials)?;
        Params::default().with("auth", auth)
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Params) -> Result<R> {
        let response: R = self.client.request(method, params.into_object()?).await?;
        Ok(response)
    }
}

/// Data plane client (queue users)
///
/// # Example
///
/// ```no_run
/// use qnd_sdk::{Auth, QndClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = QndClient::connect("http://127.0.0.1:8080")
///     .await?
///     .with_auth(Auth::password("alice", "secret"));
/// let truncated = client.truncate("orders").await?;
/// println!("kept {:?}, removed {}", truncated.kept, truncated.removed);
/// # Ok(())
/// # }
/// ```
pub struct QndClient {
    conn: Connection,
}

impl QndClient {
    /// Connect to the data plane
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:8080`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(url.as_ref())?,
        })
    }

    /// Use `auth` for every authenticated call
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.conn.auth = Some(auth);
        self
    }

    /// Server version (no credentials needed)
    pub async fn version(&self) -> Result<VersionResponse> {
        self.conn.call("api.version.v1", Params::default()).await
    }

    /// Exchange the configured credentials for a short-lived token
    pub async fn token(&self) -> Result<TokenResponse> {
        self.conn.call("api.token.v1", self.conn.authed()?).await
    }

    /// Append a message
    ///
    /// # Arguments
    ///
    /// * `queue` - The caller's own queue
    /// * `content` - Any JSON value; strings are stored verbatim
    pub async fn post(&self, queue: &str, content: impl Serialize) -> Result<PostResponse> {
        let params = self
            .conn
            .authed()?
            .with("queue", queue)?
            .with("content", content)?;
        self.conn.call("queue.post.v1", params).await
    }

    /// List a queue, oldest first
    pub async fn list(&self, queue: &str) -> Result<ListResponse> {
        let params = self.conn.authed()?.with("queue", queue)?;
        self.conn.call("queue.list.v1", params).await
    }

    /// Remove every message of a queue
    pub async fn clear(&self, queue: &str) -> Result<ClearResponse> {
        let params = self.conn.authed()?.with("queue", queue)?;
        self.conn.call("queue.clear.v1", params).await
    }

    /// Keep only the newest message of a queue
    pub async fn truncate(&self, queue: &str) -> Result<TruncateResponse> {
        let params = self.conn.authed()?.with("queue", queue)?;
        self.conn.call("queue.truncate.v1", params).await
    }

    /// Delete one message; a missing id is reported as `deleted: false`
    pub async fn delete(&self, id: i64) -> Result<DeleteMessageResponse> {
        let params = self.conn.authed()?.with("id", id)?;
        self.conn.call("message.delete.v1", params).await
    }
}

/// Management client (administrators)
pub struct AdminClient {
    conn: Connection,
}

impl AdminClient {
    /// Connect to the management surface
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:8888`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(url.as_ref())?,
        })
    }

    /// Use `auth` for every authenticated call
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.conn.auth = Some(auth);
        self
    }

    /// Create the first administrator; only succeeds on an empty directory
    pub async fn install(&self, username: &str, password: &str) -> Result<InstallResponse> {
        let params = Params::default()
            .with("username", username)?
            .with("password", password)?;
        self.conn.call("admin.install.v1", params).await
    }

    pub async fn users(&self) -> Result<UsersResponse> {
        self.conn.call("admin.users.list.v1", self.conn.authed()?).await
    }

    pub async fn user(&self, id: i64) -> Result<UserView> {
        let params = self.conn.authed()?.with("id", id)?;
        self.conn.call("admin.users.get.v1", params).await
    }

    /// Create a principal; an empty `queue` creates an administrator
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        queue: &str,
    ) -> Result<UserView> {
        let params = self
            .conn
            .authed()?
            .with("username", username)?
            .with("password", password)?
            .with("queue", queue)?;
        self.conn.call("admin.users.create.v1", params).await
    }

    /// Rename, rebind or change the password of a principal
    pub async fn update_user(&self, update: &UpdateUser) -> Result<UserView> {
        let mut params = self.conn.authed()?;
        if let Value::Object(fields) = serde_json::to_value(update)? {
            params.0.extend(fields);
        }
        self.conn.call("admin.users.update.v1", params).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<DeleteUserResponse> {
        let params = self.conn.authed()?.with("username", username)?;
        self.conn.call("admin.users.delete.v1", params).await
    }

    /// Administrators, owned queues and orphaned queues with message counts
    pub async fn queues(&self) -> Result<QueuesResponse> {
        self.conn.call("admin.queues.v1", self.conn.authed()?).await
    }
}
