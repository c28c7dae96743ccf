//! RPC Method Handlers
//!
//! Authenticates each request, then delegates to the application services.

use crate::error::to_rpc_error;
use crate::types::{
    AuthRequest, ClearResponse, CreateUserRequest, DeleteMessageRequest, DeleteMessageResponse,
    DeleteUserRequest, DeleteUserResponse, GetUserRequest, InstallRequest, InstallResponse,
    ListResponse, OrphanedQueue, OwnedQueue, PostRequest, PostResponse, QueueRequest,
    QueuesResponse, TokenResponse, TruncateResponse, UpdateUserRequest, UserView, UsersResponse,
    VersionResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use qnd_core::application::{
    AccessGuard, AuthService, CreatePrincipalRequest, IdentityDirectory, MessageService,
    QueueRegistry,
};
use qnd_core::domain::{Credentials, MessageContent, Principal};
use qnd_core::error::AppError;
use std::sync::Arc;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected services
pub struct RpcHandler {
    auth: Arc<AuthService>,
    guard: Arc<AccessGuard>,
    messages: Arc<MessageService>,
    directory: Arc<IdentityDirectory>,
    registry: Arc<QueueRegistry>,
}

impl RpcHandler {
    pub fn new(
        auth: Arc<AuthService>,
        guard: Arc<AccessGuard>,
        messages: Arc<MessageService>,
        directory: Arc<IdentityDirectory>,
        registry: Arc<QueueRegistry>,
    ) -> Self {
        Self {
            auth,
            guard,
            messages,
            directory,
            registry,
        }
    }

    async fn authenticate(&self, credentials: &Credentials) -> RpcResult<Principal> {
        self.auth
            .authenticate(credentials)
            .await
            .map_err(to_rpc_error)
    }

    async fn authenticate_admin(&self, credentials: &Credentials) -> RpcResult<Principal> {
        let requester = self.authenticate(credentials).await?;
        self.guard
            .authorize_admin(&requester)
            .await
            .map_err(to_rpc_error)
    }

    // ---- Data plane ----

    /// api.version.v1
    pub fn version(&self) -> VersionResponse {
        VersionResponse {
            version: qnd_core::VERSION.to_string(),
        }
    }

    /// api.token.v1
    pub async fn token(&self, req: AuthRequest) -> RpcResult<TokenResponse> {
        let principal = self.authenticate(&req.auth).await?;
        let issued = self.auth.issue_token(&principal).map_err(to_rpc_error)?;

        Ok(TokenResponse {
            token: issued.token,
            duration: issued.duration,
        })
    }

    /// queue.post.v1
    pub async fn post(&self, req: PostRequest) -> RpcResult<PostResponse> {
        let requester = self.authenticate(&req.auth).await?;
        let message = self
            .messages
            .append(&requester, &req.queue, MessageContent::from_json(req.content))
            .await
            .map_err(to_rpc_error)?;

        Ok(PostResponse {
            id: message.id,
            queue: message.queue,
        })
    }

    /// queue.list.v1
    pub async fn list(&self, req: QueueRequest) -> RpcResult<ListResponse> {
        let requester = self.authenticate(&req.auth).await?;
        let messages = self
            .messages
            .list(&requester, &req.queue)
            .await
            .map_err(to_rpc_error)?;

        Ok(ListResponse {
            queue: req.queue,
            messages,
        })
    }

    /// queue.clear.v1
    pub async fn clear(&self, req: QueueRequest) -> RpcResult<ClearResponse> {
        let requester = self.authenticate(&req.auth).await?;
        let removed = self
            .messages
            .clear(&requester, &req.queue)
            .await
            .map_err(to_rpc_error)?;

        Ok(ClearResponse {
            queue: req.queue,
            removed,
        })
    }

    /// queue.truncate.v1
    pub async fn truncate(&self, req: QueueRequest) -> RpcResult<TruncateResponse> {
        let requester = self.authenticate(&req.auth).await?;
        let outcome = self
            .messages
            .truncate(&requester, &req.queue)
            .await
            .map_err(to_rpc_error)?;

        Ok(TruncateResponse {
            queue: req.queue,
            removed: outcome.removed,
            kept: outcome.kept,
        })
    }

    /// message.delete.v1
    pub async fn delete_message(
        &self,
        req: DeleteMessageRequest,
    ) -> RpcResult<DeleteMessageResponse> {
        let requester = self.authenticate(&req.auth).await?;
        let deleted = self
            .messages
            .delete_by_id(&requester, req.id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteMessageResponse {
            id: req.id,
            deleted,
        })
    }

    // ---- Management ----

    /// admin.install.v1 (unauthenticated, empty directory only)
    pub async fn install(&self, req: InstallRequest) -> RpcResult<InstallResponse> {
        let admin = self
            .directory
            .install(&req.username, &req.password)
            .await
            .map_err(to_rpc_error)?;

        Ok(InstallResponse {
            id: admin.id,
            username: admin.username,
        })
    }

    /// admin.users.list.v1
    pub async fn list_users(&self, req: AuthRequest) -> RpcResult<UsersResponse> {
        self.authenticate_admin(&req.auth).await?;
        let principals = self.directory.list_all().await.map_err(to_rpc_error)?;

        Ok(UsersResponse {
            usernames: principals.into_iter().map(|p| p.username).collect(),
        })
    }

    /// admin.users.get.v1
    pub async fn get_user(&self, req: GetUserRequest) -> RpcResult<UserView> {
        self.authenticate_admin(&req.auth).await?;
        self.directory
            .find_by_id(req.id)
            .await
            .map_err(to_rpc_error)?
            .map(UserView::from)
            .ok_or_else(|| to_rpc_error(AppError::NotFound(format!("User {} not found", req.id))))
    }

    /// admin.users.create.v1
    pub async fn create_user(&self, req: CreateUserRequest) -> RpcResult<UserView> {
        self.authenticate_admin(&req.auth).await?;
        let created = self
            .directory
            .create(CreatePrincipalRequest {
                username: req.username,
                password: req.password,
                queue: req.queue,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(created.into())
    }

    /// admin.users.update.v1
    pub async fn update_user(&self, req: UpdateUserRequest) -> RpcResult<UserView> {
        self.authenticate_admin(&req.auth).await?;
        let updated = self
            .directory
            .update(req.into_directory_request())
            .await
            .map_err(to_rpc_error)?;

        Ok(updated.into())
    }

    /// admin.users.delete.v1
    pub async fn delete_user(&self, req: DeleteUserRequest) -> RpcResult<DeleteUserResponse> {
        self.authenticate_admin(&req.auth).await?;
        let deleted = self
            .directory
            .delete(&req.username)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteUserResponse {
            username: req.username,
            deleted,
        })
    }

    /// admin.queues.v1
    pub async fn queues(&self, req: AuthRequest) -> RpcResult<QueuesResponse> {
        self.authenticate_admin(&req.auth).await?;
        let overview = self.registry.overview().await.map_err(to_rpc_error)?;

        Ok(QueuesResponse {
            administrators: overview
                .administrators
                .into_iter()
                .map(|p| p.username)
                .collect(),
            queues: overview
                .queues
                .into_iter()
                .map(|q| OwnedQueue {
                    owner: q.owner.unwrap_or_default(),
                    queue: q.queue,
                    messages: q.message_count,
                })
                .collect(),
            orphaned: overview
                .orphaned
                .into_iter()
                .map(|q| OrphanedQueue {
                    queue: q.queue,
                    messages: q.message_count,
                })
                .collect(),
        })
    }
}
