// Application Layer - Use Cases and Business Logic

pub mod access;
pub mod auth;
pub mod constants;
pub mod directory;
pub mod lifecycle;
pub mod messages;
pub mod registry;
pub mod truncate;

// Re-exports
pub use access::{Access, AccessGuard};
pub use auth::AuthService;
pub use directory::{CreatePrincipalRequest, IdentityDirectory, UpdatePrincipalRequest};
pub use lifecycle::{DeletePolicy, QueueLifecycleManager, RebindOutcome, Rebinding};
pub use messages::{MessageService, TruncateOutcome};
pub use registry::{QueueOverview, QueueRegistry};
pub use truncate::{plan_truncation, TruncationPlan};
