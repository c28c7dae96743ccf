//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use qnd_core::error::AppError;
use tracing::error;

/// RPC Error Codes
pub mod code {
    pub const MALFORMED_REQUEST: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const CONFLICT: i32 = 4002;
    pub const UNAUTHORIZED: i32 = 4010;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const DB_ERROR: i32 = 5001;
}

/// Convert AppError to JSON-RPC ErrorObject
///
/// Internal and storage failures are logged here, once, with their cause.
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    if err.is_internal() {
        error!(error = %err, "Request failed");
    }

    match err {
        AppError::MalformedRequest(msg) => {
            ErrorObjectOwned::owned(code::MALFORMED_REQUEST, msg, None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::MALFORMED_REQUEST, e.to_string(), None::<()>)
        }
        AppError::Serialization(e) => {
            ErrorObjectOwned::owned(code::MALFORMED_REQUEST, e.to_string(), None::<()>)
        }
        AppError::Unauthorized(msg) => {
            ErrorObjectOwned::owned(code::UNAUTHORIZED, msg, None::<()>)
        }
        AppError::NotFound(msg) => ErrorObjectOwned::owned(code::NOT_FOUND, msg, None::<()>),
        AppError::Conflict(msg) => ErrorObjectOwned::owned(code::CONFLICT, msg, None::<()>),
        // Storage details stay in the log
        AppError::Database(_) => {
            ErrorObjectOwned::owned(code::DB_ERROR, "storage failure", None::<()>)
        }
        AppError::Config(_) | AppError::Internal(_) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, "internal failure", None::<()>)
        }
    }
}

/// Re-issue a params decoding failure as a malformed request.
///
/// The deserializer's explanation (e.g. the missing field) is kept as the
/// message.
pub fn malformed_params(err: ErrorObjectOwned) -> ErrorObjectOwned {
    let detail = err
        .data()
        .and_then(|raw| serde_json::from_str::<String>(raw.get()).ok())
        .unwrap_or_else(|| err.message().to_string());
    to_rpc_error(AppError::MalformedRequest(detail))
}
