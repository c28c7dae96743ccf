// Application constants (No magic values)

/// Default token lifetime (10 minutes)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 600;
