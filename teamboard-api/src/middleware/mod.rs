/// Middleware for the API server
///
/// - `auth`: JWT authentication, injects `AuthContext`
/// - `security`: security response headers

pub mod auth;
pub mod security;
