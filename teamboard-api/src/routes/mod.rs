/// API route handlers
///
/// - `health`: health check
/// - `auth`: registration, login, token refresh
/// - `projects`: project create/read/update/delete
/// - `members`: member listing, invitations, member removal
/// - `tasks`: task create/list/read/update/delete

pub mod auth;
pub mod health;
pub mod members;
pub mod projects;
pub mod tasks;

use crate::error::{ApiError, ApiResult};
use uuid::Uuid;

/// Parses a path segment as a UUID, answering 400 when it is not one
pub(crate) fn parse_id(raw: &str, name: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {name}")))
}
