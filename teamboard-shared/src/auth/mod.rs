/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: HS256 token creation and validation
/// - [`password`]: Argon2id hashing and password strength rules
/// - [`middleware`]: credential extraction (Bearer header or `access-token` cookie)
/// - [`authorization`]: project member/owner guard
///
/// # Example
///
/// ```no_run
/// use axum::http::HeaderMap;
/// use teamboard_shared::auth::{authorization::require_membership, middleware::authenticate};
/// use teamboard_shared::store::MembershipStore;
/// use uuid::Uuid;
///
/// # async fn example(headers: HeaderMap, store: &dyn MembershipStore, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let auth = authenticate(&headers, "jwt-secret")?;
/// require_membership(store, project_id, auth.user_id).await?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
