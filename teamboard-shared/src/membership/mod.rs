/// Project membership and invitation services
///
/// [`MembershipService`] is the entry point for everything that changes who
/// can see a project:
///
/// - [`invitation`]: invite, cancel and accept (the invitation state machine)
/// - [`lifecycle`]: member listing and removal
/// - [`projects`]: project create/read/update/delete with the ownership cap
/// - [`tasks`]: task create/list/read/update/delete inside a project
/// - [`dto`]: response shapes and the status mapping used at the HTTP edge
///
/// Every operation receives the requester explicitly and runs the
/// authorization guard before any write. Multi-row changes go through the
/// store's atomic units; nothing here retries.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_shared::membership::MembershipService;
/// use teamboard_shared::store::InMemoryMembershipStore;
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid, owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let service = MembershipService::new(Arc::new(InMemoryMembershipStore::new()));
/// let invitation_id = service.invite(project_id, owner_id, "bob@example.com").await?;
/// println!("Invited: {invitation_id}");
/// # Ok(())
/// # }
/// ```

pub mod dto;
pub mod invitation;
pub mod lifecycle;
pub mod projects;
pub mod tasks;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::models::invitation::never_expires;
use crate::store::{MembershipStore, StoreError};

/// Default cap on projects a single user may own
pub const DEFAULT_MAX_OWNED_PROJECTS: i64 = 5;

/// Caller-visible failures of membership operations
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("Not a member of project {0}")]
    NotProjectMember(Uuid),

    #[error("Not the owner of project {0}")]
    NotProjectOwner(Uuid),

    /// Referenced entity is missing or not addressable
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User not found")]
    UserNotFound,

    /// Malformed input or a disallowed transition
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("User is already a member of this project")]
    AlreadyMember,

    #[error("Email has already been invited to this project")]
    AlreadyInvited,

    #[error("Invitation has already been processed")]
    AlreadyProcessed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MembershipError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MembershipError::InvalidRequest(message.into())
    }
}

impl From<AuthzError> for MembershipError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotProjectMember(id) => MembershipError::NotProjectMember(id),
            AuthzError::NotProjectOwner(id) => MembershipError::NotProjectOwner(id),
            AuthzError::Store(e) => MembershipError::Store(e),
        }
    }
}

/// Result type for membership operations
pub type MembershipResult<T> = Result<T, MembershipError>;

/// Tunable rules
#[derive(Debug, Clone, Copy)]
pub struct MembershipPolicy {
    /// A user owning this many projects cannot create another
    pub max_owned_projects: i64,

    /// Lifetime of new invitations; None means they never expire
    pub invitation_ttl: Option<Duration>,
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        Self {
            max_owned_projects: DEFAULT_MAX_OWNED_PROJECTS,
            invitation_ttl: None,
        }
    }
}

impl MembershipPolicy {
    /// Deadline for an invitation created at `now`
    pub fn invitation_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.invitation_ttl
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or_else(never_expires)
    }
}

/// Membership service over a [`MembershipStore`]
///
/// Cheap to clone; shares the store.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn MembershipStore>,
    policy: MembershipPolicy,
}

impl MembershipService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self::with_policy(store, MembershipPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn MembershipStore>, policy: MembershipPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &dyn MembershipStore {
        self.store.as_ref()
    }

    pub fn policy(&self) -> &MembershipPolicy {
        &self.policy
    }
}

/// Trims and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Bob@Example.COM\n"), "bob@example.com");
    }

    #[test]
    fn test_default_policy_never_expires() {
        let policy = MembershipPolicy::default();
        assert_eq!(policy.max_owned_projects, 5);
        assert_eq!(policy.invitation_expiry(Utc::now()), never_expires());
    }

    #[test]
    fn test_policy_with_ttl() {
        let policy = MembershipPolicy {
            invitation_ttl: Some(Duration::hours(48)),
            ..Default::default()
        };
        let now = Utc::now();
        assert_eq!(policy.invitation_expiry(now), now + Duration::hours(48));
    }

    #[test]
    fn test_authz_error_conversion() {
        let id = Uuid::new_v4();
        assert!(matches!(
            MembershipError::from(AuthzError::NotProjectOwner(id)),
            MembershipError::NotProjectOwner(got) if got == id
        ));
    }
}
