/// Project authorization guard
///
/// Two predicates sit in front of every membership operation:
///
/// - **member**: an accepted membership row exists for (project, user)
/// - **owner**: `projects.owner_id` equals the user
///
/// Both are read-only lookups against the [`MembershipStore`]. A project that
/// does not exist simply fails the check, so callers cannot tell a missing
/// project from one they have no access to.
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::auth::authorization::require_ownership;
/// use teamboard_shared::store::MembershipStore;
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn MembershipStore, project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_ownership(store, project_id, user_id).await?;
/// # Ok(())
/// # }
/// ```

use tracing::debug;
use uuid::Uuid;

use crate::store::{MembershipStore, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User has no accepted membership in the project
    #[error("Not a member of project {0}")]
    NotProjectMember(Uuid),

    /// User is not the project owner
    #[error("Not the owner of project {0}")]
    NotProjectOwner(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// True if the user holds an accepted membership in the project
pub async fn is_accepted_member(
    store: &dyn MembershipStore,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, StoreError> {
    store.is_accepted_member(project_id, user_id).await
}

/// True if the user owns the project
pub async fn is_owner(
    store: &dyn MembershipStore,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, StoreError> {
    store.is_project_owner(project_id, user_id).await
}

/// Fails with [`AuthzError::NotProjectMember`] unless the user is an accepted member
pub async fn require_membership(
    store: &dyn MembershipStore,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if !is_accepted_member(store, project_id, user_id).await? {
        debug!(%project_id, %user_id, "Membership check failed");
        return Err(AuthzError::NotProjectMember(project_id));
    }

    Ok(())
}

/// Fails with [`AuthzError::NotProjectOwner`] unless the user owns the project
pub async fn require_ownership(
    store: &dyn MembershipStore,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), AuthzError> {
    if !is_owner(store, project_id, user_id).await? {
        debug!(%project_id, %user_id, "Ownership check failed");
        return Err(AuthzError::NotProjectOwner(project_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{project::CreateProject, user::CreateUser};
    use crate::store::InMemoryMembershipStore;

    #[tokio::test]
    async fn test_owner_passes_both_checks() {
        let store = InMemoryMembershipStore::new();
        let owner = store
            .insert_user(CreateUser::local("alice@example.com", "Alice"))
            .unwrap();
        let project = store
            .create_project_with_owner(
                CreateProject {
                    name: "Apollo".to_string(),
                    description: None,
                    owner_id: owner.id,
                },
                1,
            )
            .await
            .unwrap()
            .unwrap();

        assert!(require_membership(&store, project.id, owner.id).await.is_ok());
        assert!(require_ownership(&store, project.id, owner.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_project_fails_checks() {
        let store = InMemoryMembershipStore::new();
        let project_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        assert!(matches!(
            require_membership(&store, project_id, user_id).await,
            Err(AuthzError::NotProjectMember(id)) if id == project_id
        ));
        assert!(matches!(
            require_ownership(&store, project_id, user_id).await,
            Err(AuthzError::NotProjectOwner(id)) if id == project_id
        ));
    }

    #[test]
    fn test_authz_error_display() {
        let id = Uuid::new_v4();
        assert!(AuthzError::NotProjectMember(id).to_string().contains("Not a member"));
        assert!(AuthzError::NotProjectOwner(id).to_string().contains("Not the owner"));
    }
}
