/// Project membership model and database operations
///
/// A membership joins a user to a project with a role. Rows are created when
/// a project is created (the owner) or when an invitation is accepted (a
/// member), and deleted when the owner removes a member.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'member');
/// CREATE TYPE member_status AS ENUM ('pending', 'accepted', 'declined');
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role member_role NOT NULL DEFAULT 'member',
///     status member_status NOT NULL DEFAULT 'accepted',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: invite, cancel invitations, remove members, edit and delete the project
/// - **member**: read the project and participate in its tasks
///
/// Exactly one accepted owner row exists per project and it always matches
/// `projects.owner_id`.
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::membership::ProjectMember;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, project_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
/// if ProjectMember::exists_accepted(&pool, project_id, user_id).await? {
///     println!("User can see the project");
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role of a user within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    /// Project creator; holds invite/remove/cancel/delete rights
    Owner,

    /// Regular participant
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }

    /// Can invite users, cancel invitations and remove members
    pub fn can_manage_members(&self) -> bool {
        matches!(self, MemberRole::Owner)
    }

    /// Can rename or delete the project
    pub fn can_manage_project(&self) -> bool {
        matches!(self, MemberRole::Owner)
    }
}

/// Membership state
///
/// Rows written by this crate are always `Accepted`; the other states exist
/// in the schema without a write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    Pending,
    Accepted,
    Declined,
}

/// Project membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub project_id: Uuid,

    pub user_id: Uuid,

    pub role: MemberRole,

    pub status: MemberStatus,

    /// When the user joined the project
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Whether this row grants read/participate rights
    pub fn is_accepted(&self) -> bool {
        self.status == MemberStatus::Accepted
    }
}

/// Input for creating a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectMember {
    pub project_id: Uuid,

    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

/// Accepted member joined with the user's public profile
///
/// This is the row shape used to build the member list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Builds an accepted in-memory membership
    pub fn from_create(data: CreateProjectMember) -> Self {
        Self {
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            status: MemberStatus::Accepted,
            joined_at: Utc::now(),
        }
    }

    /// Creates an accepted membership
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (unique constraint violation)
    /// - Project or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create<'e, E>(executor: E, data: CreateProjectMember) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, role, status)
            VALUES ($1, $2, $3, 'accepted')
            RETURNING project_id, user_id, role, status, joined_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Finds the membership row for a (project, user) pair, in any status
    pub async fn find<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, role, status, joined_at
            FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Checks if a user is an accepted member of a project
    pub async fn exists_accepted<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $2 AND status = 'accepted'
            )
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Lists accepted members with their profiles, oldest first
    pub async fn list_accepted_profiles<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<MemberProfile>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, u.profile_image,
                   m.role, m.status, m.joined_at
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = $1 AND m.status = 'accepted'
            ORDER BY m.joined_at ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Row-locks a membership until the surrounding transaction ends
    ///
    /// Returns false if no such row exists. Task writes that assign this user
    /// share-lock the same row, so they either finish before the lock is
    /// granted or see the row gone afterwards.
    pub async fn lock_for_update<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM project_members WHERE project_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(row.is_some())
    }

    /// Deletes a membership
    ///
    /// Returns true if a row was deleted.
    pub async fn delete<'e, E>(
        executor: E,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Member.as_str(), "member");
    }

    #[test]
    fn test_role_permissions() {
        assert!(MemberRole::Owner.can_manage_members());
        assert!(MemberRole::Owner.can_manage_project());

        assert!(!MemberRole::Member.can_manage_members());
        assert!(!MemberRole::Member.can_manage_project());
    }

    #[test]
    fn test_create_membership_default_role() {
        assert_eq!(default_role(), MemberRole::Member);
    }

    #[test]
    fn test_from_create_is_accepted() {
        let member = ProjectMember::from_create(CreateProjectMember {
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: MemberRole::Member,
        });
        assert!(member.is_accepted());
    }
}
