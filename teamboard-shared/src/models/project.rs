/// Project model and database operations
///
/// A project is owned by exactly one user. The owner is recorded twice: as
/// `projects.owner_id` and as an accepted `owner` row in `project_members`.
/// Both are written in the same transaction (see
/// [`crate::store::MembershipStore::create_project_with_owner`]).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// The single owner; never changes through membership operations
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Input for updating a project
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Aggregated counters shown alongside a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub member_count: i64,
    pub todo_count: i64,
    pub in_progress_count: i64,
    pub done_count: i64,
}

const PROJECT_COLUMNS: &str = "id, name, description, owner_id, created_at, updated_at";

impl Project {
    /// Builds an in-memory project with fresh timestamps
    pub fn from_create(data: CreateProject) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts a project row
    ///
    /// Callers must also insert the owner's member row in the same
    /// transaction.
    pub async fn create<'e, E>(executor: E, data: CreateProject) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO projects (name, description, owner_id) \
             VALUES ($1, $2, $3) RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.owner_id)
            .fetch_one(executor)
            .await
    }

    /// Finds a project by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Checks whether `user_id` owns the project
    ///
    /// Returns false when the project does not exist.
    pub async fn is_owned_by<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM projects
                WHERE id = $1 AND owner_id = $2
            )
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Counts projects owned by a user
    pub async fn count_by_owner<'e, E>(executor: E, owner_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Updates name and/or description
    ///
    /// Returns None if the project doesn't exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE projects \
             SET name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .fetch_optional(executor)
            .await
    }

    /// Deletes a project
    ///
    /// Members, invitations and tasks go with it (`ON DELETE CASCADE`).
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes member and per-status task counters in one query
    pub async fn stats<'e, E>(executor: E, id: Uuid) -> Result<ProjectStats, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (member_count, todo_count, in_progress_count, done_count): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM project_members WHERE project_id = $1),
                    (SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND status = 'todo'),
                    (SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND status = 'in_progress'),
                    (SELECT COUNT(*) FROM tasks WHERE project_id = $1 AND status = 'done')
                "#,
            )
            .bind(id)
            .fetch_one(executor)
            .await?;

        Ok(ProjectStats {
            member_count,
            todo_count,
            in_progress_count,
            done_count,
        })
    }
}
