/// PostgreSQL-backed membership store
///
/// Reads run directly on the pool. Each atomic unit opens its own
/// transaction; dropping the transaction without `commit` rolls it back, so
/// every early return below leaves the database untouched.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use teamboard_shared::store::{MembershipStore, PgMembershipStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/teamboard")).await?;
/// let store: Arc<dyn MembershipStore> = Arc::new(PgMembershipStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::{AcceptOutcome, MembershipStore, StoreError, StoreResult};
use crate::models::{
    invitation::{CreateInvitation, Invitation},
    membership::{CreateProjectMember, MemberProfile, MemberRole, ProjectMember},
    project::{CreateProject, Project, ProjectStats, UpdateProject},
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, User},
};

/// Membership store on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| StoreError::from_write(e, "email already registered"))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>> {
        Ok(User::find_by_emails(&self.pool, emails).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn is_project_owner(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Project::is_owned_by(&self.pool, project_id, user_id).await?)
    }

    async fn create_project_with_owner(
        &self,
        data: CreateProject,
        max_owned: i64,
    ) -> StoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        // Concurrent creates by the same owner queue on the user row lock
        let owner_id = data.owner_id;
        User::lock_for_update(&mut *tx, owner_id).await?;

        if Project::count_by_owner(&mut *tx, owner_id).await? >= max_owned {
            tx.rollback().await?;
            return Ok(None);
        }

        let project = Project::create(&mut *tx, data).await?;

        ProjectMember::create(
            &mut *tx,
            CreateProjectMember {
                project_id: project.id,
                user_id: owner_id,
                role: MemberRole::Owner,
            },
        )
        .await
        .map_err(|e| StoreError::from_write(e, "owner membership already exists"))?;

        tx.commit().await?;
        Ok(Some(project))
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, data).await?)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Project::delete(&self.pool, id).await?)
    }

    async fn project_stats(&self, id: Uuid) -> StoreResult<ProjectStats> {
        Ok(Project::stats(&self.pool, id).await?)
    }

    async fn find_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>> {
        Ok(ProjectMember::find(&self.pool, project_id, user_id).await?)
    }

    async fn is_accepted_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::exists_accepted(&self.pool, project_id, user_id).await?)
    }

    async fn list_accepted_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberProfile>> {
        Ok(ProjectMember::list_accepted_profiles(&self.pool, project_id).await?)
    }

    async fn count_tasks_by_assignees(
        &self,
        project_id: Uuid,
        assignee_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, i64>> {
        Ok(Task::count_by_assignees(&self.pool, project_id, assignee_ids).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(
        &self,
        filter: TaskFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Task>, i64)> {
        let (tasks, total) = futures::try_join!(
            Task::list(&self.pool, filter, offset, limit),
            Task::count(&self.pool, filter),
        )?;
        Ok((tasks, total))
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Option<Task>> {
        Ok(Task::create_if_assignable(&self.pool, data).await?)
    }

    async fn update_task(&self, id: Uuid, changes: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, changes).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_id(&self.pool, id).await?)
    }

    async fn exists_pending_invitation(&self, project_id: Uuid, email: &str) -> StoreResult<bool> {
        Ok(Invitation::exists_pending(&self.pool, project_id, email).await?)
    }

    async fn list_pending_invitations(&self, project_id: Uuid) -> StoreResult<Vec<Invitation>> {
        Ok(Invitation::list_pending(&self.pool, project_id).await?)
    }

    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        Invitation::create(&self.pool, data)
            .await
            .map_err(|e| StoreError::from_write(e, "pending invitation already exists"))
    }

    async fn delete_pending_invitation(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Invitation::delete_if_pending(&self.pool, id).await?)
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AcceptOutcome> {
        let mut tx = self.pool.begin().await?;

        if !Invitation::mark_accepted_if_pending(&mut *tx, invitation_id).await? {
            return Ok(AcceptOutcome::NotPending);
        }

        let member = ProjectMember::create(
            &mut *tx,
            CreateProjectMember {
                project_id,
                user_id,
                role: MemberRole::Member,
            },
        )
        .await;

        match member {
            Ok(member) => {
                tx.commit().await?;
                Ok(AcceptOutcome::Accepted(member))
            }
            Err(e) => match StoreError::from_write(e, "membership already exists") {
                StoreError::Conflict(_) => {
                    tx.rollback().await?;
                    Ok(AcceptOutcome::AlreadyMember)
                }
                other => Err(other),
            },
        }
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        // Lock first: a task assigned concurrently commits before the bulk delete
        if !ProjectMember::lock_for_update(&mut *tx, project_id, user_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let deleted_tasks =
            Task::delete_by_project_and_assignee(&mut *tx, project_id, user_id).await?;

        if !ProjectMember::delete(&mut *tx, project_id, user_id).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(deleted_tasks))
    }
}
