/// Persistence contract for the membership subsystem
///
/// Services talk to storage only through [`MembershipStore`]. Plain reads are
/// single, non-locking lookups. The three operations that touch more than one
/// row are unit-of-work methods that the implementation must apply all or
/// nothing:
///
/// - [`MembershipStore::create_project_with_owner`]: owned-project cap + project row + owner membership
/// - [`MembershipStore::accept_invitation`]: conditional PENDING→ACCEPTED flip + membership
/// - [`MembershipStore::remove_member`]: bulk task delete + membership delete
///
/// Task writes that set an assignee are single statements guarded on the
/// assignee still being an accepted member, so they cannot interleave with
/// `remove_member` and leave a task assigned to a removed user.
///
/// # Implementations
///
/// - [`postgres::PgMembershipStore`]: sqlx transactions on PostgreSQL
/// - [`memory::InMemoryMembershipStore`]: one lock over all tables, for tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    invitation::{CreateInvitation, Invitation},
    membership::{MemberProfile, ProjectMember},
    project::{CreateProject, Project, ProjectStats, UpdateProject},
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, User},
};

pub use memory::InMemoryMembershipStore;
pub use postgres::PgMembershipStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store cannot serve requests (e.g. poisoned lock)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Maps unique violations to [`StoreError::Conflict`], passes everything else through
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(what.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Outcome of the atomic accept unit
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    /// Invitation flipped and membership created
    Accepted(ProjectMember),

    /// The conditional flip matched no row: someone else resolved it first
    NotPending,

    /// The flip succeeded but the membership already existed; rolled back
    AlreadyMember,
}

/// Narrow repository contract used by the membership services
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Cheap connectivity check
    async fn ping(&self) -> StoreResult<()>;

    // Users (identity store)

    /// Inserts an account
    ///
    /// Returns [`StoreError::Conflict`] if the email is already registered.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Batched lookup used to resolve invitees in the member list
    async fn find_users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>>;

    // Projects

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn is_project_owner(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Creates the project and the owner's accepted `owner` membership atomically
    ///
    /// The owner's project count is taken inside the same unit, serialized per
    /// owner. Returns None (and writes nothing) if the owner already owns
    /// `max_owned` projects.
    async fn create_project_with_owner(
        &self,
        data: CreateProject,
        max_owned: i64,
    ) -> StoreResult<Option<Project>>;

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Deletes the project with its members, invitations and tasks
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    async fn project_stats(&self, id: Uuid) -> StoreResult<ProjectStats>;

    // Memberships

    async fn find_member(&self, project_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<ProjectMember>>;

    async fn is_accepted_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Accepted members with profiles, ordered by join time
    async fn list_accepted_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberProfile>>;

    /// Task count per assignee within the project, one lookup for all ids
    async fn count_tasks_by_assignees(
        &self,
        project_id: Uuid,
        assignee_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, i64>>;

    // Tasks

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// One page of matching tasks, newest first, plus the unpaged total
    async fn list_tasks(
        &self,
        filter: TaskFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Task>, i64)>;

    /// Inserts a task
    ///
    /// Returns None (and writes nothing) if `assignee_id` is set but is not an
    /// accepted member of the project.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Option<Task>>;

    /// Applies `changes` to the task
    ///
    /// Returns None (and writes nothing) if the task is missing or a new
    /// assignee is not an accepted member of its project.
    async fn update_task(&self, id: Uuid, changes: UpdateTask) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    // Invitations

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;

    async fn exists_pending_invitation(&self, project_id: Uuid, email: &str) -> StoreResult<bool>;

    /// Pending invitations, newest first
    async fn list_pending_invitations(&self, project_id: Uuid) -> StoreResult<Vec<Invitation>>;

    /// Inserts a pending invitation
    ///
    /// Returns [`StoreError::Conflict`] if a pending one already exists for the
    /// same project and email.
    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation>;

    /// Deletes the invitation if it is still pending
    ///
    /// Returns false when no pending row matched: the invitation is gone or
    /// was accepted in the meantime.
    async fn delete_pending_invitation(&self, id: Uuid) -> StoreResult<bool>;

    // Atomic units

    /// Conditionally flips the invitation to accepted and creates the membership
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AcceptOutcome>;

    /// Deletes the user's tasks in the project, then the membership
    ///
    /// Returns the number of deleted tasks, or None (and changes nothing) if
    /// the membership row no longer exists.
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<u64>>;
}
