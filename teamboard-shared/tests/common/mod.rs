/// Test store that interleaves concurrent service calls
///
/// Wraps [`InMemoryMembershipStore`] and hands control back to the scheduler
/// at one chosen method, so two operations driven by `tokio::join!` on the
/// same task run their steps interleaved instead of back to back. Every
/// delegated call is recorded in order.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use teamboard_shared::models::{
    invitation::{CreateInvitation, Invitation},
    membership::{MemberProfile, ProjectMember},
    project::{CreateProject, Project, ProjectStats, UpdateProject},
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, User},
};
use teamboard_shared::store::{AcceptOutcome, InMemoryMembershipStore, MembershipStore, StoreResult};
use uuid::Uuid;

/// Where the store hands control back to the scheduler
#[derive(Debug, Clone, Copy)]
pub enum Pause {
    /// Before the named method touches the store
    Before(&'static str),

    /// After the named method has returned its result
    After(&'static str),
}

#[derive(Clone)]
pub struct InterleavingStore {
    inner: InMemoryMembershipStore,
    pause: Pause,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl InterleavingStore {
    pub fn new(inner: InMemoryMembershipStore, pause: Pause) -> Self {
        Self {
            inner,
            pause,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Method names in the order they ran
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    async fn step<T>(&self, name: &'static str, call: impl Future<Output = T> + Send) -> T {
        if matches!(self.pause, Pause::Before(at) if at == name) {
            tokio::task::yield_now().await;
        }

        let out = call.await;
        self.calls.lock().unwrap().push(name);

        if matches!(self.pause, Pause::After(at) if at == name) {
            tokio::task::yield_now().await;
        }
        out
    }
}

#[async_trait]
impl MembershipStore for InterleavingStore {
    async fn ping(&self) -> StoreResult<()> {
        self.step("ping", self.inner.ping()).await
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.step("create_user", self.inner.create_user(data)).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.step("find_user_by_id", self.inner.find_user_by_id(id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.step("find_user_by_email", self.inner.find_user_by_email(email))
            .await
    }

    async fn find_users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>> {
        self.step("find_users_by_emails", self.inner.find_users_by_emails(emails))
            .await
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.step("find_project", self.inner.find_project(id)).await
    }

    async fn is_project_owner(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        self.step(
            "is_project_owner",
            self.inner.is_project_owner(project_id, user_id),
        )
        .await
    }

    async fn create_project_with_owner(
        &self,
        data: CreateProject,
        max_owned: i64,
    ) -> StoreResult<Option<Project>> {
        self.step(
            "create_project_with_owner",
            self.inner.create_project_with_owner(data, max_owned),
        )
        .await
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        self.step("update_project", self.inner.update_project(id, data))
            .await
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.step("delete_project", self.inner.delete_project(id)).await
    }

    async fn project_stats(&self, id: Uuid) -> StoreResult<ProjectStats> {
        self.step("project_stats", self.inner.project_stats(id)).await
    }

    async fn find_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>> {
        self.step("find_member", self.inner.find_member(project_id, user_id))
            .await
    }

    async fn is_accepted_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        self.step(
            "is_accepted_member",
            self.inner.is_accepted_member(project_id, user_id),
        )
        .await
    }

    async fn list_accepted_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberProfile>> {
        self.step(
            "list_accepted_members",
            self.inner.list_accepted_members(project_id),
        )
        .await
    }

    async fn count_tasks_by_assignees(
        &self,
        project_id: Uuid,
        assignee_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, i64>> {
        self.step(
            "count_tasks_by_assignees",
            self.inner.count_tasks_by_assignees(project_id, assignee_ids),
        )
        .await
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.step("find_task", self.inner.find_task(id)).await
    }

    async fn list_tasks(
        &self,
        filter: TaskFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Task>, i64)> {
        self.step("list_tasks", self.inner.list_tasks(filter, offset, limit))
            .await
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Option<Task>> {
        self.step("create_task", self.inner.create_task(data)).await
    }

    async fn update_task(&self, id: Uuid, changes: UpdateTask) -> StoreResult<Option<Task>> {
        self.step("update_task", self.inner.update_task(id, changes))
            .await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.step("delete_task", self.inner.delete_task(id)).await
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        self.step("find_invitation", self.inner.find_invitation(id)).await
    }

    async fn exists_pending_invitation(&self, project_id: Uuid, email: &str) -> StoreResult<bool> {
        self.step(
            "exists_pending_invitation",
            self.inner.exists_pending_invitation(project_id, email),
        )
        .await
    }

    async fn list_pending_invitations(&self, project_id: Uuid) -> StoreResult<Vec<Invitation>> {
        self.step(
            "list_pending_invitations",
            self.inner.list_pending_invitations(project_id),
        )
        .await
    }

    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        self.step("create_invitation", self.inner.create_invitation(data))
            .await
    }

    async fn delete_pending_invitation(&self, id: Uuid) -> StoreResult<bool> {
        self.step(
            "delete_pending_invitation",
            self.inner.delete_pending_invitation(id),
        )
        .await
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AcceptOutcome> {
        self.step(
            "accept_invitation",
            self.inner.accept_invitation(invitation_id, project_id, user_id),
        )
        .await
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<u64>> {
        self.step("remove_member", self.inner.remove_member(project_id, user_id))
            .await
    }
}
