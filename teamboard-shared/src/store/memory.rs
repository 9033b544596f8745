//! In-memory membership store for tests and local runs.
//!
//! All tables sit behind one `RwLock`. Every trait method takes the lock once
//! and releases it before returning, so each atomic unit is trivially
//! all-or-nothing and two concurrent accepts of the same invitation serialize
//! on the lock.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{AcceptOutcome, MembershipStore, StoreError, StoreResult};
use crate::models::{
    invitation::{CreateInvitation, Invitation, InvitationStatus},
    membership::{CreateProjectMember, MemberProfile, MemberRole, ProjectMember},
    project::{CreateProject, Project, ProjectStats, UpdateProject},
    task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask},
    user::{CreateUser, User},
};

/// Thread-safe in-memory membership store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembershipStore {
    state: Arc<RwLock<State>>,
}

// Vecs keep insertion order, which breaks timestamp ties deterministically.
#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    invitations: Vec<Invitation>,
    tasks: Vec<Task>,
}

impl State {
    fn find_member(&self, project_id: Uuid, user_id: Uuid) -> Option<&ProjectMember> {
        self.members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
    }

    fn owned_count(&self, owner_id: Uuid) -> i64 {
        self.projects.iter().filter(|p| p.owner_id == owner_id).count() as i64
    }

    fn is_assignable(&self, project_id: Uuid, assignee_id: Option<Uuid>) -> bool {
        assignee_id.map_or(true, |user_id| {
            self.find_member(project_id, user_id)
                .is_some_and(ProjectMember::is_accepted)
        })
    }

    fn has_pending(&self, project_id: Uuid, email: &str) -> bool {
        self.invitations.iter().any(|i| {
            i.project_id == project_id && i.invitee_email == email && i.is_pending()
        })
    }
}

impl InMemoryMembershipStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    /// Seeds a user directly, without going through registration
    pub fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let user = User::from_create(data);
        let mut state = self.write()?;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} taken", user.email)));
        }
        state.users.push(user.clone());
        Ok(user)
    }

    /// Seeds a task, skipping the assignee membership check
    pub fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::from_create(data);
        self.write()?.tasks.push(task.clone());
        Ok(task)
    }

    /// Stores a prepared invitation as-is, e.g. one with a past deadline
    pub fn insert_invitation(&self, invitation: Invitation) -> StoreResult<()> {
        self.write()?.invitations.push(invitation);
        Ok(())
    }

    /// Tasks in the project assigned to `assignee_id`
    pub fn tasks_assigned_to(&self, project_id: Uuid, assignee_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id && t.assignee_id == Some(assignee_id))
            .cloned()
            .collect())
    }

    /// Number of projects owned by `owner_id`
    pub fn owned_project_count(&self, owner_id: Uuid) -> StoreResult<i64> {
        Ok(self.read()?.owned_count(owner_id))
    }

    /// Every member row of the project, any role or status
    pub fn members_of(&self, project_id: Uuid) -> StoreResult<Vec<ProjectMember>> {
        Ok(self
            .read()?
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.insert_user(data)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_emails(&self, emails: &[String]) -> StoreResult<Vec<User>> {
        Ok(self
            .read()?
            .users
            .iter()
            .filter(|u| emails.contains(&u.email))
            .cloned()
            .collect())
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn is_project_owner(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .read()?
            .projects
            .iter()
            .any(|p| p.id == project_id && p.owner_id == user_id))
    }

    async fn create_project_with_owner(
        &self,
        data: CreateProject,
        max_owned: i64,
    ) -> StoreResult<Option<Project>> {
        let mut state = self.write()?;
        if state.owned_count(data.owner_id) >= max_owned {
            return Ok(None);
        }

        let project = Project::from_create(data);
        let owner = ProjectMember::from_create(CreateProjectMember {
            project_id: project.id,
            user_id: project.owner_id,
            role: MemberRole::Owner,
        });

        state.projects.push(project.clone());
        state.members.push(owner);
        Ok(Some(project))
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        let mut state = self.write()?;
        let Some(project) = state.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = Some(description);
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Ok(false);
        }

        state.members.retain(|m| m.project_id != id);
        state.invitations.retain(|i| i.project_id != id);
        state.tasks.retain(|t| t.project_id != id);
        Ok(true)
    }

    async fn project_stats(&self, id: Uuid) -> StoreResult<ProjectStats> {
        let state = self.read()?;
        let mut stats = ProjectStats {
            member_count: state.members.iter().filter(|m| m.project_id == id).count() as i64,
            ..Default::default()
        };

        for task in state.tasks.iter().filter(|t| t.project_id == id) {
            match task.status {
                TaskStatus::Todo => stats.todo_count += 1,
                TaskStatus::InProgress => stats.in_progress_count += 1,
                TaskStatus::Done => stats.done_count += 1,
            }
        }

        Ok(stats)
    }

    async fn find_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ProjectMember>> {
        Ok(self.read()?.find_member(project_id, user_id).cloned())
    }

    async fn is_accepted_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .read()?
            .find_member(project_id, user_id)
            .is_some_and(ProjectMember::is_accepted))
    }

    async fn list_accepted_members(&self, project_id: Uuid) -> StoreResult<Vec<MemberProfile>> {
        let state = self.read()?;
        let mut profiles: Vec<MemberProfile> = state
            .members
            .iter()
            .filter(|m| m.project_id == project_id && m.is_accepted())
            .filter_map(|m| {
                let user = state.users.iter().find(|u| u.id == m.user_id)?;
                Some(MemberProfile {
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    profile_image: user.profile_image.clone(),
                    role: m.role,
                    status: m.status,
                    joined_at: m.joined_at,
                })
            })
            .collect();

        profiles.sort_by_key(|p| p.joined_at);
        Ok(profiles)
    }

    async fn count_tasks_by_assignees(
        &self,
        project_id: Uuid,
        assignee_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, i64>> {
        let state = self.read()?;
        let mut counts = HashMap::new();

        for task in state.tasks.iter().filter(|t| t.project_id == project_id) {
            if let Some(assignee) = task.assignee_id.filter(|a| assignee_ids.contains(a)) {
                *counts.entry(assignee).or_insert(0) += 1;
            }
        }

        Ok(counts)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(
        &self,
        filter: TaskFilter,
        offset: i64,
        limit: i64,
    ) -> StoreResult<(Vec<Task>, i64)> {
        let state = self.read()?;
        let mut matching: Vec<&Task> = state.tasks.iter().filter(|t| filter.matches(t)).collect();
        // Newest first; later inserts win timestamp ties
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        if !state.is_assignable(data.project_id, data.assignee_id) {
            return Ok(None);
        }

        let task = Task::from_create(data);
        state.tasks.push(task.clone());
        Ok(Some(task))
    }

    async fn update_task(&self, id: Uuid, changes: UpdateTask) -> StoreResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(project_id) = state.tasks.iter().find(|t| t.id == id).map(|t| t.project_id) else {
            return Ok(None);
        };

        if let Some(assignee_id) = changes.assignee_id {
            if !state.is_assignable(project_id, assignee_id) {
                return Ok(None);
            }
        }

        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.apply(changes);
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        Ok(state.tasks.len() < before)
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(self.read()?.invitations.iter().find(|i| i.id == id).cloned())
    }

    async fn exists_pending_invitation(&self, project_id: Uuid, email: &str) -> StoreResult<bool> {
        Ok(self.read()?.has_pending(project_id, email))
    }

    async fn list_pending_invitations(&self, project_id: Uuid) -> StoreResult<Vec<Invitation>> {
        let state = self.read()?;
        let mut pending: Vec<Invitation> = state
            .invitations
            .iter()
            .rev()
            .filter(|i| i.project_id == project_id && i.is_pending())
            .cloned()
            .collect();

        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn create_invitation(&self, data: CreateInvitation) -> StoreResult<Invitation> {
        let mut state = self.write()?;
        if state.has_pending(data.project_id, &data.invitee_email) {
            return Err(StoreError::Conflict(
                "pending invitation already exists".to_string(),
            ));
        }

        let invitation = Invitation::from_create(data);
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn delete_pending_invitation(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        let before = state.invitations.len();
        state.invitations.retain(|i| !(i.id == id && i.is_pending()));
        Ok(state.invitations.len() < before)
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<AcceptOutcome> {
        let mut state = self.write()?;

        let still_pending = state
            .invitations
            .iter()
            .any(|i| i.id == invitation_id && i.is_pending());
        if !still_pending {
            return Ok(AcceptOutcome::NotPending);
        }
        if state.find_member(project_id, user_id).is_some() {
            return Ok(AcceptOutcome::AlreadyMember);
        }

        if let Some(invitation) = state.invitations.iter_mut().find(|i| i.id == invitation_id) {
            invitation.status = InvitationStatus::Accepted;
        }

        let member = ProjectMember::from_create(CreateProjectMember {
            project_id,
            user_id,
            role: MemberRole::Member,
        });
        state.members.push(member.clone());

        Ok(AcceptOutcome::Accepted(member))
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<u64>> {
        let mut state = self.write()?;
        if state.find_member(project_id, user_id).is_none() {
            return Ok(None);
        }

        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.project_id == project_id && t.assignee_id == Some(user_id)));
        let deleted = (before - state.tasks.len()) as u64;

        state
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));

        Ok(Some(deleted))
    }
}
