//! Task operations scoped to a project.
//!
//! Members may create, read and edit tasks; deleting one is reserved for the
//! project owner, like every other destructive operation. An assignee must be
//! an accepted member, and the store re-checks that in the same statement
//! that writes the task.

use tracing::info;
use uuid::Uuid;

use super::{
    dto::{PageRequest, TaskPage},
    MembershipError, MembershipResult, MembershipService,
};
use crate::auth::authorization::{require_membership, require_ownership};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};

const ASSIGNEE_NOT_MEMBER: &str = "Assignee must be an accepted member of the project";

impl MembershipService {
    async fn find_task(&self, task_id: Uuid) -> MembershipResult<Task> {
        self.store()
            .find_task(task_id)
            .await?
            .ok_or(MembershipError::NotFound("Task"))
    }

    /// Creates a task in `data.project_id`
    ///
    /// # Errors
    ///
    /// - `NotProjectMember`: requester is not an accepted member
    /// - `InvalidRequest`: the assignee is not an accepted member
    pub async fn create_task(&self, requester_id: Uuid, data: CreateTask) -> MembershipResult<Task> {
        let project_id = data.project_id;
        require_membership(self.store(), project_id, requester_id).await?;

        let task = self
            .store()
            .create_task(data)
            .await?
            .ok_or_else(|| MembershipError::invalid(ASSIGNEE_NOT_MEMBER))?;

        info!(task_id = %task.id, %project_id, creator_id = %requester_id, "Task created");
        Ok(task)
    }

    /// Lists the project's tasks, newest first
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: `page` or `limit` below 1
    /// - `NotProjectMember`: requester is not an accepted member
    pub async fn list_tasks(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
        status: Option<TaskStatus>,
        assignee_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> MembershipResult<TaskPage> {
        let window = PageRequest::new(page, limit)?;

        require_membership(self.store(), project_id, requester_id).await?;

        let filter = TaskFilter {
            project_id,
            status,
            assignee_id,
        };
        let (data, total) = self
            .store()
            .list_tasks(filter, window.offset(), window.limit)
            .await?;

        Ok(TaskPage { data, total })
    }

    pub async fn get_task(&self, task_id: Uuid, requester_id: Uuid) -> MembershipResult<Task> {
        let task = self.find_task(task_id).await?;
        require_membership(self.store(), task.project_id, requester_id).await?;
        Ok(task)
    }

    /// Edits title, status or assignee
    ///
    /// # Errors
    ///
    /// - `NotFound`: unknown task, or deleted while updating
    /// - `NotProjectMember`: requester is not an accepted member
    /// - `InvalidRequest`: the new assignee is not an accepted member
    pub async fn update_task(
        &self,
        task_id: Uuid,
        requester_id: Uuid,
        changes: UpdateTask,
    ) -> MembershipResult<Task> {
        let task = self.find_task(task_id).await?;
        require_membership(self.store(), task.project_id, requester_id).await?;

        match self.store().update_task(task_id, changes).await? {
            Some(task) => {
                info!(%task_id, project_id = %task.project_id, status = %task.status, "Task updated");
                Ok(task)
            }
            // The row survived, so the assignee guard refused the write
            None => match self.store().find_task(task_id).await? {
                Some(_) => Err(MembershipError::invalid(ASSIGNEE_NOT_MEMBER)),
                None => Err(MembershipError::NotFound("Task")),
            },
        }
    }

    /// Deletes a task (owner only)
    pub async fn delete_task(&self, task_id: Uuid, requester_id: Uuid) -> MembershipResult<()> {
        let task = self.find_task(task_id).await?;
        require_ownership(self.store(), task.project_id, requester_id).await?;

        if !self.store().delete_task(task_id).await? {
            return Err(MembershipError::NotFound("Task"));
        }

        info!(%task_id, project_id = %task.project_id, "Task deleted");
        Ok(())
    }
}
