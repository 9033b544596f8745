//! Project operations gated by the membership rules.

use tracing::info;
use uuid::Uuid;

use super::{dto::ProjectSummary, MembershipError, MembershipResult, MembershipService};
use crate::auth::authorization::{require_membership, require_ownership};
use crate::models::project::{CreateProject, Project, UpdateProject};

impl MembershipService {
    async fn summarize(&self, project: Project) -> MembershipResult<ProjectSummary> {
        let stats = self.store().project_stats(project.id).await?;
        Ok(ProjectSummary::new(project, stats))
    }

    /// Creates a project owned by the requester
    ///
    /// The cap check, the project row and the owner's member row are one
    /// unit, so concurrent creates cannot push an owner past the cap.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the requester already owns the maximum number of
    /// projects.
    pub async fn create_project(
        &self,
        requester_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> MembershipResult<ProjectSummary> {
        let cap = self.policy().max_owned_projects;

        let project = self
            .store()
            .create_project_with_owner(
                CreateProject {
                    name,
                    description,
                    owner_id: requester_id,
                },
                cap,
            )
            .await?
            .ok_or_else(|| {
                MembershipError::invalid(format!("A user can own at most {cap} projects"))
            })?;

        info!(project_id = %project.id, owner_id = %requester_id, "Project created");
        self.summarize(project).await
    }

    /// Reads a project the requester is a member of
    pub async fn get_project(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
    ) -> MembershipResult<ProjectSummary> {
        require_membership(self.store(), project_id, requester_id).await?;

        let project = self
            .store()
            .find_project(project_id)
            .await?
            .ok_or(MembershipError::NotFound("Project"))?;

        self.summarize(project).await
    }

    /// Renames or re-describes a project (owner only)
    pub async fn update_project(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
        changes: UpdateProject,
    ) -> MembershipResult<ProjectSummary> {
        require_ownership(self.store(), project_id, requester_id).await?;

        let project = self
            .store()
            .update_project(project_id, changes)
            .await?
            .ok_or(MembershipError::NotFound("Project"))?;

        info!(%project_id, "Project updated");
        self.summarize(project).await
    }

    /// Deletes a project with its members, invitations and tasks (owner only)
    pub async fn delete_project(&self, project_id: Uuid, requester_id: Uuid) -> MembershipResult<()> {
        require_ownership(self.store(), project_id, requester_id).await?;

        if !self.store().delete_project(project_id).await? {
            return Err(MembershipError::NotFound("Project"));
        }

        info!(%project_id, "Project deleted");
        Ok(())
    }
}
