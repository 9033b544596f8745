//! Membership lifecycle: listing and removal.

use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{MemberListItem, MemberListPage, PageRequest},
    MembershipError, MembershipResult, MembershipService,
};
use crate::auth::authorization::{require_membership, require_ownership};

impl MembershipService {
    /// Lists accepted members followed by pending invitations
    ///
    /// Accepted members come first in join order, then pending invitations
    /// newest first. The page is cut from the merged list; `total` counts the
    /// whole list. Task counts come from one batched lookup.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: `page` or `limit` below 1
    /// - `NotProjectMember`: requester is not an accepted member
    pub async fn list_members(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
        page: i64,
        limit: i64,
    ) -> MembershipResult<MemberListPage> {
        let window = PageRequest::new(page, limit)?;

        require_membership(self.store(), project_id, requester_id).await?;

        let (accepted, pending) = futures::try_join!(
            self.store().list_accepted_members(project_id),
            self.store().list_pending_invitations(project_id),
        )?;

        let member_ids: Vec<Uuid> = accepted.iter().map(|m| m.user_id).collect();
        let invitee_emails: Vec<String> =
            pending.iter().map(|i| i.invitee_email.clone()).collect();

        let (task_counts, invitees) = futures::try_join!(
            self.store().count_tasks_by_assignees(project_id, &member_ids),
            self.store().find_users_by_emails(&invitee_emails),
        )?;

        let invitees: HashMap<&str, _> = invitees.iter().map(|u| (u.email.as_str(), u)).collect();

        let mut merged: Vec<MemberListItem> = Vec::with_capacity(accepted.len() + pending.len());
        merged.extend(accepted.into_iter().map(|member| {
            let count = task_counts.get(&member.user_id).copied().unwrap_or(0);
            MemberListItem::from_member(member, count)
        }));
        merged.extend(pending.into_iter().map(|invitation| {
            let invitee = invitees.get(invitation.invitee_email.as_str()).copied();
            MemberListItem::from_invitation(invitation, invitee)
        }));

        let total = merged.len();
        let (start, end) = window.bounds(total);
        let data = merged.drain(start..end).collect();

        Ok(MemberListPage { data, total })
    }

    /// Removes an accepted member and deletes their tasks in the project
    ///
    /// Task deletion and the membership delete commit together. The owner
    /// cannot be removed through this path.
    ///
    /// # Errors
    ///
    /// - `NotProjectOwner`: requester does not own the project
    /// - `NotFound`: `user_id` is not an accepted member
    /// - `InvalidRequest`: `user_id` is the owner
    pub async fn remove_member(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
        user_id: Uuid,
    ) -> MembershipResult<()> {
        require_ownership(self.store(), project_id, requester_id).await?;

        let target = self.store().find_member(project_id, user_id).await?;
        if !target.is_some_and(|m| m.is_accepted()) {
            return Err(MembershipError::NotFound("Member"));
        }

        let project = self
            .store()
            .find_project(project_id)
            .await?
            .ok_or(MembershipError::NotFound("Project"))?;

        if project.owner_id == user_id {
            return Err(MembershipError::invalid("The project owner cannot be removed"));
        }

        match self.store().remove_member(project_id, user_id).await? {
            Some(tasks_deleted) => {
                info!(%project_id, %user_id, tasks_deleted, "Member removed");
                Ok(())
            }
            None => {
                warn!(%project_id, %user_id, "Member disappeared before removal");
                Err(MembershipError::NotFound("Member"))
            }
        }
    }
}
