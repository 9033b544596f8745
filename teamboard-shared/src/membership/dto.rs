/// Response shapes for membership operations
///
/// Field names are camelCase on the wire. Status values cross the edge only
/// through [`MemberListStatus`], which is derived from the storage enums by
/// one total mapping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MembershipError, MembershipResult};
use crate::models::{
    invitation::{Invitation, InvitationStatus},
    membership::{MemberProfile, MemberStatus},
    project::{Project, ProjectStats},
    task::Task,
    user::User,
};

/// Status shown for an entry of the member list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberListStatus {
    Pending,
    Accepted,
    Rejected,
}

impl From<InvitationStatus> for MemberListStatus {
    fn from(status: InvitationStatus) -> Self {
        match status {
            InvitationStatus::Pending => MemberListStatus::Pending,
            InvitationStatus::Accepted => MemberListStatus::Accepted,
            InvitationStatus::Declined => MemberListStatus::Rejected,
        }
    }
}

impl From<MemberStatus> for MemberListStatus {
    fn from(status: MemberStatus) -> Self {
        match status {
            MemberStatus::Pending => MemberListStatus::Pending,
            MemberStatus::Accepted => MemberListStatus::Accepted,
            MemberStatus::Declined => MemberListStatus::Rejected,
        }
    }
}

/// One row of the member list: an accepted member or a pending invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListItem {
    /// User id; None for an invitee without an account
    pub id: Option<Uuid>,

    /// Display name, or the invited email when the invitee is unknown
    pub name: String,

    pub email: String,

    pub profile_image: Option<String>,

    /// Tasks assigned within the project; always 0 for invitations
    pub task_count: i64,

    pub status: MemberListStatus,

    /// Set only for pending invitations
    pub invitation_id: Option<Uuid>,
}

impl MemberListItem {
    pub fn from_member(member: MemberProfile, task_count: i64) -> Self {
        Self {
            id: Some(member.user_id),
            name: member.name,
            email: member.email,
            profile_image: member.profile_image,
            task_count,
            status: member.status.into(),
            invitation_id: None,
        }
    }

    /// `invitee` is the account registered under the invited email, if any
    pub fn from_invitation(invitation: Invitation, invitee: Option<&User>) -> Self {
        Self {
            id: invitee.map(|u| u.id),
            name: invitee
                .map(|u| u.name.clone())
                .unwrap_or_else(|| invitation.invitee_email.clone()),
            email: invitation.invitee_email,
            profile_image: invitee.and_then(|u| u.profile_image.clone()),
            task_count: 0,
            status: invitation.status.into(),
            invitation_id: Some(invitation.id),
        }
    }
}

/// One page of the member list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberListPage {
    pub data: Vec<MemberListItem>,

    /// Size of the full merged list, not of this page
    pub total: usize,
}

/// 1-indexed pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    /// Rejects `page` or `limit` below 1
    pub fn new(page: i64, limit: i64) -> MembershipResult<Self> {
        if page < 1 || limit < 1 {
            return Err(MembershipError::invalid("page and limit must be at least 1"));
        }
        Ok(Self { page, limit })
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Returns the `[start, end)` bounds of this page within `len` items
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(len);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        (start, start.saturating_add(limit).min(len))
    }
}

/// One page of a project's tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub data: Vec<Task>,

    /// Matching tasks across all pages
    pub total: i64,
}

/// Project with its counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub member_count: i64,
    pub todo_count: i64,
    pub in_progress_count: i64,
    pub done_count: i64,
}

impl ProjectSummary {
    pub fn new(project: Project, stats: ProjectStats) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            member_count: stats.member_count,
            todo_count: stats.todo_count,
            in_progress_count: stats.in_progress_count,
            done_count: stats.done_count,
        }
    }
}
