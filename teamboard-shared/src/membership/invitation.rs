//! Invitation state machine.
//!
//! ```text
//!             accept (conditional flip + member row, one transaction)
//!   PENDING ───────────────────────────────────────────────▶ ACCEPTED
//!      │
//!      └──── cancel by owner ────▶ (row deleted)
//! ```
//!
//! Checks run in a fixed order and each failing predicate returns before any
//! write is attempted.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::ValidateEmail;

use super::{normalize_email, MembershipError, MembershipResult, MembershipService};
use crate::auth::authorization::require_ownership;
use crate::models::{invitation::CreateInvitation, membership::ProjectMember};
use crate::store::{AcceptOutcome, StoreError};

/// Loose address check: RFC-ish local part and a dotted domain
pub fn looks_like_email(email: &str) -> bool {
    email.to_string().validate_email()
        && email
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.') && !domain.ends_with('.'))
}

impl MembershipService {
    /// Invites `email` to the project
    ///
    /// The invitee must already have an account. Returns the new invitation id.
    ///
    /// # Errors
    ///
    /// - `NotProjectOwner`: requester does not own the project
    /// - `InvalidRequest`: malformed email, or the requester invites themself
    /// - `UserNotFound`: no account is registered under `email`
    /// - `AlreadyMember`: the invitee is an accepted member
    /// - `AlreadyInvited`: a pending invitation exists for this email
    pub async fn invite(
        &self,
        project_id: Uuid,
        requester_id: Uuid,
        email: &str,
    ) -> MembershipResult<Uuid> {
        require_ownership(self.store(), project_id, requester_id).await?;

        let email = normalize_email(email);
        if !looks_like_email(&email) {
            return Err(MembershipError::invalid("Invalid email address"));
        }

        let invitee = self
            .store()
            .find_user_by_email(&email)
            .await?
            .ok_or(MembershipError::UserNotFound)?;

        if invitee.id == requester_id {
            return Err(MembershipError::invalid("Cannot invite yourself"));
        }

        if self.store().is_accepted_member(project_id, invitee.id).await? {
            return Err(MembershipError::AlreadyMember);
        }

        if self.store().exists_pending_invitation(project_id, &email).await? {
            return Err(MembershipError::AlreadyInvited);
        }

        let invitation = self
            .store()
            .create_invitation(CreateInvitation {
                project_id,
                inviter_id: requester_id,
                invitee_email: email,
                expires_at: self.policy().invitation_expiry(Utc::now()),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => MembershipError::AlreadyInvited,
                other => MembershipError::Store(other),
            })?;

        info!(
            invitation_id = %invitation.id,
            %project_id,
            inviter_id = %requester_id,
            "Invitation created"
        );

        Ok(invitation.id)
    }

    /// Deletes a still-pending invitation
    ///
    /// # Errors
    ///
    /// - `NotFound`: unknown invitation
    /// - `NotProjectOwner`: requester does not own the invitation's project
    /// - `InvalidRequest`: the invitation was already resolved
    pub async fn cancel_invitation(
        &self,
        invitation_id: Uuid,
        requester_id: Uuid,
    ) -> MembershipResult<()> {
        let invitation = self
            .store()
            .find_invitation(invitation_id)
            .await?
            .ok_or(MembershipError::NotFound("Invitation"))?;

        require_ownership(self.store(), invitation.project_id, requester_id).await?;

        if !invitation.is_pending() {
            return Err(MembershipError::invalid(
                "Only pending invitations can be cancelled",
            ));
        }

        if !self.store().delete_pending_invitation(invitation_id).await? {
            // Accepted between the read above and the delete, or deleted outright
            return match self.store().find_invitation(invitation_id).await? {
                Some(_) => Err(MembershipError::invalid(
                    "Only pending invitations can be cancelled",
                )),
                None => Err(MembershipError::NotFound("Invitation")),
            };
        }

        info!(%invitation_id, project_id = %invitation.project_id, "Invitation cancelled");
        Ok(())
    }

    /// Accepts an invitation on behalf of the invited account
    ///
    /// The status flip and the member row are written as one unit. If another
    /// accept won the race, the flip matches nothing and this call fails
    /// without creating a member.
    ///
    /// # Errors
    ///
    /// - `UserNotFound`: requester account is gone
    /// - `NotFound`: unknown invitation
    /// - `InvalidRequest`: not pending, expired, or addressed to another email
    /// - `AlreadyProcessed`: requester already has a member row in the project
    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        requester_id: Uuid,
    ) -> MembershipResult<ProjectMember> {
        let requester = self
            .store()
            .find_user_by_id(requester_id)
            .await?
            .ok_or(MembershipError::UserNotFound)?;

        let invitation = self
            .store()
            .find_invitation(invitation_id)
            .await?
            .ok_or(MembershipError::NotFound("Invitation"))?;

        if !invitation.is_pending() {
            return Err(MembershipError::invalid("Invitation is no longer pending"));
        }

        if invitation.is_expired_at(Utc::now()) {
            return Err(MembershipError::invalid("Invitation has expired"));
        }

        if invitation.invitee_email != requester.email {
            return Err(MembershipError::invalid(
                "Invitation was sent to a different email",
            ));
        }

        if self
            .store()
            .find_member(invitation.project_id, requester_id)
            .await?
            .is_some()
        {
            return Err(MembershipError::AlreadyProcessed);
        }

        let outcome = self
            .store()
            .accept_invitation(invitation_id, invitation.project_id, requester_id)
            .await?;

        match outcome {
            AcceptOutcome::Accepted(member) => {
                info!(
                    %invitation_id,
                    project_id = %member.project_id,
                    user_id = %member.user_id,
                    "Invitation accepted"
                );
                Ok(member)
            }
            AcceptOutcome::NotPending => {
                debug!(%invitation_id, "Lost accept race");
                Err(MembershipError::invalid("Invitation is no longer pending"))
            }
            AcceptOutcome::AlreadyMember => Err(MembershipError::AlreadyProcessed),
        }
    }
}
