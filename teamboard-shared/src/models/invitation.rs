/// Invitation model and database operations
///
/// An invitation is an offer, scoped to an email address, to join a project.
///
/// # Lifecycle
///
/// ```text
///            accept (conditional flip)
/// PENDING ─────────────────────────────▶ ACCEPTED
///    │
///    └── cancel by owner ──▶ row deleted
/// ```
///
/// `DECLINED` exists in the schema but nothing writes it. Once an invitation
/// leaves `PENDING` it is never modified again.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'declined');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     inviter_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invitee_email VARCHAR(255) NOT NULL,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX idx_invitations_pending_unique
///     ON invitations(project_id, invitee_email)
///     WHERE status = 'pending';
/// ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Invitation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum InvitationStatus {
    /// Waiting for the invitee
    Pending,

    /// Invitee joined the project (terminal)
    Accepted,

    /// Reserved, no write path
    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        }
    }
}

/// Invitation record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,

    pub project_id: Uuid,

    /// Owner who sent the invitation
    pub inviter_id: Uuid,

    /// Normalized email of the invitee; soft link to `users.email`
    pub invitee_email: String,

    pub status: InvitationStatus,

    /// Acceptance deadline; [`never_expires`] when no TTL is configured
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating an invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub project_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub expires_at: DateTime<Utc>,
}

/// Far-future deadline used when invitations are not meant to expire
pub fn never_expires() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

const INVITATION_COLUMNS: &str =
    "id, project_id, inviter_id, invitee_email, status, expires_at, created_at";

impl Invitation {
    /// Builds a pending in-memory invitation
    pub fn from_create(data: CreateInvitation) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            inviter_id: data.inviter_id,
            invitee_email: data.invitee_email,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// True once `now` has passed the deadline
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Creates a pending invitation
    ///
    /// # Errors
    ///
    /// Fails with a unique violation when a pending invitation already exists
    /// for the same project and email.
    pub async fn create<'e, E>(executor: E, data: CreateInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO invitations (project_id, inviter_id, invitee_email, status, expires_at) \
             VALUES ($1, $2, $3, 'pending', $4) RETURNING {INVITATION_COLUMNS}"
        );

        sqlx::query_as::<_, Invitation>(&query)
            .bind(data.project_id)
            .bind(data.inviter_id)
            .bind(data.invitee_email)
            .bind(data.expires_at)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1");

        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Checks for a pending invitation to `email` in the project
    pub async fn exists_pending<'e, E>(
        executor: E,
        project_id: Uuid,
        email: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM invitations
                WHERE project_id = $1 AND invitee_email = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(project_id)
        .bind(email)
        .fetch_one(executor)
        .await
    }

    /// Lists pending invitations, newest first
    pub async fn list_pending<'e, E>(
        executor: E,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations \
             WHERE project_id = $1 AND status = 'pending' \
             ORDER BY created_at DESC"
        );

        sqlx::query_as::<_, Invitation>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    /// Flips the invitation to accepted only if it is still pending
    ///
    /// Returns true when exactly this call performed the transition. A false
    /// result means another caller resolved it first (or it never existed).
    pub async fn mark_accepted_if_pending<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'accepted'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Hard-deletes an invitation only if it is still pending
    ///
    /// Same guard as [`Invitation::mark_accepted_if_pending`]: whichever of
    /// cancel and accept reaches the row first wins, the other matches nothing.
    pub async fn delete_if_pending<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM invitations WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
