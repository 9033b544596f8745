/// Membership and invitation endpoints
///
/// - `GET    /v1/projects/:project_id/members?page&limit` - members and pending invitations
/// - `POST   /v1/projects/:project_id/invitations` - invite by email (owner only)
/// - `DELETE /v1/projects/:project_id/users/:user_id` - remove a member (owner only)
/// - `DELETE /v1/invitations/:invitation_id` - cancel a pending invitation (owner only)
/// - `POST   /v1/invitations/:invitation_id/accept` - accept as the invited user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::parse_id,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::middleware::AuthContext,
    membership::dto::{MemberListPage, PageRequest},
};

/// Raw pagination parameters
///
/// Kept as strings so non-numeric values surface as a 400 with a JSON body.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub(crate) fn resolve(&self) -> ApiResult<(i64, i64)> {
        let defaults = PageRequest::default();
        Ok((
            parse_number(self.page.as_deref(), "page", defaults.page)?,
            parse_number(self.limit.as_deref(), "limit", defaults.limit)?,
        ))
    }
}

fn parse_number(raw: Option<&str>, name: &str, default: i64) -> ApiResult<i64> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{name} must be an integer"))),
    }
}

/// Invite request
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

/// Invite response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub invitation_id: String,
}

/// Lists accepted members, then pending invitations
///
/// # Errors
///
/// - `400 Bad Request`: malformed project id, or `page`/`limit` not a positive integer
/// - `403 Forbidden`: caller is not an accepted member
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<MemberListPage>> {
    let project_id = parse_id(&project_id, "projectId")?;
    let (page, limit) = query.resolve()?;

    let listing = state
        .members
        .list_members(project_id, auth.user_id, page, limit)
        .await?;

    Ok(Json(listing))
}

/// Invites a registered user by email
///
/// # Errors
///
/// - `400 Bad Request`: invalid email, self-invite, already a member, already invited
/// - `403 Forbidden`: caller does not own the project
/// - `404 Not Found`: no account with that email
pub async fn invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<(StatusCode, Json<InviteResponse>)> {
    let project_id = parse_id(&project_id, "projectId")?;

    let invitation_id = state
        .members
        .invite(project_id, auth.user_id, &req.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse {
            invitation_id: invitation_id.to_string(),
        }),
    ))
}

pub async fn cancel_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let invitation_id = parse_id(&invitation_id, "invitationId")?;

    state
        .members
        .cancel_invitation(invitation_id, auth.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Accepts an invitation addressed to the caller's email; empty 200 body
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(invitation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let invitation_id = parse_id(&invitation_id, "invitationId")?;

    state
        .members
        .accept_invitation(invitation_id, auth.user_id)
        .await?;

    Ok(StatusCode::OK)
}

/// Removes an accepted member and deletes their tasks in the project
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let project_id = parse_id(&project_id, "projectId")?;
    let user_id = parse_id(&user_id, "userId")?;

    state
        .members
        .remove_member(project_id, auth.user_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
