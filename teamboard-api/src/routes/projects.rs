/// Project endpoints
///
/// - `POST   /v1/projects` - create a project owned by the caller
/// - `GET    /v1/projects/:project_id` - read (members only)
/// - `PATCH  /v1/projects/:project_id` - rename or re-describe (owner only)
/// - `DELETE /v1/projects/:project_id` - delete with everything in it (owner only)

use crate::{
    app::AppState,
    error::ApiResult,
    routes::parse_id,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use teamboard_shared::{
    auth::middleware::AuthContext, membership::dto::ProjectSummary, models::project::UpdateProject,
};
use validator::Validate;

/// Create project request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 2, max = 10, message = "Name must be 2 to 10 characters"))]
    pub name: String,

    #[validate(length(min = 5, max = 40, message = "Description must be 5 to 40 characters"))]
    pub description: Option<String>,
}

/// Update project request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 2, max = 10, message = "Name must be 2 to 10 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 5, max = 40, message = "Description must be 5 to 40 characters"))]
    pub description: Option<String>,
}

/// Creates a project; the caller becomes its owner
///
/// # Errors
///
/// - `400 Bad Request`: caller already owns the maximum number of projects
/// - `422 Unprocessable Entity`: name or description out of bounds
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectSummary>)> {
    req.validate()?;

    let summary = state
        .members
        .create_project(auth.user_id, req.name, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectSummary>> {
    let project_id = parse_id(&project_id, "projectId")?;

    let summary = state.members.get_project(project_id, auth.user_id).await?;
    Ok(Json(summary))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectSummary>> {
    let project_id = parse_id(&project_id, "projectId")?;
    req.validate()?;

    let summary = state
        .members
        .update_project(
            project_id,
            auth.user_id,
            UpdateProject {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(summary))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
) -> ApiResult<StatusCode> {
    let project_id = parse_id(&project_id, "projectId")?;

    state.members.delete_project(project_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
