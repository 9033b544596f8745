/// Task endpoints
///
/// - `POST   /v1/projects/:project_id/tasks` - create (members)
/// - `GET    /v1/projects/:project_id/tasks?status&assignee&page&limit` - list (members)
/// - `GET    /v1/tasks/:task_id` - read (members)
/// - `PATCH  /v1/tasks/:task_id` - edit title, status or assignee (members)
/// - `DELETE /v1/tasks/:task_id` - delete (owner only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{members::PageQuery, parse_id},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use teamboard_shared::{
    auth::middleware::AuthContext,
    membership::dto::TaskPage,
    models::task::{deserialize_present, CreateTask, Task, TaskStatus, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 2, max = 10, message = "Title must be 2 to 10 characters"))]
    pub title: String,

    /// Defaults to `todo`
    pub status: Option<String>,

    pub assignee_id: Option<String>,
}

/// Update task request; absent fields are left unchanged, `assigneeId: null` unassigns
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 2, max = 10, message = "Title must be 2 to 10 characters"))]
    pub title: Option<String>,

    pub status: Option<String>,

    #[serde(default, deserialize_with = "deserialize_present")]
    pub assignee_id: Option<Option<String>>,
}

/// Task list filters and pagination
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub assignee: Option<String>,

    #[serde(flatten)]
    pub page: PageQuery,
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<TaskStatus>> {
    raw.map(|s| s.parse::<TaskStatus>())
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_assignee(raw: Option<&str>) -> ApiResult<Option<Uuid>> {
    raw.map(|s| parse_id(s, "assigneeId")).transpose()
}

/// Creates a task in the project
///
/// # Errors
///
/// - `400 Bad Request`: unknown status, malformed or non-member assignee
/// - `403 Forbidden`: caller is not an accepted member
/// - `422 Unprocessable Entity`: title out of bounds
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let project_id = parse_id(&project_id, "projectId")?;
    req.validate()?;

    let data = CreateTask {
        project_id,
        title: req.title,
        status: parse_status(req.status.as_deref())?.unwrap_or(TaskStatus::Todo),
        assignee_id: parse_assignee(req.assignee_id.as_deref())?,
    };

    let task = state.members.create_task(auth.user_id, data).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<TaskPage>> {
    let project_id = parse_id(&project_id, "projectId")?;
    let (page, limit) = query.page.resolve()?;

    let listing = state
        .members
        .list_tasks(
            project_id,
            auth.user_id,
            parse_status(query.status.as_deref())?,
            parse_assignee(query.assignee.as_deref())?,
            page,
            limit,
        )
        .await?;

    Ok(Json(listing))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id, "taskId")?;

    let task = state.members.get_task(task_id, auth.user_id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_id(&task_id, "taskId")?;
    req.validate()?;

    let changes = UpdateTask {
        title: req.title,
        status: parse_status(req.status.as_deref())?,
        assignee_id: req
            .assignee_id
            .map(|assignee| parse_assignee(assignee.as_deref()))
            .transpose()?,
    };

    let task = state
        .members
        .update_task(task_id, auth.user_id, changes)
        .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<String>,
) -> ApiResult<StatusCode> {
    let task_id = parse_id(&task_id, "taskId")?;

    state.members.delete_task(task_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
