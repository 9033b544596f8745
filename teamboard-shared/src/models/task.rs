/// Task model and database operations
///
/// Tasks live inside a project. Besides plain CRUD this module holds the
/// queries the membership subsystem leans on: per-assignee counts for the
/// member list, per-status counts for the project summary, and the bulk
/// delete that runs when a member is removed.
///
/// Writes that set an assignee are guarded in SQL: the row is only written if
/// the assignee is an accepted member at that moment, and the member row is
/// share-locked so a concurrent removal cannot slip in between.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     status task_status NOT NULL DEFAULT 'todo',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgExecutor;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Task progress
///
/// The only place status strings are parsed or produced is `as_str` /
/// `FromStr`; everything else works with the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    /// Accepts any casing (`todo`, `TODO`, `In_Progress`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
}

/// Input for updating a task
///
/// Only non-None fields are written. `assignee_id: Some(None)` unassigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub assignee_id: Option<Option<Uuid>>,
}

/// Maps a present field (even `null`) to `Some`, so absent and null differ
///
/// Use with `#[serde(default)]` on an `Option<Option<T>>` field.
pub fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Filters for listing a project's tasks
#[derive(Debug, Clone, Copy)]
pub struct TaskFilter {
    pub project_id: Uuid,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
}

impl TaskFilter {
    pub fn project(project_id: Uuid) -> Self {
        Self {
            project_id,
            status: None,
            assignee_id: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.project_id == self.project_id
            && self.status.map_or(true, |s| task.status == s)
            && self.assignee_id.map_or(true, |a| task.assignee_id == Some(a))
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, status, assignee_id, created_at, updated_at";

impl Task {
    pub fn from_create(data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            status: data.status,
            assignee_id: data.assignee_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the non-None fields of `changes`
    pub fn apply(&mut self, changes: UpdateTask) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(assignee_id) = changes.assignee_id {
            self.assignee_id = assignee_id;
        }
        self.updated_at = Utc::now();
    }

    /// Inserts a task without any membership check
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO tasks (project_id, title, status, assignee_id) \
             VALUES ($1, $2, $3, $4) RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.status)
            .bind(data.assignee_id)
            .fetch_one(executor)
            .await
    }

    /// Inserts a task if its assignee (when set) is an accepted member
    ///
    /// Returns None and writes nothing otherwise.
    pub async fn create_if_assignable<'e, E>(
        executor: E,
        data: CreateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            INSERT INTO tasks (project_id, title, status, assignee_id)
            SELECT $1, $2, $3, $4
            WHERE $4::uuid IS NULL OR EXISTS (
                SELECT 1 FROM project_members
                WHERE project_id = $1 AND user_id = $4 AND status = 'accepted'
                FOR SHARE
            )
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.project_id)
            .bind(data.title)
            .bind(data.status)
            .bind(data.assignee_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// One page of matching tasks, newest first
    pub async fn list<'e, E>(
        executor: E,
        filter: TaskFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE project_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assignee_id = $3)
            ORDER BY created_at DESC, id
            OFFSET $4 LIMIT $5
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(filter.project_id)
            .bind(filter.status)
            .bind(filter.assignee_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(executor)
            .await
    }

    /// Number of tasks matching `filter`, ignoring pagination
    pub async fn count<'e, E>(executor: E, filter: TaskFilter) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE project_id = $1
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assignee_id = $3)
            "#,
        )
        .bind(filter.project_id)
        .bind(filter.status)
        .bind(filter.assignee_id)
        .fetch_one(executor)
        .await?;

        Ok(count)
    }

    /// Updates the non-None fields
    ///
    /// A new assignee must be an accepted member of the task's project. Returns
    /// None if the task doesn't exist or that check fails.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        changes: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (set_assignee, assignee_id) = match changes.assignee_id {
            Some(assignee_id) => (true, assignee_id),
            None => (false, None),
        };

        let query = format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                status = COALESCE($3, status),
                assignee_id = CASE WHEN $4 THEN $5::uuid ELSE assignee_id END,
                updated_at = NOW()
            WHERE id = $1
              AND (NOT $4 OR $5::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM project_members pm
                  WHERE pm.project_id = tasks.project_id
                    AND pm.user_id = $5
                    AND pm.status = 'accepted'
                  FOR SHARE
              ))
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.status)
            .bind(set_assignee)
            .bind(assignee_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts tasks per assignee within a project
    ///
    /// One grouped query for all `assignee_ids`; assignees without tasks are
    /// absent from the map.
    pub async fn count_by_assignees<'e, E>(
        executor: E,
        project_id: Uuid,
        assignee_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if assignee_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT assignee_id, COUNT(*)
            FROM tasks
            WHERE project_id = $1 AND assignee_id = ANY($2)
            GROUP BY assignee_id
            "#,
        )
        .bind(project_id)
        .bind(assignee_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Deletes every task in the project assigned to `assignee_id`
    ///
    /// Returns the number of deleted rows.
    pub async fn delete_by_project_and_assignee<'e, E>(
        executor: E,
        project_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1 AND assignee_id = $2")
            .bind(project_id)
            .bind(assignee_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_task_status_parse_any_case() {
        assert_eq!("TODO".parse::<TaskStatus>(), Ok(TaskStatus::Todo));
        assert_eq!("In_Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!(" done ".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("finished".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_serde() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_update_task_distinguishes_null_from_absent() {
        let absent: UpdateTask = serde_json::from_str(r#"{"title":"Ship"}"#).unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: UpdateTask = serde_json::from_str(r#"{"assignee_id":null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));
    }

    #[test]
    fn test_apply_and_filter() {
        let project_id = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let mut task = Task::from_create(CreateTask {
            project_id,
            title: "Draft".to_string(),
            status: TaskStatus::Todo,
            assignee_id: Some(assignee),
        });

        let filter = TaskFilter {
            status: Some(TaskStatus::Done),
            ..TaskFilter::project(project_id)
        };
        assert!(!filter.matches(&task));

        task.apply(UpdateTask {
            status: Some(TaskStatus::Done),
            assignee_id: Some(None),
            ..Default::default()
        });
        assert_eq!(task.title, "Draft");
        assert!(filter.matches(&task));
        assert!(!TaskFilter {
            assignee_id: Some(assignee),
            ..TaskFilter::project(project_id)
        }
        .matches(&task));
    }
}
