use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::identity::{require_owner, AuthUser};
use crate::error::{AppError, AppResult};
use crate::handlers::{check, partner_of, AppJson};
use crate::models::task::{CreateTaskRequest, Priority, Task, TaskQuery, UpdateTaskRequest};
use crate::AppState;

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let partner_id = partner_of(&state.db, auth_user.id).await?;

    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE (owner_id = $1 OR owner_id = $2)
          AND ($3::text IS NULL OR channel_id = $3)
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(partner_id)
    .bind(&query.channel_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    check(&body)?;

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, owner_id, channel_id, title, description, priority, due_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.channel_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.priority.unwrap_or_default())
    .bind(body.due_date)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    let existing = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Task not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    let title = body
        .title
        .apply_required(existing.title, "title")
        .map_err(AppError::Validation)?;
    let description = body.description.apply(existing.description);
    let priority: Priority = body
        .priority
        .apply_required(existing.priority, "priority")
        .map_err(AppError::Validation)?;
    let completed = body
        .completed
        .apply_required(existing.completed, "completed")
        .map_err(AppError::Validation)?;
    let due_date = body.due_date.apply(existing.due_date);

    // completed_at tracks the flag: stamped on completion, cleared on reopen.
    let completed_at = match (existing.completed, completed) {
        (false, true) => Some(Utc::now()),
        (_, false) => None,
        (true, true) => existing.completed_at,
    };

    let updated = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks
        SET title = $2, description = $3, priority = $4, completed = $5,
            due_date = $6, completed_at = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(task_id)
    .bind(&title)
    .bind(&description)
    .bind(priority)
    .bind(completed)
    .bind(due_date)
    .bind(completed_at)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Task not found".into()))?;

    require_owner(Some(existing.owner_id), auth_user.id)?;

    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "deleted": true })))
}
