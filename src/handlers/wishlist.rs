use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{check, AppJson};
use crate::models::stamp_once;
use crate::models::task::Priority;
use crate::models::wishlist::{
    CreateWishlistRequest, UpdateWishlistRequest, WishCategory, WishlistItem, WishlistQuery,
};
use crate::AppState;

// Wishlist is shared between the two of us: reads and mutations are
// deliberately not owner-scoped, only tagged by gender.

pub async fn list_wishlist(
    State(state): State<AppState>,
    Query(query): Query<WishlistQuery>,
) -> AppResult<Json<Vec<WishlistItem>>> {
    let items = sqlx::query_as::<_, WishlistItem>(
        r#"
        SELECT * FROM wishlist_items
        WHERE ($1::gender IS NULL OR gender = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.gender)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(items))
}

pub async fn create_wishlist_item(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateWishlistRequest>,
) -> AppResult<(StatusCode, Json<WishlistItem>)> {
    check(&body)?;

    let item = sqlx::query_as::<_, WishlistItem>(
        r#"
        INSERT INTO wishlist_items (id, gender, title, category, description, priority)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.gender)
    .bind(&body.title)
    .bind(body.category)
    .bind(&body.description)
    .bind(body.priority.unwrap_or_default())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_wishlist_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    AppJson(body): AppJson<UpdateWishlistRequest>,
) -> AppResult<Json<WishlistItem>> {
    let existing = sqlx::query_as::<_, WishlistItem>("SELECT * FROM wishlist_items WHERE id = $1")
        .bind(item_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Wishlist item not found".into()))?;

    let title = body
        .title
        .apply_required(existing.title, "title")
        .map_err(AppError::Validation)?;
    let category: WishCategory = body
        .category
        .apply_required(existing.category, "category")
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

    // The completion date is write-once; toggling the flag later never
    // moves it.
    let completed_date = stamp_once(completed, existing.completed_date, Utc::now());

    let updated = sqlx::query_as::<_, WishlistItem>(
        r#"
        UPDATE wishlist_items
        SET title = $2, category = $3, description = $4, priority = $5,
            completed = $6, completed_date = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(item_id)
    .bind(&title)
    .bind(category)
    .bind(&description)
    .bind(priority)
    .bind(completed)
    .bind(completed_date)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

pub async fn delete_wishlist_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1")
        .bind(item_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Wishlist item not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}
