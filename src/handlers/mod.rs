pub mod auth;
pub mod events;
pub mod health;
pub mod moods;
pub mod movie_likes;
pub mod quotes;
pub mod songs;
pub mod surprises;
pub mod tasks;
pub mod video;
pub mod wishlist;
pub mod ws;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Json extractor reporting body problems (bad JSON, missing required
/// fields) as our 400 envelope instead of axum's default 422.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Run `validator` derive checks, mapping failures to a 400.
pub(crate) fn check<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// The linked partner's id, if the caller has one.
pub(crate) async fn partner_of(db: &PgPool, user_id: Uuid) -> AppResult<Option<Uuid>> {
    let partner_id =
        sqlx::query_scalar::<_, Option<Uuid>>("SELECT partner_id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .flatten();
    Ok(partner_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, http::StatusCode, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct EchoBody {
        title: String,
    }

    async fn echo(AppJson(body): AppJson<EchoBody>) -> String {
        body.title
    }

    fn app() -> Router {
        Router::new().route("/echo", post(echo))
    }

    #[tokio::test]
    async fn missing_required_field_is_a_400() {
        let response = app()
            .oneshot(
                HttpRequest::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_400() {
        let response = app()
            .oneshot(
                HttpRequest::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_body_passes_through() {
        let response = app()
            .oneshot(
                HttpRequest::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title": "hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
