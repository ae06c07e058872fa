use axum::{extract::State, Json};

use crate::services::quotes::QuotesPayload;
use crate::AppState;

/// The service never fails: upstream faults degrade to cached or default
/// quotes instead of a 500.
pub async fn get_quotes(State(state): State<AppState>) -> Json<QuotesPayload> {
    Json(state.quotes.get().await)
}
