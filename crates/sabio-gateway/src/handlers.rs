use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::server::AppState;
use sabio_core::AnswerQuery;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct QueryPayload {
    /// Caller identity, echoed into logs for traceability only.
    pub user_id: String,
    pub query: String,
}

#[derive(serde::Serialize)]
struct QueryResponse {
    answer: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn query_handler<Q: AnswerQuery>(
    State(state): State<AppState<Q>>,
    Json(payload): Json<QueryPayload>,
) -> impl IntoResponse {
    tracing::info!(user_id = %payload.user_id, "query received");
    match state.pipeline.answer(&payload.query).await {
        Ok(answer) => Json(QueryResponse { answer }).into_response(),
        Err(e) => {
            tracing::error!(user_id = %payload.user_id, error = %e, "query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error processing the query",
            )
                .into_response()
        }
    }
}

pub(crate) async fn health_handler<Q: AnswerQuery>(
    State(state): State<AppState<Q>>,
) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}
