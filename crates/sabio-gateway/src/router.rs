use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, query_handler};
use super::server::AppState;
use sabio_core::AnswerQuery;

pub(crate) fn build_router<Q: AnswerQuery + 'static>(
    state: AppState<Q>,
    max_body_size: usize,
) -> Router {
    Router::new()
        .route("/query", post(query_handler::<Q>))
        .route("/health", get(health_handler::<Q>))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
