use axum::{
    routing::{delete, get, post},
    Router,
};
use utoipa::OpenApi;

use crate::handlers::evaluation::{clear_evaluations, evaluate_batch, list_evaluations};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::evaluation::evaluate_batch,
        crate::handlers::evaluation::list_evaluations,
        crate::handlers::evaluation::clear_evaluations,
    ),
    tags(
        (name = "Evaluation", description = "Host trust evaluation APIs")
    ),
)]
pub struct EvaluationApi;

pub fn create_router() -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_batch))
        .route("/list", get(list_evaluations))
        .route("/clear", delete(clear_evaluations))
}
