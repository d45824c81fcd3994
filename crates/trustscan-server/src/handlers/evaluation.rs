//! Host evaluation handlers.

use axum::response::Json;
use validator::Validate;

use crate::{
    db,
    error::Result,
    models::evaluation::{
        parse_target, DeleteResponse, EvaluateRequest, EvaluateResponse, EvaluationRecord,
    },
    state,
};

/// Evaluate a batch of hosts against every vendor trust store.
#[utoipa::path(
    post,
    path = "/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Batch evaluated", body = EvaluateResponse),
        (status = 400, description = "Invalid targets"),
        (status = 503, description = "Trust stores not loaded"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "Evaluation"
)]
pub async fn evaluate_batch(
    Json(payload): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>> {
    payload.validate()?;
    let targets = payload
        .targets
        .iter()
        .map(|raw| parse_target(raw))
        .collect::<Result<Vec<_>>>()?;

    let evaluator = state::evaluator()?;
    tracing::info!(count = targets.len(), "evaluating target batch");
    let batch = evaluator.evaluate_batch(&targets).await;

    for evaluation in batch.evaluated {
        db::evaluation::create_evaluation(EvaluationRecord::from_evaluation(evaluation)).await?;
    }

    Ok(Json(EvaluateResponse {
        evaluated_count: batch.evaluated_count,
        had_errors: batch.had_errors,
    }))
}

/// List all stored host evaluations.
#[utoipa::path(
    get,
    path = "/list",
    responses(
        (status = 200, description = "Stored evaluations", body = Vec<EvaluationRecord>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "Evaluation"
)]
pub async fn list_evaluations() -> Result<Json<Vec<EvaluationRecord>>> {
    let records = db::evaluation::list_evaluations().await?;
    Ok(Json(records))
}

/// Delete all stored host evaluations.
#[utoipa::path(
    delete,
    path = "/clear",
    responses(
        (status = 200, description = "Evaluations cleared", body = DeleteResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "Evaluation"
)]
pub async fn clear_evaluations() -> Result<Json<DeleteResponse>> {
    let deleted = db::evaluation::clear_evaluations().await?;
    tracing::info!(deleted, "cleared stored evaluations");
    Ok(Json(DeleteResponse { deleted }))
}
