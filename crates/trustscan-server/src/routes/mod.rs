mod evaluation;
mod health;
mod store;

use axum::{response::Json, routing::get, Router};
use utoipa::OpenApi;

use crate::routes::{evaluation::EvaluationApi, store::StoreApi};

#[derive(OpenApi)]
#[openapi(
    nest(
        (path = "/evaluations", api = EvaluationApi),
        (path = "/stores", api = StoreApi),
    ),
    paths(crate::handlers::health::health),
)]
struct ApiDoc;

pub fn create_routes() -> Router {
    let doc = ApiDoc::openapi();

    Router::new()
        .merge(health::create_router())
        .nest("/evaluations", evaluation::create_router())
        .nest("/stores", store::create_router())
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        )
}
