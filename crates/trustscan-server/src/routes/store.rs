use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;

use crate::handlers::store::{get_trust_store, load_trust_stores};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::store::load_trust_stores,
        crate::handlers::store::get_trust_store,
    ),
    tags(
        (name = "TrustStore", description = "Trust store catalog APIs")
    ),
)]
pub struct StoreApi;

pub fn create_router() -> Router {
    Router::new()
        .route("/load", post(load_trust_stores))
        .route("/{name}", get(get_trust_store))
}
