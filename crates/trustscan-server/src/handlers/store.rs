//! Trust store catalog handlers.

use axum::{extract::Path, response::Json};
use trustscan_core::{load_bundle, Vendor};

use crate::{
    db,
    error::{AppError, Result},
    models::store::{StoreSummary, TrustStoreRecord},
    state,
};

/// Parse every configured vendor bundle and persist the browsable catalogs.
#[utoipa::path(
    post,
    path = "/load",
    responses(
        (status = 200, description = "Catalogs loaded", body = Vec<StoreSummary>),
        (status = 503, description = "Service configuration not initialized"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "TrustStore"
)]
pub async fn load_trust_stores() -> Result<Json<Vec<StoreSummary>>> {
    let trust = state::trust_cfg()?;

    let mut summaries = Vec::with_capacity(Vendor::ALL.len());
    for vendor in Vendor::ALL {
        let path = trust.bundle_path(vendor);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to read {path}: {e}")))?;
        let bundle = load_bundle(vendor, &bytes)?;
        let certificate_count = bundle.len();

        db::store::upsert_store(vendor.slug(), TrustStoreRecord::from_catalog(bundle.catalog()))
            .await?;
        tracing::info!(%vendor, certificate_count, "trust store catalog stored");

        summaries.push(StoreSummary {
            vendor: vendor.label().to_string(),
            certificate_count,
        });
    }
    Ok(Json(summaries))
}

/// Fetch one vendor's catalog, including its certificates.
#[utoipa::path(
    get,
    path = "/{name}",
    params(
        ("name" = String, Path, description = "Vendor name or slug")
    ),
    responses(
        (status = 200, description = "Trust store catalog", body = TrustStoreRecord),
        (status = 404, description = "Unknown vendor or catalog not loaded"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "TrustStore"
)]
pub async fn get_trust_store(Path(name): Path<String>) -> Result<Json<TrustStoreRecord>> {
    let vendor = Vendor::parse(&name)
        .ok_or_else(|| AppError::NotFound(format!("unknown trust store: {name}")))?;
    let record = db::store::get_store(vendor.slug())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("trust store not loaded: {name}")))?;
    Ok(Json(record))
}
