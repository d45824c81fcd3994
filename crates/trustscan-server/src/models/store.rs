//! Trust store catalog models.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use trustscan_core::{RootCertInfo, TrustStoreCatalog};
use utoipa::ToSchema;

/// Stored catalog record for one vendor's root store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrustStoreRecord {
    /// Vendor display label.
    pub name: String,
    pub total: usize,
    #[schema(value_type = Vec<Object>)]
    pub certificates: Vec<RootCertInfo>,
    pub loaded_at: i64,
}

impl TrustStoreRecord {
    pub fn from_catalog(catalog: TrustStoreCatalog) -> Self {
        Self {
            name: catalog.vendor.label().to_string(),
            total: catalog.total,
            certificates: catalog.certificates,
            loaded_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }
}

/// Per-vendor summary returned by the catalog load operation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreSummary {
    pub vendor: String,
    pub certificate_count: usize,
}
