use crate::{db::get_db, error::Result, models::store::TrustStoreRecord};

/// Create the trust store catalog table.
pub async fn create_store_table() -> Result<()> {
    let query = r#"
        DEFINE TABLE IF NOT EXISTS trust_stores SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS store_name_idx ON TABLE trust_stores COLUMNS name UNIQUE;
    "#;
    get_db().query(query).await?;
    Ok(())
}

/// Insert or replace the catalog record for one vendor.
pub async fn upsert_store(slug: &str, record: TrustStoreRecord) -> Result<TrustStoreRecord> {
    let stored: Option<TrustStoreRecord> = get_db()
        .upsert(("trust_stores", slug))
        .content(record)
        .await?;
    stored.ok_or_else(|| {
        crate::error::AppError::Internal("failed to store trust store catalog".to_string())
    })
}

/// Fetch one vendor's catalog record, including its certificates.
pub async fn get_store(slug: &str) -> Result<Option<TrustStoreRecord>> {
    let record: Option<TrustStoreRecord> = get_db().select(("trust_stores", slug)).await?;
    Ok(record)
}
