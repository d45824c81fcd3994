use crate::{db::get_db, error::Result, models::evaluation::EvaluationRecord};

/// Create the host evaluation table.
///
/// Kept schemaless: each record embeds the full per-vendor chain payload,
/// whose nesting varies with the length of the presented chain.
pub async fn create_evaluation_table() -> Result<()> {
    let query = r#"
        DEFINE TABLE IF NOT EXISTS evaluations SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS host_idx       ON TABLE evaluations COLUMNS host;
        DEFINE INDEX IF NOT EXISTS created_at_idx ON TABLE evaluations COLUMNS created_at;
    "#;
    get_db().query(query).await?;
    Ok(())
}

/// Store one host evaluation record.
pub async fn create_evaluation(record: EvaluationRecord) -> Result<EvaluationRecord> {
    let created: Option<EvaluationRecord> = get_db()
        .create("evaluations")
        .content(record)
        .await?;
    created.ok_or_else(|| {
        crate::error::AppError::Internal("failed to create evaluation record".to_string())
    })
}

/// All stored evaluation records, newest first.
pub async fn list_evaluations() -> Result<Vec<EvaluationRecord>> {
    let mut response = get_db()
        .query("SELECT * FROM evaluations ORDER BY created_at DESC")
        .await?;
    let records: Vec<EvaluationRecord> = response.take(0)?;
    Ok(records)
}

/// Delete every stored evaluation record, returning how many were removed.
pub async fn clear_evaluations() -> Result<usize> {
    let deleted: Vec<EvaluationRecord> = get_db().delete("evaluations").await?;
    Ok(deleted.len())
}
