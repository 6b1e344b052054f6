use super::DbConn;
use crate::db_error::DbResult;
use libsql::Builder;
use std::path::Path;

pub async fn open_db(db_path: &Path) -> DbResult<DbConn> {
    let database = Builder::new_local(db_path).build().await?;
    let conn = database.connect()?;
    Ok(conn)
}

pub async fn init_db(conn: &DbConn) -> DbResult<()> {
    // Pragmas are best effort; some targets reject WAL on external storage.
    let _ = conn
        .execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 3000;
            "#,
        )
        .await;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .await?;

    tracing::debug!(event = "db_initialized");
    Ok(())
}
