use super::DbConn;
use crate::db_error::DbResult;
use libsql::{params, params_from_iter};
use std::collections::HashMap;

const UPSERT_SETTING_SQL: &str = "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value";

fn numbered_placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// Owned so no borrowed iterator is held across the libsql await.
fn owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| (*key).to_string()).collect()
}

pub async fn get_app_setting(conn: &DbConn, key: &str) -> DbResult<Option<String>> {
    let mut rows = conn
        .query(
            "SELECT value FROM app_settings WHERE key = ?1 LIMIT 1",
            params![key],
        )
        .await?;

    if let Some(row) = rows.next().await? {
        return Ok(Some(row.get::<String>(0)?));
    }

    Ok(None)
}

pub async fn set_app_setting(conn: &DbConn, key: &str, value: &str) -> DbResult<()> {
    conn.execute(UPSERT_SETTING_SQL, params![key, value]).await?;
    Ok(())
}

pub async fn get_app_settings_batch(
    conn: &DbConn,
    keys: &[&str],
) -> DbResult<HashMap<String, String>> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT key, value FROM app_settings WHERE key IN ({})",
        numbered_placeholders(keys.len())
    );
    let params = owned_keys(keys);
    let mut rows = conn.query(sql.as_str(), params_from_iter(params)).await?;

    let mut values = HashMap::with_capacity(keys.len());
    while let Some(row) = rows.next().await? {
        values.insert(row.get::<String>(0)?, row.get::<String>(1)?);
    }
    Ok(values)
}

/// Writes every entry in one transaction so a timetable and its catalog land together.
pub async fn set_app_settings_batch(conn: &DbConn, entries: &[(&str, &str)]) -> DbResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction().await?;
    for (key, value) in entries {
        tx.execute(UPSERT_SETTING_SQL, params![*key, *value]).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete_app_settings(conn: &DbConn, keys: &[&str]) -> DbResult<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let sql = format!(
        "DELETE FROM app_settings WHERE key IN ({})",
        numbered_placeholders(keys.len())
    );
    let params = owned_keys(keys);
    conn.execute(sql.as_str(), params_from_iter(params)).await?;
    Ok(())
}
