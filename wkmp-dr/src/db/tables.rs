//! Table listing and metadata queries
//!
//! [REQ-DR-F-010]: Table-by-table content viewing
//! [REQ-DR-F-030]: Row count display

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Table metadata [REQ-DR-F-010, REQ-DR-F-030]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// Number of rows in table
    pub row_count: i64,
}

/// List all tables with row counts [REQ-DR-F-010, REQ-DR-F-030]
///
/// Returns tables in alphabetical order, excluding SQLite internal tables.
/// Note: Not currently used by API layer, kept for potential future table enumeration endpoint
#[allow(dead_code)]
pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableInfo>> {
    let tables = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut table_infos = Vec::new();

    for (table_name,) in tables {
        // Get row count for each table
        let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table_name))
            .fetch_one(pool)
            .await?;

        table_infos.push(TableInfo {
            name: table_name,
            row_count,
        });
    }

    Ok(table_infos)
}
