//! Base database tools
//!
//! General-purpose query, DDL, and catalog inspection tools.

use serde_json::{json, Value};

use crate::error::Result;
use crate::td::client::TdClient;
use crate::td::types::{sql_qualified, sql_quote_literal, tool_response};

/// SQL for listing all databases on the system
pub fn database_list_sql() -> String {
    "SELECT DatabaseName, OwnerName, DBKind, CommentString \
     FROM DBC.DatabasesV ORDER BY DatabaseName"
        .to_string()
}

/// SQL for listing objects in a database
pub fn table_list_sql(db_name: &str) -> String {
    format!(
        "SELECT TableName, TableKind, CreatorName, CommentString \
         FROM DBC.TablesV WHERE DatabaseName = {} \
         AND TableKind IN ('T', 'O', 'V', 'Q') ORDER BY TableName",
        sql_quote_literal(db_name)
    )
}

/// SQL for the DDL of a table
pub fn table_ddl_sql(db_name: &str, table_name: &str) -> String {
    format!("SHOW TABLE {}", sql_qualified(db_name, table_name))
}

/// SQL for detailed column information
pub fn column_description_sql(db_name: &str, obj_name: &str) -> String {
    format!(
        "SELECT ColumnName, ColumnType, ColumnLength, DecimalTotalDigits, \
         DecimalFractionalDigits, Nullable, DefaultValue, CommentString \
         FROM DBC.ColumnsV WHERE DatabaseName = {} AND TableName = {} \
         ORDER BY ColumnId",
        sql_quote_literal(db_name),
        sql_quote_literal(obj_name)
    )
}

/// SQL sampling the first rows of a table
pub fn table_preview_sql(db_name: &str, table_name: &str) -> String {
    format!("SELECT TOP 10 * FROM {}", sql_qualified(db_name, table_name))
}

/// SQL for tables commonly queried together with the given object
///
/// Objects are related when they appear in the same logged query.
pub fn table_affinity_sql(db_name: &str, obj_name: &str) -> String {
    format!(
        "SELECT o2.ObjectDatabaseName AS DatabaseName, \
         o2.ObjectTableName AS TableName, COUNT(*) AS QueryCount \
         FROM DBC.DBQLObjTbl o1 JOIN DBC.DBQLObjTbl o2 ON o1.QueryID = o2.QueryID \
         WHERE o1.ObjectDatabaseName = {db} AND o1.ObjectTableName = {obj} \
         AND o1.ObjectType = 'Tab' AND o2.ObjectType = 'Tab' \
         AND NOT (o2.ObjectDatabaseName = {db} AND o2.ObjectTableName = {obj}) \
         GROUP BY 1, 2 ORDER BY QueryCount DESC",
        db = sql_quote_literal(db_name),
        obj = sql_quote_literal(obj_name)
    )
}

/// SQL measuring object usage by user within a database
pub fn table_usage_sql(db_name: &str) -> String {
    format!(
        "SELECT o.ObjectTableName AS TableName, q.UserName, \
         COUNT(*) AS QueryCount, MAX(q.StartTime) AS LastUse \
         FROM DBC.DBQLObjTbl o JOIN DBC.DBQLogTbl q ON o.QueryID = q.QueryID \
         WHERE o.ObjectDatabaseName = {} AND o.ObjectType = 'Tab' \
         AND q.StartTime >= CURRENT_TIMESTAMP - INTERVAL '30' DAY \
         GROUP BY 1, 2 ORDER BY QueryCount DESC",
        sql_quote_literal(db_name)
    )
}

/// Run an arbitrary read query
pub async fn read_query(client: &TdClient, sql: &str) -> Result<Value> {
    let result = client.execute(sql).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_readQuery"})),
    ))
}

/// Run an arbitrary write statement
pub async fn write_query(client: &TdClient, sql: &str) -> Result<Value> {
    tracing::info!("Executing write statement");
    let result = client.execute(sql).await?;
    let affected = result.results.first().map(|r| r.row_count).unwrap_or(0);
    Ok(tool_response(
        json!({"rows_affected": affected}),
        Some(json!({"tool_name": "base_writeQuery"})),
    ))
}

/// Fetch the DDL of a table
pub async fn table_ddl(client: &TdClient, db_name: &str, table_name: &str) -> Result<Value> {
    let result = client.execute(&table_ddl_sql(db_name, table_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_tableDDL", "database": db_name, "table": table_name})),
    ))
}

/// List all databases
pub async fn database_list(client: &TdClient) -> Result<Value> {
    let result = client.execute(&database_list_sql()).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_databaseList"})),
    ))
}

/// List objects in a database
pub async fn table_list(client: &TdClient, db_name: &str) -> Result<Value> {
    let result = client.execute(&table_list_sql(db_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_tableList", "database": db_name})),
    ))
}

/// Describe the columns of a table or view
pub async fn column_description(
    client: &TdClient,
    db_name: &str,
    obj_name: &str,
) -> Result<Value> {
    let result = client
        .execute(&column_description_sql(db_name, obj_name))
        .await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_columnDescription", "database": db_name, "object": obj_name})),
    ))
}

/// Sample rows and structure of a table
pub async fn table_preview(client: &TdClient, db_name: &str, table_name: &str) -> Result<Value> {
    let preview = client
        .execute(&table_preview_sql(db_name, table_name))
        .await?;
    let columns = client
        .execute(&column_description_sql(db_name, table_name))
        .await?;
    Ok(tool_response(
        json!({"sample": preview.rows_json(), "columns": columns.rows_json()}),
        Some(json!({"tool_name": "base_tablePreview", "database": db_name, "table": table_name})),
    ))
}

/// Tables commonly used together with the given object
pub async fn table_affinity(client: &TdClient, db_name: &str, obj_name: &str) -> Result<Value> {
    let result = client.execute(&table_affinity_sql(db_name, obj_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_tableAffinity", "database": db_name, "object": obj_name})),
    ))
}

/// Object usage by user within a database
pub async fn table_usage(client: &TdClient, db_name: &str) -> Result<Value> {
    let result = client.execute(&table_usage_sql(db_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "base_tableUsage", "database": db_name})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_list_sql_quotes_database() {
        let sql = table_list_sql("fin'ance");
        assert!(sql.contains("'fin''ance'"));
        assert!(sql.contains("DBC.TablesV"));
    }

    #[test]
    fn test_table_ddl_sql_uses_qualified_name() {
        assert_eq!(table_ddl_sql("db", "tab"), "SHOW TABLE \"db\".\"tab\"");
    }

    #[test]
    fn test_preview_sql_is_bounded() {
        assert!(table_preview_sql("db", "t").starts_with("SELECT TOP 10 *"));
    }

    #[test]
    fn test_affinity_sql_excludes_self() {
        let sql = table_affinity_sql("db", "orders");
        assert!(sql.contains("NOT (o2.ObjectDatabaseName = 'db' AND o2.ObjectTableName = 'orders')"));
    }

    #[test]
    fn test_usage_sql_windows_thirty_days() {
        assert!(table_usage_sql("db").contains("INTERVAL '30' DAY"));
    }
}
