//! Data quality tools
//!
//! Column profiling and missing-value inspection.

use serde_json::{json, Value};

use crate::error::Result;
use crate::td::client::TdClient;
use crate::td::types::{sql_quote_ident, tool_response};

/// Split a `db.table` name into a safely quoted identifier
///
/// A bare table name is passed through quoted; a qualified name quotes
/// both parts.
pub fn quote_table_name(table_name: &str) -> String {
    match table_name.split_once('.') {
        Some((db, tab)) => format!("{}.{}", sql_quote_ident(db), sql_quote_ident(tab)),
        None => sql_quote_ident(table_name),
    }
}

/// SQL for per-column null counts of a table
pub fn missing_values_sql(table_name: &str) -> String {
    format!(
        "SELECT ColumnName, NullCount, NullPercentage \
         FROM TD_ColumnSummary ( ON {} AS InputTable USING TargetColumns ('[:]') ) AS dt \
         WHERE NullCount > 0 ORDER BY NullCount DESC",
        quote_table_name(table_name)
    )
}

/// SQL for per-column negative value counts of a table
pub fn negative_values_sql(table_name: &str) -> String {
    format!(
        "SELECT ColumnName, NegativeCount \
         FROM TD_ColumnSummary ( ON {} AS InputTable USING TargetColumns ('[:]') ) AS dt \
         WHERE NegativeCount > 0 ORDER BY NegativeCount DESC",
        quote_table_name(table_name)
    )
}

/// SQL for the distinct categories of a column
pub fn distinct_categories_sql(table_name: &str, col_name: &str) -> String {
    format!(
        "SELECT {col} AS Category, COUNT(*) AS CategoryCount FROM {tab} \
         GROUP BY 1 ORDER BY CategoryCount DESC",
        col = sql_quote_ident(col_name),
        tab = quote_table_name(table_name)
    )
}

/// SQL for the standard deviation and mean of a column
pub fn standard_deviation_sql(table_name: &str, col_name: &str) -> String {
    format!(
        "SELECT STDDEV_SAMP({col}) AS StandardDeviation, AVG({col}) AS Mean FROM {tab}",
        col = sql_quote_ident(col_name),
        tab = quote_table_name(table_name)
    )
}

/// SQL for summary statistics of every column of a table
pub fn column_summary_sql(table_name: &str) -> String {
    format!(
        "SELECT * FROM TD_ColumnSummary ( ON {} AS InputTable USING TargetColumns ('[:]') ) AS dt",
        quote_table_name(table_name)
    )
}

/// SQL for univariate statistics of a column
pub fn univariate_statistics_sql(table_name: &str, col_name: &str) -> String {
    format!(
        "SELECT * FROM TD_UnivariateStatistics ( ON {} AS InputTable \
         USING TargetColumns ('{}') Stats ('ALL') ) AS dt",
        quote_table_name(table_name),
        col_name.replace('\'', "''")
    )
}

/// SQL for the rows where a column is null
pub fn rows_with_missing_values_sql(table_name: &str, col_name: &str) -> String {
    format!(
        "SELECT TOP 100 * FROM {} WHERE {} IS NULL",
        quote_table_name(table_name),
        sql_quote_ident(col_name)
    )
}

async fn run(client: &TdClient, sql: &str, tool_name: &str) -> Result<Value> {
    let result = client.execute(sql).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": tool_name})),
    ))
}

/// Columns with missing values
pub async fn missing_values(client: &TdClient, table_name: &str) -> Result<Value> {
    run(client, &missing_values_sql(table_name), "qlty_missingValues").await
}

/// Columns with negative values
pub async fn negative_values(client: &TdClient, table_name: &str) -> Result<Value> {
    run(client, &negative_values_sql(table_name), "qlty_negativeValues").await
}

/// Distinct categories of a column
pub async fn distinct_categories(
    client: &TdClient,
    table_name: &str,
    col_name: &str,
) -> Result<Value> {
    run(
        client,
        &distinct_categories_sql(table_name, col_name),
        "qlty_distinctCategories",
    )
    .await
}

/// Standard deviation and mean of a column
pub async fn standard_deviation(
    client: &TdClient,
    table_name: &str,
    col_name: &str,
) -> Result<Value> {
    run(
        client,
        &standard_deviation_sql(table_name, col_name),
        "qlty_standardDeviation",
    )
    .await
}

/// Column summary statistics of a table
pub async fn column_summary(client: &TdClient, table_name: &str) -> Result<Value> {
    run(client, &column_summary_sql(table_name), "qlty_columnSummary").await
}

/// Univariate statistics of a column
pub async fn univariate_statistics(
    client: &TdClient,
    table_name: &str,
    col_name: &str,
) -> Result<Value> {
    run(
        client,
        &univariate_statistics_sql(table_name, col_name),
        "qlty_univariateStatistics",
    )
    .await
}

/// Sample of rows with a missing value in a column
pub async fn rows_with_missing_values(
    client: &TdClient,
    table_name: &str,
    col_name: &str,
) -> Result<Value> {
    run(
        client,
        &rows_with_missing_values_sql(table_name, col_name),
        "qlty_rowsWithMissingValues",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_table_name_splits_qualified() {
        assert_eq!(quote_table_name("db.tab"), "\"db\".\"tab\"");
        assert_eq!(quote_table_name("tab"), "\"tab\"");
    }

    #[test]
    fn test_distinct_categories_quotes_column() {
        let sql = distinct_categories_sql("sales.orders", "region");
        assert!(sql.contains("\"region\" AS Category"));
        assert!(sql.contains("\"sales\".\"orders\""));
    }

    #[test]
    fn test_rows_with_missing_values_bounded() {
        let sql = rows_with_missing_values_sql("t", "c");
        assert!(sql.starts_with("SELECT TOP 100"));
        assert!(sql.contains("\"c\" IS NULL"));
    }

    #[test]
    fn test_univariate_escapes_column_literal() {
        let sql = univariate_statistics_sql("t", "o'clock");
        assert!(sql.contains("'o''clock'"));
    }
}
