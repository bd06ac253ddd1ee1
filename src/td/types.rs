//! Result types and response helpers for Teradata tools
//!
//! Every tool answers with the same JSON envelope:
//! `{"status": "success", "metadata": ..., "results": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Column metadata as reported by the Query Service gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name
    pub name: String,

    /// Teradata type name (e.g. "INTEGER", "VARCHAR")
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,
}

/// One result set of a statement
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultSet {
    /// Column metadata, in select-list order
    #[serde(default)]
    pub columns: Vec<ColumnMeta>,

    /// Rows as column-name -> value objects
    #[serde(default)]
    pub data: Vec<Map<String, Value>>,

    /// Row count reported by the gateway
    #[serde(rename = "rowCount", default)]
    pub row_count: u64,
}

/// Parsed response of a query submission
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryResult {
    /// One entry per statement in the request
    #[serde(default)]
    pub results: Vec<ResultSet>,
}

impl QueryResult {
    /// Rows of the first result set
    pub fn rows(&self) -> &[Map<String, Value>] {
        self.results.first().map(|r| r.data.as_slice()).unwrap_or(&[])
    }

    /// Rows of the first result set as a JSON array
    pub fn rows_json(&self) -> Value {
        Value::Array(self.rows().iter().cloned().map(Value::Object).collect())
    }

    /// First column of the first row, if any
    pub fn scalar(&self) -> Option<&Value> {
        let row = self.rows().first()?;
        row.values().next()
    }
}

/// Wrap tool output in the standard response envelope
pub fn tool_response(data: Value, metadata: Option<Value>) -> Value {
    match metadata {
        Some(meta) => json!({
            "status": "success",
            "metadata": meta,
            "results": data,
        }),
        None => json!({
            "status": "success",
            "results": data,
        }),
    }
}

/// Escape a string for use as a SQL single-quoted literal
pub fn sql_quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Escape a name for use as a SQL double-quoted identifier
pub fn sql_quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Qualified `"db"."object"` identifier
pub fn sql_qualified(db_name: &str, obj_name: &str) -> String {
    format!("{}.{}", sql_quote_ident(db_name), sql_quote_ident(obj_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_escapes_quotes() {
        assert_eq!(sql_quote_literal("plain"), "'plain'");
        assert_eq!(sql_quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(sql_quote_ident("tab"), "\"tab\"");
        assert_eq!(sql_quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(sql_qualified("db", "t"), "\"db\".\"t\"");
    }

    #[test]
    fn test_tool_response_with_metadata() {
        let resp = tool_response(json!([1, 2]), Some(json!({"tool_name": "x"})));
        assert_eq!(resp["status"], "success");
        assert_eq!(resp["metadata"]["tool_name"], "x");
        assert_eq!(resp["results"][1], 2);
    }

    #[test]
    fn test_tool_response_without_metadata() {
        let resp = tool_response(json!("ok"), None);
        assert_eq!(resp["status"], "success");
        assert!(resp.get("metadata").is_none());
    }

    #[test]
    fn test_query_result_accessors() {
        let parsed: QueryResult = serde_json::from_value(json!({
            "results": [{
                "columns": [{"name": "DatabaseName", "type": "VARCHAR"}],
                "data": [{"DatabaseName": "DBC"}, {"DatabaseName": "demo"}],
                "rowCount": 2
            }]
        }))
        .unwrap();

        assert_eq!(parsed.rows().len(), 2);
        assert_eq!(parsed.scalar(), Some(&json!("DBC")));
        assert_eq!(parsed.rows_json()[1]["DatabaseName"], "demo");
    }

    #[test]
    fn test_query_result_empty() {
        let parsed = QueryResult::default();
        assert!(parsed.rows().is_empty());
        assert!(parsed.scalar().is_none());
    }
}
