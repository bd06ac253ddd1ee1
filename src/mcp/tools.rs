//! MCP tool definitions and handlers
//!
//! Defines all available tools and dispatches calls into the Teradata
//! access layer. Database failures surface as tool-level errors, never as
//! protocol errors.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::mcp::types::{CallToolResult, Tool};
use crate::td::client::TdClient;
use crate::td::custom::CustomTool;
use crate::td::dba::ResusageFilter;
use crate::td::rag::RagState;
use crate::td::{base, dba, quality, rag, security};

/// Tool handler
pub struct ToolHandler {
    client: Arc<TdClient>,
    rag_state: Arc<RagState>,
    custom_tools: Vec<CustomTool>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(client: Arc<TdClient>, rag_state: Arc<RagState>, custom_tools: Vec<CustomTool>) -> Self {
        Self {
            client,
            rag_state,
            custom_tools,
        }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        let mut tools = vec![
            tool_def("base_readQuery", "Executes a SQL query to read from the database.", sql_schema("SQL that reads from the database to run")),
            tool_def("base_writeQuery", "Executes a SQL query to write to the database.", sql_schema("SQL that writes to the database to run")),
            tool_def("base_tableDDL", "Display table DDL definition.", db_table_schema()),
            tool_def("base_databaseList", "List all databases in the Teradata system.", empty_schema()),
            tool_def("base_tableList", "List objects in a database.", db_schema()),
            tool_def("base_columnDescription", "Show detailed column information about a database table.", db_obj_schema()),
            tool_def("base_tablePreview", "Get data samples and structure overview from a database table.", db_table_schema()),
            tool_def("base_tableAffinity", "Get tables commonly used together by database users, this is helpful to infer relationships between tables.", db_obj_schema()),
            tool_def("base_tableUsage", "Measure the usage of tables and views by users in a given schema.", db_schema()),
            tool_def("dba_userSqlList", "Get a list of SQL run by a user in the last number of days, or all SQL when no user is given.", user_days_schema()),
            tool_def("dba_tableSqlList", "Get a list of SQL run against a table in the last number of days.", table_days_schema()),
            tool_def("dba_tableSpace", "Get table space used for a table, or for all tables in a database.", db_table_schema()),
            tool_def("dba_databaseSpace", "Get database space allocations, for one database or all.", db_schema()),
            tool_def("dba_databaseVersion", "Get Teradata database version information.", empty_schema()),
            tool_def("dba_resusageSummary", "Get system usage summary metrics by weekday and hour for each workload type and query complexity bucket.", empty_schema()),
            tool_def("dba_resusageUserSummary", "Get system usage summary metrics by user on a specified date, or day of week and hour of day.", resusage_user_schema()),
            tool_def("dba_flowControl", "Get the Teradata flow control metrics.", empty_schema()),
            tool_def("dba_featureUsage", "Get the user feature usage metrics.", empty_schema()),
            tool_def("dba_userDelay", "Get the Teradata user delay metrics.", empty_schema()),
            tool_def("dba_tableUsageImpact", "Measure the usage of tables and views by users, to understand what drives resource usage.", db_user_schema()),
            tool_def("dba_sessionInfo", "Get the Teradata session information for a user.", user_schema()),
            tool_def("qlty_missingValues", "Get the column names that have missing values in a table.", table_schema()),
            tool_def("qlty_negativeValues", "Get the column names that have negative values in a table.", table_schema()),
            tool_def("qlty_distinctCategories", "Get the distinct categories from a column in a table.", table_col_schema()),
            tool_def("qlty_standardDeviation", "Get the standard deviation from a column in a table.", table_col_schema()),
            tool_def("qlty_columnSummary", "Get the column summary statistics for a table.", table_schema()),
            tool_def("qlty_univariateStatistics", "Get the univariate statistics for a table.", table_col_schema()),
            tool_def("qlty_rowsWithMissingValues", "Get the rows with missing values in a table.", table_col_schema()),
            tool_def("sec_userDbPermissions", "Get permissions for a user.", user_schema()),
            tool_def("sec_rolePermissions", "Get permissions for a role.", role_schema()),
            tool_def("sec_userRoles", "Get roles assigned to a user.", user_schema()),
            tool_def("rag_setConfig", "Set the configuration for the current RAG session. Must be called before any other RAG tool.", rag_config_schema()),
            tool_def("rag_storeUserQuery", "Store a user's natural language question as the first step in a RAG workflow. A '/rag ' prefix is stripped before storage.", rag_store_schema()),
            tool_def("rag_tokenizeQuery", "Tokenize the latest stored user question and create the tokenized view used for embedding.", empty_schema()),
            tool_def("rag_createEmbeddingView", "Generate sentence embeddings for the most recent tokenized user query.", empty_schema()),
            tool_def("rag_createQueryEmbeddingTable", "Convert the sentence embedding into vector columns for similarity search.", empty_schema()),
            tool_def("rag_semanticSearchChunks", "Retrieve the top-k most relevant chunks for the user's latest embedded query using cosine similarity.", rag_search_schema()),
        ];

        for custom in &self.custom_tools {
            tools.push(tool_def(&custom.name, &custom.description, empty_schema()));
        }

        tools
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "base_readQuery" => self.handle_read_query(args).await,
            "base_writeQuery" => self.handle_write_query(args).await,
            "base_tableDDL" => self.handle_table_ddl(args).await,
            "base_databaseList" => to_result(base::database_list(&self.client).await),
            "base_tableList" => self.handle_table_list(args).await,
            "base_columnDescription" => self.handle_column_description(args).await,
            "base_tablePreview" => self.handle_table_preview(args).await,
            "base_tableAffinity" => self.handle_table_affinity(args).await,
            "base_tableUsage" => self.handle_table_usage(args).await,
            "dba_userSqlList" => self.handle_user_sql_list(args).await,
            "dba_tableSqlList" => self.handle_table_sql_list(args).await,
            "dba_tableSpace" => self.handle_table_space(args).await,
            "dba_databaseSpace" => self.handle_database_space(args).await,
            "dba_databaseVersion" => to_result(dba::database_version(&self.client).await),
            "dba_resusageSummary" => to_result(
                dba::resusage_summary(
                    &self.client,
                    &["hourOfDay", "dayOfWeek", "workloadType", "queryComplexity"],
                    &ResusageFilter::default(),
                )
                .await,
            ),
            "dba_resusageUserSummary" => self.handle_resusage_user_summary(args).await,
            "dba_flowControl" => to_result(dba::flow_control(&self.client).await),
            "dba_featureUsage" => to_result(dba::feature_usage(&self.client).await),
            "dba_userDelay" => to_result(dba::user_delay(&self.client).await),
            "dba_tableUsageImpact" => self.handle_table_usage_impact(args).await,
            "dba_sessionInfo" => self.handle_session_info(args).await,
            "qlty_missingValues" => match parse_args::<TableArgs>(args) {
                Ok(a) => to_result(quality::missing_values(&self.client, &a.table_name).await),
                Err(e) => e,
            },
            "qlty_negativeValues" => match parse_args::<TableArgs>(args) {
                Ok(a) => to_result(quality::negative_values(&self.client, &a.table_name).await),
                Err(e) => e,
            },
            "qlty_distinctCategories" => match parse_args::<TableColArgs>(args) {
                Ok(a) => to_result(
                    quality::distinct_categories(&self.client, &a.table_name, &a.col_name).await,
                ),
                Err(e) => e,
            },
            "qlty_standardDeviation" => match parse_args::<TableColArgs>(args) {
                Ok(a) => to_result(
                    quality::standard_deviation(&self.client, &a.table_name, &a.col_name).await,
                ),
                Err(e) => e,
            },
            "qlty_columnSummary" => match parse_args::<TableArgs>(args) {
                Ok(a) => to_result(quality::column_summary(&self.client, &a.table_name).await),
                Err(e) => e,
            },
            "qlty_univariateStatistics" => match parse_args::<TableColArgs>(args) {
                Ok(a) => to_result(
                    quality::univariate_statistics(&self.client, &a.table_name, &a.col_name).await,
                ),
                Err(e) => e,
            },
            "qlty_rowsWithMissingValues" => match parse_args::<TableColArgs>(args) {
                Ok(a) => to_result(
                    quality::rows_with_missing_values(&self.client, &a.table_name, &a.col_name)
                        .await,
                ),
                Err(e) => e,
            },
            "sec_userDbPermissions" => self.handle_user_permissions(args).await,
            "sec_rolePermissions" => self.handle_role_permissions(args).await,
            "sec_userRoles" => self.handle_user_roles(args).await,
            "rag_setConfig" => self.handle_rag_set_config(args).await,
            "rag_storeUserQuery" => self.handle_rag_store_query(args).await,
            "rag_tokenizeQuery" => {
                to_result(rag::tokenize_query(&self.client, &self.rag_state).await)
            }
            "rag_createEmbeddingView" => {
                to_result(rag::create_embedding_view(&self.client, &self.rag_state).await)
            }
            "rag_createQueryEmbeddingTable" => {
                to_result(rag::create_query_embedding_table(&self.client, &self.rag_state).await)
            }
            "rag_semanticSearchChunks" => self.handle_rag_search(args).await,
            _ => self.call_custom_tool(name).await,
        }
    }

    /// Run a custom SQL tool by name
    async fn call_custom_tool(&self, name: &str) -> CallToolResult {
        let Some(custom) = self.custom_tools.iter().find(|t| t.name == name) else {
            return CallToolResult::error(format!("Unknown tool: {}", name));
        };
        to_result(base::read_query(&self.client, &custom.sql).await)
    }

    // ==================== Tool Handlers ====================

    async fn handle_read_query(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            sql: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::read_query(&self.client, &args.sql).await)
    }

    async fn handle_write_query(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            sql: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::write_query(&self.client, &args.sql).await)
    }

    async fn handle_table_ddl(&self, args: Value) -> CallToolResult {
        let args: DbTableArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::table_ddl(&self.client, &args.db_name, &args.table_name).await)
    }

    async fn handle_table_list(&self, args: Value) -> CallToolResult {
        let args: DbArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::table_list(&self.client, &args.db_name).await)
    }

    async fn handle_column_description(&self, args: Value) -> CallToolResult {
        let args: DbObjArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::column_description(&self.client, &args.db_name, &args.obj_name).await)
    }

    async fn handle_table_preview(&self, args: Value) -> CallToolResult {
        let args: DbTableArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::table_preview(&self.client, &args.db_name, &args.table_name).await)
    }

    async fn handle_table_affinity(&self, args: Value) -> CallToolResult {
        let args: DbObjArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::table_affinity(&self.client, &args.db_name, &args.obj_name).await)
    }

    async fn handle_table_usage(&self, args: Value) -> CallToolResult {
        let args: DbArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(base::table_usage(&self.client, &args.db_name).await)
    }

    async fn handle_user_sql_list(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            user_name: String,
            #[serde(default = "default_days")]
            no_days: i64,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::user_sql_list(&self.client, &args.user_name, args.no_days).await)
    }

    async fn handle_table_sql_list(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            table_name: String,
            #[serde(default = "default_days")]
            no_days: i64,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::table_sql_list(&self.client, &args.table_name, args.no_days).await)
    }

    async fn handle_table_space(&self, args: Value) -> CallToolResult {
        let args: DbTableArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::table_space(&self.client, &args.db_name, &args.table_name).await)
    }

    async fn handle_database_space(&self, args: Value) -> CallToolResult {
        let args: DbArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::database_space(&self.client, &args.db_name).await)
    }

    async fn handle_resusage_user_summary(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            user_name: String,
            #[serde(default)]
            date: String,
            #[serde(default, rename = "dayOfWeek")]
            day_of_week: String,
            #[serde(default, rename = "hourOfDay")]
            hour_of_day: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        let filter = ResusageFilter {
            user_name: Some(args.user_name),
            date: Some(args.date),
            day_of_week: Some(args.day_of_week),
            hour_of_day: Some(args.hour_of_day),
        };
        to_result(
            dba::resusage_summary(&self.client, &["UserName", "hourOfDay", "dayOfWeek"], &filter)
                .await,
        )
    }

    async fn handle_table_usage_impact(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            db_name: String,
            #[serde(default)]
            user_name: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::table_usage_impact(&self.client, &args.db_name, &args.user_name).await)
    }

    async fn handle_session_info(&self, args: Value) -> CallToolResult {
        let args: UserArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(dba::session_info(&self.client, &args.user_name).await)
    }

    async fn handle_user_permissions(&self, args: Value) -> CallToolResult {
        let args: UserArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(security::user_db_permissions(&self.client, &args.user_name).await)
    }

    async fn handle_role_permissions(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            role_name: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(security::role_permissions(&self.client, &args.role_name).await)
    }

    async fn handle_user_roles(&self, args: Value) -> CallToolResult {
        let args: UserArgs = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(security::user_roles(&self.client, &args.user_name).await)
    }

    async fn handle_rag_set_config(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            query_db: String,
            model_db: String,
            vector_db: String,
            vector_table: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(
            rag::set_config(
                &self.rag_state,
                &args.query_db,
                &args.model_db,
                &args.vector_db,
                &args.vector_table,
            )
            .await,
        )
    }

    async fn handle_rag_store_query(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            db_name: String,
            table_name: String,
            question: String,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(
            rag::store_user_query(&self.client, &args.db_name, &args.table_name, &args.question)
                .await,
        )
    }

    async fn handle_rag_search(&self, args: Value) -> CallToolResult {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default = "default_top_k")]
            k: u32,
        }
        let args: Args = match serde_json::from_value(args) {
            Ok(a) => a,
            Err(e) => return CallToolResult::error(format!("Invalid arguments: {}", e)),
        };
        to_result(rag::semantic_search_chunks(&self.client, &self.rag_state, args.k).await)
    }
}

fn default_days() -> i64 {
    7
}

fn default_top_k() -> u32 {
    10
}

/// Deserialize tool arguments, mapping failures to a tool-level error
fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, CallToolResult> {
    serde_json::from_value(args)
        .map_err(|e| CallToolResult::error(format!("Invalid arguments: {}", e)))
}

/// Map a handler result into a tool result
fn to_result(result: crate::error::Result<Value>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::json(&value),
        Err(e) => CallToolResult::error(e.to_string()),
    }
}

// Shared argument shapes

#[derive(Deserialize)]
struct DbArgs {
    #[serde(default)]
    db_name: String,
}

#[derive(Deserialize)]
struct DbTableArgs {
    #[serde(default)]
    db_name: String,
    #[serde(default)]
    table_name: String,
}

#[derive(Deserialize)]
struct DbObjArgs {
    #[serde(default)]
    db_name: String,
    #[serde(default)]
    obj_name: String,
}

#[derive(Deserialize)]
struct TableArgs {
    #[serde(default)]
    table_name: String,
}

#[derive(Deserialize)]
struct TableColArgs {
    #[serde(default)]
    table_name: String,
    #[serde(default)]
    col_name: String,
}

#[derive(Deserialize)]
struct UserArgs {
    #[serde(default)]
    user_name: String,
}

// ==================== Schema Definitions ====================

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

fn sql_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "sql": {"type": "string", "description": description}
        },
        "required": ["sql"]
    })
}

fn db_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "db_name": {"type": "string", "description": "Database name"}
        }
    })
}

fn db_table_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "db_name": {"type": "string", "description": "Database name"},
            "table_name": {"type": "string", "description": "Table name"}
        }
    })
}

fn db_obj_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "db_name": {"type": "string", "description": "Database name"},
            "obj_name": {"type": "string", "description": "Table or view name"}
        }
    })
}

fn table_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "table_name": {"type": "string", "description": "Table name, optionally database-qualified"}
        },
        "required": ["table_name"]
    })
}

fn table_col_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "table_name": {"type": "string", "description": "Table name, optionally database-qualified"},
            "col_name": {"type": "string", "description": "Column name"}
        },
        "required": ["table_name", "col_name"]
    })
}

fn user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "user_name": {"type": "string", "description": "User name"}
        }
    })
}

fn role_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "role_name": {"type": "string", "description": "Role name"}
        }
    })
}

fn user_days_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "user_name": {"type": "string", "description": "User name"},
            "no_days": {"type": "number", "description": "Number of days to look back (default: 7)"}
        }
    })
}

fn table_days_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "table_name": {"type": "string", "description": "Table name"},
            "no_days": {"type": "number", "description": "Number of days to look back (default: 7)"}
        }
    })
}

fn resusage_user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "user_name": {"type": "string", "description": "Database user name"},
            "date": {"type": "string", "description": "Date to analyze, formatted as `YYYY-MM-DD`"},
            "dayOfWeek": {"type": "string", "description": "Day of week to analyze"},
            "hourOfDay": {"type": "string", "description": "Hour of day to analyze"}
        }
    })
}

fn db_user_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "db_name": {"type": "string", "description": "Database name"},
            "user_name": {"type": "string", "description": "User name"}
        }
    })
}

fn rag_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query_db": {"type": "string", "description": "Database to store user questions and query embeddings"},
            "model_db": {"type": "string", "description": "Database where the embedding model is stored"},
            "vector_db": {"type": "string", "description": "Database containing the chunk vector store"},
            "vector_table": {"type": "string", "description": "Table containing chunk embeddings for similarity search"}
        },
        "required": ["query_db", "model_db", "vector_db", "vector_table"]
    })
}

fn rag_store_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "db_name": {"type": "string", "description": "Database where the question will be stored"},
            "table_name": {"type": "string", "description": "Table to store user questions"},
            "question": {"type": "string", "description": "Natural language question, optionally starting with '/rag '"}
        },
        "required": ["db_name", "table_name", "question"]
    })
}

fn rag_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "k": {"type": "number", "description": "Number of top matching chunks to retrieve (default: 10)"}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> ToolHandler {
        let uri = crate::config::DatabaseUri::parse("teradata://u:p@host/db").unwrap();
        ToolHandler::new(
            Arc::new(TdClient::new(uri)),
            Arc::new(RagState::new()),
            vec![CustomTool {
                name: "sales_topCustomers".to_string(),
                description: "Top customers.".to_string(),
                sql: "SELECT 1".to_string(),
            }],
        )
    }

    #[test]
    fn test_list_tools_includes_all_groups() {
        let tools = handler().list_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        for expected in [
            "base_readQuery",
            "base_tableAffinity",
            "dba_resusageUserSummary",
            "qlty_univariateStatistics",
            "sec_userRoles",
            "rag_semanticSearchChunks",
            "sales_topCustomers",
        ] {
            assert!(names.contains(&expected), "missing tool {}", expected);
        }
    }

    #[test]
    fn test_schemas_are_objects() {
        for tool in handler().list_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_error() {
        let result = handler().call_tool("no_such_tool", json!({})).await;
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn test_rag_set_config_without_database() {
        // Configuration is held in memory; no database round trip needed.
        let result = handler()
            .call_tool(
                "rag_setConfig",
                json!({
                    "query_db": "q", "model_db": "m",
                    "vector_db": "v", "vector_table": "t"
                }),
            )
            .await;
        assert!(!result.is_error);
    }
}
