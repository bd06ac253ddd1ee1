//! MCP prompt definitions and handlers
//!
//! Built-in prompts are templates with `{name}` placeholders filled from the
//! request arguments. Custom prompts loaded from tool files take no
//! arguments and return their text verbatim.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{McpError, Result, ServerError};
use crate::mcp::types::{GetPromptResult, Prompt, PromptArgument, PromptMessage};
use crate::td::custom::CustomPrompt;

struct PromptDef {
    name: &'static str,
    description: &'static str,
    arguments: &'static [(&'static str, &'static str)],
    template: &'static str,
}

const BASE_QUERY: &str = "\
You are a Teradata SQL expert. Write a SQL query that answers the following request:

{qry}

Before writing the query, use the base_databaseList and base_tableList tools to find the \
relevant tables, then base_columnDescription to confirm column names and types. \
Use only objects that exist in the database. Return the final SQL and run it with \
base_readQuery, then summarize the result for the user.";

const BASE_TABLE_BUSINESS_DESC: &str = "\
Create a business description for the table {database_name}.{table_name}.

Steps:
1. Use base_columnDescription to get the columns of {database_name}.{table_name}.
2. Use base_tablePreview to sample the data.
3. Write a concise business description of the table, followed by a one line \
business description of every column.
Do not speculate beyond what the data supports.";

const BASE_DATABASE_BUSINESS_DESC: &str = "\
Create a business description for the database {database_name}.

Steps:
1. Use base_tableList to list the objects in {database_name}.
2. For each table, use base_columnDescription to understand its structure.
3. Write a short business description of the database as a whole, followed by a \
one line description of each table.";

const DBA_DATABASE_HEALTH_ASSESSMENT: &str = "\
Create a database health assessment for this Teradata system.

Work through the following areas, using one tool call per step, and collect results \
as you go:
1. dba_databaseVersion for system version information.
2. dba_databaseSpace for space allocation and highlight databases over 80% used.
3. dba_resusageSummary for system usage patterns by day and hour.
4. dba_flowControl for flow control events.
5. dba_featureUsage for feature usage by user.
6. dba_userDelay for delayed workloads.

Produce a report with an executive summary, a findings section per area, and a \
prioritized list of recommendations.";

const DBA_USER_ACTIVITY_ANALYSIS: &str = "\
Create a user activity analysis for this Teradata system.

Steps:
1. Use dba_resusageUserSummary to find the users consuming the most resources.
2. For the top users, use dba_userSqlList to review their recent SQL.
3. Use dba_sessionInfo to check their current sessions.
4. Use dba_userDelay to see if any of them are being delayed.

Summarize who is driving the workload, what they are doing, and whether any \
behavior deserves follow-up.";

const DBA_TABLE_ARCHIVE: &str = "\
Create a table archive strategy for this Teradata system.

Steps:
1. Use dba_tableSpace to find the largest tables per database.
2. Use dba_tableSqlList on each large table to determine when it was last used.
3. Classify each table as active, cold, or archivable based on size and recency.

Produce a table listing each candidate with its size, last access, and the \
recommended action.";

const DBA_DATABASE_LINEAGE: &str = "\
Create a database lineage map for tables in the {database_name} database, looking \
back {number_days} days.

Steps:
1. Use base_tableList to enumerate the tables in {database_name}.
2. For each table, use dba_tableSqlList with no_days={number_days} to collect the \
SQL that reads or writes it.
3. From the SQL, identify source tables feeding each table and targets it feeds.

Present the lineage as a list of edges in the form source -> target, grouped by \
target table, and note tables with no observed activity.";

const DBA_TABLE_DROP_IMPACT: &str = "\
Assess the impact of dropping the table {database_name}.{table_name}, looking back \
{number_days} days.

Steps:
1. Use dba_tableSqlList with table_name={table_name} and no_days={number_days} to \
find SQL referencing the table.
2. Use base_tableAffinity to find objects commonly used together with it.
3. Use dba_tableUsageImpact to identify the users depending on it.

Report who and what would break if the table were dropped, and conclude with a \
clear drop / do-not-drop recommendation.";

const QLTY_DATABASE_QUALITY: &str = "\
Assess the data quality of the {database_name} database.

Steps:
1. Use base_tableList to enumerate the tables in {database_name}.
2. For each table, use qlty_columnSummary to get summary statistics.
3. Use qlty_missingValues to find columns with missing values.
4. Use qlty_negativeValues to find numeric columns with negative values and judge \
whether negatives are plausible for that column.

Produce a quality report per table with an overall quality grade for the database.";

const RAG_GUIDELINES: &str = "\
Follow this workflow whenever the user asks a question starting with '/rag':

1. Call rag_setConfig once per session before any other rag tool.
2. Call rag_storeUserQuery with the user's question.
3. Call rag_tokenizeQuery, then rag_createEmbeddingView, then \
rag_createQueryEmbeddingTable, in that order.
4. Call rag_semanticSearchChunks to retrieve the most relevant chunks.
5. Answer the user's question using only the retrieved chunks. If the chunks do \
not contain the answer, say so rather than guessing.

Never skip a step and never reorder them.";

const BUILTIN_PROMPTS: &[PromptDef] = &[
    PromptDef {
        name: "base_query",
        description: "Create a SQL query against the database.",
        arguments: &[("qry", "The business question to answer with SQL")],
        template: BASE_QUERY,
    },
    PromptDef {
        name: "base_tableBusinessDesc",
        description: "Create a business description of the table and columns.",
        arguments: &[
            ("database_name", "Database name"),
            ("table_name", "Table name"),
        ],
        template: BASE_TABLE_BUSINESS_DESC,
    },
    PromptDef {
        name: "base_databaseBusinessDesc",
        description: "Create a business description of the database.",
        arguments: &[("database_name", "Database name")],
        template: BASE_DATABASE_BUSINESS_DESC,
    },
    PromptDef {
        name: "dba_databaseHealthAssessment",
        description: "Create a database health assessment for a Teradata system.",
        arguments: &[],
        template: DBA_DATABASE_HEALTH_ASSESSMENT,
    },
    PromptDef {
        name: "dba_userActivityAnalysis",
        description: "Create a user activity analysis for a Teradata system.",
        arguments: &[],
        template: DBA_USER_ACTIVITY_ANALYSIS,
    },
    PromptDef {
        name: "dba_tableArchive",
        description: "Create a table archive strategy for database tables.",
        arguments: &[],
        template: DBA_TABLE_ARCHIVE,
    },
    PromptDef {
        name: "dba_databaseLineage",
        description: "Create a database lineage map for tables in a database.",
        arguments: &[
            ("database_name", "Database name"),
            ("number_days", "Number of days of history to analyze"),
        ],
        template: DBA_DATABASE_LINEAGE,
    },
    PromptDef {
        name: "dba_tableDropImpact",
        description: "Assess the impact of dropping a table.",
        arguments: &[
            ("database_name", "Database name"),
            ("table_name", "Table name"),
            ("number_days", "Number of days of history to analyze"),
        ],
        template: DBA_TABLE_DROP_IMPACT,
    },
    PromptDef {
        name: "qlty_databaseQuality",
        description: "Assess the data quality of a database.",
        arguments: &[("database_name", "Database name")],
        template: QLTY_DATABASE_QUALITY,
    },
    PromptDef {
        name: "rag_guidelines",
        description: "Guidelines for answering questions with the RAG workflow.",
        arguments: &[],
        template: RAG_GUIDELINES,
    },
];

/// Fill `{name}` placeholders from the given arguments
fn render_template(template: &str, args: &HashMap<String, String>) -> String {
    let mut text = template.to_string();
    for (key, value) in args {
        text = text.replace(&format!("{{{}}}", key), value);
    }
    text
}

/// Prompt handler
pub struct PromptHandler {
    custom_prompts: Vec<CustomPrompt>,
}

impl PromptHandler {
    /// Create a new prompt handler
    pub fn new(custom_prompts: Vec<CustomPrompt>) -> Self {
        Self { custom_prompts }
    }

    /// List all available prompts
    pub fn list_prompts(&self) -> Vec<Prompt> {
        let mut prompts: Vec<Prompt> = BUILTIN_PROMPTS
            .iter()
            .map(|def| Prompt {
                name: def.name.to_string(),
                description: Some(def.description.to_string()),
                arguments: def
                    .arguments
                    .iter()
                    .map(|(name, description)| PromptArgument {
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        required: true,
                    })
                    .collect(),
            })
            .collect();

        for custom in &self.custom_prompts {
            prompts.push(Prompt {
                name: custom.name.clone(),
                description: Some(custom.description.clone()),
                arguments: Vec::new(),
            });
        }

        prompts
    }

    /// Render a prompt by name
    pub fn get_prompt(&self, name: &str, arguments: Option<&Map<String, Value>>) -> Result<GetPromptResult> {
        if let Some(def) = BUILTIN_PROMPTS.iter().find(|d| d.name == name) {
            let mut args = HashMap::new();
            for (arg_name, _) in def.arguments {
                let value = arguments
                    .and_then(|a| a.get(*arg_name))
                    .ok_or_else(|| {
                        ServerError::Mcp(McpError::MissingPromptArgument {
                            name: arg_name.to_string(),
                        })
                    })?;
                // Numbers arrive as JSON numbers from some clients.
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                args.insert(arg_name.to_string(), text);
            }
            return Ok(GetPromptResult {
                description: Some(def.description.to_string()),
                messages: vec![PromptMessage::user(render_template(def.template, &args))],
            });
        }

        if let Some(custom) = self.custom_prompts.iter().find(|p| p.name == name) {
            return Ok(GetPromptResult {
                description: Some(custom.description.clone()),
                messages: vec![PromptMessage::user(custom.prompt.clone())],
            });
        }

        Err(ServerError::Mcp(McpError::UnknownPrompt {
            name: name.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler() -> PromptHandler {
        PromptHandler::new(vec![CustomPrompt {
            name: "sales_monthlyReport".to_string(),
            description: "Monthly sales report.".to_string(),
            prompt: "Summarize last month's sales.".to_string(),
        }])
    }

    #[test]
    fn test_list_prompts_includes_builtin_and_custom() {
        let prompts = handler().list_prompts();
        let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"base_query"));
        assert!(names.contains(&"rag_guidelines"));
        assert!(names.contains(&"sales_monthlyReport"));
    }

    #[test]
    fn test_template_substitution() {
        let args = json!({"database_name": "finance", "table_name": "ledger"});
        let result = handler()
            .get_prompt("base_tableBusinessDesc", args.as_object())
            .unwrap();
        let PromptMessage { content, .. } = &result.messages[0];
        let crate::mcp::types::ToolResultContent::Text { text } = content;
        assert!(text.contains("finance.ledger"));
        assert!(!text.contains("{database_name}"));
    }

    #[test]
    fn test_numeric_argument_rendering() {
        let args = json!({"database_name": "finance", "number_days": 30});
        let result = handler()
            .get_prompt("dba_databaseLineage", args.as_object())
            .unwrap();
        let crate::mcp::types::ToolResultContent::Text { text } = &result.messages[0].content;
        assert!(text.contains("back 30 days"));
    }

    #[test]
    fn test_missing_argument_is_error() {
        let err = handler().get_prompt("base_query", None).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Mcp(McpError::MissingPromptArgument { .. })
        ));
    }

    #[test]
    fn test_unknown_prompt() {
        let err = handler().get_prompt("nope", None).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Mcp(McpError::UnknownPrompt { .. })
        ));
    }

    #[test]
    fn test_custom_prompt_verbatim() {
        let result = handler().get_prompt("sales_monthlyReport", None).unwrap();
        let crate::mcp::types::ToolResultContent::Text { text } = &result.messages[0].content;
        assert_eq!(text, "Summarize last month's sales.");
    }
}
