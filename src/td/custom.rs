//! Custom tool and prompt definitions
//!
//! Site-specific tools are declared as SQL in `*_tools.toml` files and
//! loaded at startup:
//!
//! ```toml
//! [[tool]]
//! name = "sales_topCustomers"
//! description = "Top customers by revenue this quarter."
//! sql = "SELECT ..."
//!
//! [[prompt]]
//! name = "sales_review"
//! description = "Quarterly sales review."
//! prompt = "Summarize ..."
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result, ServerError};

/// A SQL-backed tool definition
#[derive(Debug, Clone, Deserialize)]
pub struct CustomTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sql: String,
}

/// A static prompt definition
#[derive(Debug, Clone, Deserialize)]
pub struct CustomPrompt {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub prompt: String,
}

/// All definitions loaded from the custom tool files
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomDefinitions {
    #[serde(default, rename = "tool")]
    pub tools: Vec<CustomTool>,

    #[serde(default, rename = "prompt")]
    pub prompts: Vec<CustomPrompt>,
}

impl CustomDefinitions {
    /// Parse one definition file's content
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load and merge every `*_tools.toml` file in a directory
    ///
    /// A directory without definition files yields an empty set; a file
    /// that fails to parse fails startup.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut merged = CustomDefinitions::default();

        let entries = match std::fs::read_dir(dir.as_ref()) {
            Ok(entries) => entries,
            Err(_) => return Ok(merged),
        };

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with("_tools.toml"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let defs = Self::parse(&content).map_err(|e| {
                ServerError::Config(ConfigError::InvalidToolFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            })?;
            tracing::info!(
                "Loaded {} custom tools and {} prompts from {}",
                defs.tools.len(),
                defs.prompts.len(),
                path.display()
            );
            merged.tools.extend(defs.tools);
            merged.prompts.extend(defs.prompts);
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tools_and_prompts() {
        let content = r#"
            [[tool]]
            name = "sales_topCustomers"
            description = "Top customers by revenue."
            sql = "SELECT TOP 10 customer_id FROM sales.orders"

            [[tool]]
            name = "sales_openOrders"
            sql = "SELECT * FROM sales.orders WHERE status = 'open'"

            [[prompt]]
            name = "sales_review"
            description = "Quarterly review."
            prompt = "Summarize the quarter."
        "#;

        let defs = CustomDefinitions::parse(content).unwrap();
        assert_eq!(defs.tools.len(), 2);
        assert_eq!(defs.prompts.len(), 1);
        assert_eq!(defs.tools[0].name, "sales_topCustomers");
        assert_eq!(defs.tools[1].description, "");
        assert_eq!(defs.prompts[0].prompt, "Summarize the quarter.");
    }

    #[test]
    fn test_parse_empty_file() {
        let defs = CustomDefinitions::parse("").unwrap();
        assert!(defs.tools.is_empty());
        assert!(defs.prompts.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_sql() {
        let content = r#"
            [[tool]]
            name = "broken"
        "#;
        assert!(CustomDefinitions::parse(content).is_err());
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let defs = CustomDefinitions::load_dir("/nonexistent/path").unwrap();
        assert!(defs.tools.is_empty());
    }
}
