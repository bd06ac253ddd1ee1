//! DBA tools
//!
//! Workload, space, and system health tools over the DBC query log and
//! space views.

use serde_json::{json, Value};

use crate::error::Result;
use crate::td::client::TdClient;
use crate::td::types::{sql_quote_literal, tool_response};

/// SQL for statements run by a user (or all users) in the last days
pub fn user_sql_list_sql(user_name: &str, no_days: i64) -> String {
    let user_filter = if user_name.is_empty() {
        String::new()
    } else {
        format!("AND UserName = {} ", sql_quote_literal(user_name))
    };
    format!(
        "SELECT UserName, StartTime, ElapsedTime, AMPCPUTime, TotalIOCount, QueryText \
         FROM DBC.QryLogV \
         WHERE StartTime >= CURRENT_TIMESTAMP - INTERVAL '{no_days}' DAY \
         {user_filter}ORDER BY StartTime DESC"
    )
}

/// SQL for statements touching a table in the last days
pub fn table_sql_list_sql(table_name: &str, no_days: i64) -> String {
    format!(
        "SELECT q.UserName, q.StartTime, q.ElapsedTime, q.AMPCPUTime, q.QueryText \
         FROM DBC.QryLogV q JOIN DBC.DBQLObjTbl o ON q.QueryID = o.QueryID \
         WHERE o.ObjectTableName = {} AND o.ObjectType = 'Tab' \
         AND q.StartTime >= CURRENT_TIMESTAMP - INTERVAL '{}' DAY \
         ORDER BY q.StartTime DESC",
        sql_quote_literal(table_name),
        no_days
    )
}

/// SQL for table space, by table or for a whole database
pub fn table_space_sql(db_name: &str, table_name: &str) -> String {
    let mut filters = String::new();
    if !db_name.is_empty() {
        filters.push_str(&format!("AND DatabaseName = {} ", sql_quote_literal(db_name)));
    }
    if !table_name.is_empty() {
        filters.push_str(&format!("AND TableName = {} ", sql_quote_literal(table_name)));
    }
    format!(
        "SELECT DatabaseName, TableName, SUM(CurrentPerm) AS CurrentPerm, \
         SUM(PeakPerm) AS PeakPerm \
         FROM DBC.TableSizeV WHERE 1=1 {filters}\
         GROUP BY 1, 2 ORDER BY CurrentPerm DESC"
    )
}

/// SQL for database space allocations
pub fn database_space_sql(db_name: &str) -> String {
    let filter = if db_name.is_empty() {
        String::new()
    } else {
        format!("AND DatabaseName = {} ", sql_quote_literal(db_name))
    };
    format!(
        "SELECT DatabaseName, SUM(MaxPerm) AS MaxPerm, SUM(CurrentPerm) AS CurrentPerm, \
         CAST(SUM(CurrentPerm) * 100.0 / NULLIFZERO(SUM(MaxPerm)) AS DECIMAL(5,1)) AS PercentUsed \
         FROM DBC.DiskSpaceV WHERE 1=1 {filter}\
         GROUP BY 1 ORDER BY PercentUsed DESC"
    )
}

/// SQL for database version information
pub fn database_version_sql() -> String {
    "SELECT InfoKey, InfoData FROM DBC.DBCInfoV".to_string()
}

/// Whitelisted dimensions of the resource usage summary
const RESUSAGE_DIMENSIONS: &[(&str, &str)] = &[
    ("UserName", "UserName"),
    ("hourOfDay", "EXTRACT(HOUR FROM StartTime)"),
    ("dayOfWeek", "TRIM(TD_DAY_OF_WEEK(CAST(StartTime AS DATE)))"),
    ("workloadType", "StatementType"),
    (
        "queryComplexity",
        "CASE WHEN AMPCPUTime < 1 THEN 'simple' WHEN AMPCPUTime < 60 THEN 'medium' ELSE 'complex' END",
    ),
];

/// Optional equality filters on the resource usage summary
#[derive(Debug, Default, Clone)]
pub struct ResusageFilter {
    pub user_name: Option<String>,
    pub date: Option<String>,
    pub day_of_week: Option<String>,
    pub hour_of_day: Option<String>,
}

/// SQL summarizing system usage along the given dimensions
///
/// Unknown dimension names are ignored rather than interpolated.
pub fn resusage_summary_sql(dimensions: &[&str], filter: &ResusageFilter) -> String {
    let selected: Vec<(&str, &str)> = RESUSAGE_DIMENSIONS
        .iter()
        .filter(|(name, _)| dimensions.contains(name))
        .copied()
        .collect();

    let select_list: Vec<String> = selected
        .iter()
        .map(|(name, expr)| format!("{expr} AS {name}"))
        .collect();
    let group_by: Vec<String> = (1..=selected.len()).map(|i| i.to_string()).collect();

    let mut filters = String::new();
    if let Some(user) = filter.user_name.as_deref().filter(|u| !u.is_empty()) {
        filters.push_str(&format!("AND UserName = {} ", sql_quote_literal(user)));
    }
    if let Some(date) = filter.date.as_deref().filter(|d| !d.is_empty()) {
        filters.push_str(&format!(
            "AND CAST(StartTime AS DATE) = DATE {} ",
            sql_quote_literal(date)
        ));
    }
    if let Some(day) = filter.day_of_week.as_deref().filter(|d| !d.is_empty()) {
        filters.push_str(&format!(
            "AND TRIM(TD_DAY_OF_WEEK(CAST(StartTime AS DATE))) = {} ",
            sql_quote_literal(day)
        ));
    }
    if let Some(hour) = filter
        .hour_of_day
        .as_deref()
        .and_then(|h| h.trim().parse::<u8>().ok())
    {
        filters.push_str(&format!("AND EXTRACT(HOUR FROM StartTime) = {hour} "));
    }

    format!(
        "SELECT {}, COUNT(*) AS QueryCount, SUM(AMPCPUTime) AS TotalCPUTime, \
         SUM(TotalIOCount) AS TotalIO, AVG(ElapsedTime) AS AvgElapsed \
         FROM DBC.QryLogV \
         WHERE StartTime >= CURRENT_TIMESTAMP - INTERVAL '30' DAY {}\
         GROUP BY {} ORDER BY {}",
        select_list.join(", "),
        filters,
        group_by.join(", "),
        group_by.join(", ")
    )
}

/// SQL for flow control metrics
pub fn flow_control_sql() -> String {
    "SELECT TheDate, TheTime, FlowCtlTime, FlowControlled \
     FROM DBC.ResUsageSpma \
     WHERE TheDate >= CURRENT_DATE - 7 ORDER BY TheDate DESC, TheTime DESC"
        .to_string()
}

/// SQL for feature usage metrics by user
pub fn feature_usage_sql() -> String {
    "SELECT q.UserName, f.FeatureName, COUNT(*) AS UseCount \
     FROM DBC.QryLogV q JOIN DBC.QryLogFeatureListV f ON q.QueryID = f.QueryID \
     WHERE q.StartTime >= CURRENT_TIMESTAMP - INTERVAL '30' DAY \
     GROUP BY 1, 2 ORDER BY UseCount DESC"
        .to_string()
}

/// SQL for workload delay metrics
pub fn user_delay_sql() -> String {
    "SELECT UserName, COUNT(*) AS DelayedQueries, AVG(DelayTime) AS AvgDelay, \
     MAX(DelayTime) AS MaxDelay \
     FROM DBC.QryLogV WHERE DelayTime > 0 \
     AND StartTime >= CURRENT_TIMESTAMP - INTERVAL '7' DAY \
     GROUP BY 1 ORDER BY AvgDelay DESC"
        .to_string()
}

/// SQL measuring which tables and users drive resource usage
pub fn table_usage_impact_sql(db_name: &str, user_name: &str) -> String {
    let mut filters = String::new();
    if !db_name.is_empty() {
        filters.push_str(&format!(
            "AND o.ObjectDatabaseName = {} ",
            sql_quote_literal(db_name)
        ));
    }
    if !user_name.is_empty() {
        filters.push_str(&format!("AND q.UserName = {} ", sql_quote_literal(user_name)));
    }
    format!(
        "SELECT o.ObjectDatabaseName AS DatabaseName, o.ObjectTableName AS TableName, \
         q.UserName, COUNT(*) AS QueryCount, SUM(q.AMPCPUTime) AS TotalCPUTime \
         FROM DBC.DBQLObjTbl o JOIN DBC.QryLogV q ON o.QueryID = q.QueryID \
         WHERE o.ObjectType = 'Tab' \
         AND q.StartTime >= CURRENT_TIMESTAMP - INTERVAL '30' DAY {filters}\
         GROUP BY 1, 2, 3 ORDER BY TotalCPUTime DESC"
    )
}

/// SQL for active session information
pub fn session_info_sql(user_name: &str) -> String {
    let filter = if user_name.is_empty() {
        String::new()
    } else {
        format!("WHERE UserName = {} ", sql_quote_literal(user_name))
    };
    format!(
        "SELECT UserName, SessionNo, LogonDate, LogonTime, LogonSource, CurrentRole \
         FROM DBC.SessionInfoV {filter}ORDER BY LogonDate DESC, LogonTime DESC"
    )
}

async fn run(client: &TdClient, sql: &str, tool_name: &str) -> Result<Value> {
    let result = client.execute(sql).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": tool_name})),
    ))
}

/// SQL run by a user (or everyone) over the last days
pub async fn user_sql_list(client: &TdClient, user_name: &str, no_days: i64) -> Result<Value> {
    run(client, &user_sql_list_sql(user_name, no_days), "dba_userSqlList").await
}

/// SQL run against a table over the last days
pub async fn table_sql_list(client: &TdClient, table_name: &str, no_days: i64) -> Result<Value> {
    run(client, &table_sql_list_sql(table_name, no_days), "dba_tableSqlList").await
}

/// Space used by a table, or by all tables of a database
pub async fn table_space(client: &TdClient, db_name: &str, table_name: &str) -> Result<Value> {
    run(client, &table_space_sql(db_name, table_name), "dba_tableSpace").await
}

/// Database space allocation and fill level
pub async fn database_space(client: &TdClient, db_name: &str) -> Result<Value> {
    run(client, &database_space_sql(db_name), "dba_databaseSpace").await
}

/// Database version information
pub async fn database_version(client: &TdClient) -> Result<Value> {
    run(client, &database_version_sql(), "dba_databaseVersion").await
}

/// System usage summary along the given dimensions
pub async fn resusage_summary(
    client: &TdClient,
    dimensions: &[&str],
    filter: &ResusageFilter,
) -> Result<Value> {
    run(
        client,
        &resusage_summary_sql(dimensions, filter),
        "dba_resusageSummary",
    )
    .await
}

/// Flow control metrics of the last week
pub async fn flow_control(client: &TdClient) -> Result<Value> {
    run(client, &flow_control_sql(), "dba_flowControl").await
}

/// Feature usage metrics by user
pub async fn feature_usage(client: &TdClient) -> Result<Value> {
    run(client, &feature_usage_sql(), "dba_featureUsage").await
}

/// Workload delay metrics
pub async fn user_delay(client: &TdClient) -> Result<Value> {
    run(client, &user_delay_sql(), "dba_userDelay").await
}

/// Resource impact of tables and users
pub async fn table_usage_impact(
    client: &TdClient,
    db_name: &str,
    user_name: &str,
) -> Result<Value> {
    run(
        client,
        &table_usage_impact_sql(db_name, user_name),
        "dba_tableUsageImpact",
    )
    .await
}

/// Session information, optionally for one user
pub async fn session_info(client: &TdClient, user_name: &str) -> Result<Value> {
    run(client, &session_info_sql(user_name), "dba_sessionInfo").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_sql_list_all_users() {
        let sql = user_sql_list_sql("", 7);
        assert!(!sql.contains("UserName ="));
        assert!(sql.contains("INTERVAL '7' DAY"));
    }

    #[test]
    fn test_user_sql_list_single_user() {
        let sql = user_sql_list_sql("etl_svc", 14);
        assert!(sql.contains("UserName = 'etl_svc'"));
        assert!(sql.contains("INTERVAL '14' DAY"));
    }

    #[test]
    fn test_table_space_filters_compose() {
        let both = table_space_sql("fin", "ledger");
        assert!(both.contains("DatabaseName = 'fin'"));
        assert!(both.contains("TableName = 'ledger'"));

        let db_only = table_space_sql("fin", "");
        assert!(!db_only.contains("TableName ="));
    }

    #[test]
    fn test_resusage_summary_dimensions() {
        let sql = resusage_summary_sql(&["hourOfDay", "dayOfWeek"], &ResusageFilter::default());
        assert!(sql.contains("AS hourOfDay"));
        assert!(sql.contains("AS dayOfWeek"));
        assert!(sql.contains("GROUP BY 1, 2"));
    }

    #[test]
    fn test_resusage_summary_ignores_unknown_dimension() {
        let sql = resusage_summary_sql(
            &["hourOfDay", "; DROP TABLE x"],
            &ResusageFilter::default(),
        );
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("GROUP BY 1 "));
    }

    #[test]
    fn test_resusage_user_filters() {
        let filter = ResusageFilter {
            user_name: Some("alice".to_string()),
            date: Some("2025-06-01".to_string()),
            ..Default::default()
        };
        let sql = resusage_summary_sql(&["UserName", "hourOfDay"], &filter);
        assert!(sql.contains("UserName = 'alice'"));
        assert!(sql.contains("DATE '2025-06-01'"));
    }

    #[test]
    fn test_session_info_optional_user() {
        assert!(!session_info_sql("").contains("WHERE"));
        assert!(session_info_sql("bob").contains("UserName = 'bob'"));
    }
}
