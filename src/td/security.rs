//! Security tools
//!
//! Permission and role lookups over the DBC rights views.

use serde_json::{json, Value};

use crate::error::Result;
use crate::td::client::TdClient;
use crate::td::types::{sql_quote_literal, tool_response};

/// SQL for the database permissions granted to a user
pub fn user_db_permissions_sql(user_name: &str) -> String {
    format!(
        "SELECT DatabaseName, TableName, AccessRight, GrantAuthority, GrantorName \
         FROM DBC.AllRightsV WHERE UserName = {} \
         ORDER BY DatabaseName, TableName, AccessRight",
        sql_quote_literal(user_name)
    )
}

/// SQL for the permissions granted to a role
pub fn role_permissions_sql(role_name: &str) -> String {
    format!(
        "SELECT DatabaseName, TableName, AccessRight, GrantorName \
         FROM DBC.AllRoleRightsV WHERE RoleName = {} \
         ORDER BY DatabaseName, TableName, AccessRight",
        sql_quote_literal(role_name)
    )
}

/// SQL for the roles assigned to a user
pub fn user_roles_sql(user_name: &str) -> String {
    format!(
        "SELECT RoleName, Grantor, DefaultRole, WithAdmin \
         FROM DBC.RoleMembersV WHERE Grantee = {} ORDER BY RoleName",
        sql_quote_literal(user_name)
    )
}

/// Permissions held by a user
pub async fn user_db_permissions(client: &TdClient, user_name: &str) -> Result<Value> {
    let result = client.execute(&user_db_permissions_sql(user_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "sec_userDbPermissions", "user": user_name})),
    ))
}

/// Permissions granted to a role
pub async fn role_permissions(client: &TdClient, role_name: &str) -> Result<Value> {
    let result = client.execute(&role_permissions_sql(role_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "sec_rolePermissions", "role": role_name})),
    ))
}

/// Roles assigned to a user
pub async fn user_roles(client: &TdClient, user_name: &str) -> Result<Value> {
    let result = client.execute(&user_roles_sql(user_name)).await?;
    Ok(tool_response(
        result.rows_json(),
        Some(json!({"tool_name": "sec_userRoles", "user": user_name})),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_sql_quotes_user() {
        let sql = user_db_permissions_sql("app_user");
        assert!(sql.contains("UserName = 'app_user'"));
        assert!(sql.contains("DBC.AllRightsV"));
    }

    #[test]
    fn test_role_sql_targets_role_views() {
        assert!(role_permissions_sql("analyst").contains("DBC.AllRoleRightsV"));
        assert!(user_roles_sql("bob").contains("DBC.RoleMembersV"));
    }
}
