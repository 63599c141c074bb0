use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use super::types::{Privilege, TrinoPrincipal};

/// A denial verdict, carrying the engine's message for the specific
/// operation that was disallowed. Keeping one constructor per callback
/// preserves the engine's diagnostic phrasing ("Cannot drop table x.y.z"
/// rather than a generic "denied").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Access Denied: {message}")]
pub struct AccessDenied {
    message: String,
}

impl AccessDenied {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn deny_impersonate_user(user: &str, target_user: &str) -> Self {
        Self::new(format!("User {user} cannot impersonate user {target_user}"))
    }

    pub fn deny_execute_query() -> Self {
        Self::new("Cannot execute query")
    }

    pub fn deny_view_query() -> Self {
        Self::new("Cannot view query")
    }

    pub fn deny_kill_query() -> Self {
        Self::new("Cannot kill query")
    }

    pub fn deny_read_system_information() -> Self {
        Self::new("Cannot read system information")
    }

    pub fn deny_write_system_information() -> Self {
        Self::new("Cannot write system information")
    }

    pub fn deny_set_system_session_property(property: &str) -> Self {
        Self::new(format!("Cannot set system session property {property}"))
    }

    pub fn deny_create_catalog(catalog: &str) -> Self {
        Self::new(format!("Cannot create catalog {catalog}"))
    }

    pub fn deny_drop_catalog(catalog: &str) -> Self {
        Self::new(format!("Cannot drop catalog {catalog}"))
    }

    pub fn deny_show_schemas() -> Self {
        Self::new("Cannot show schemas")
    }

    pub fn deny_create_schema(schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot create schema {schema}"))
    }

    pub fn deny_drop_schema(schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop schema {schema}"))
    }

    pub fn deny_rename_schema(schema: impl fmt::Display, new_schema_name: &str) -> Self {
        Self::new(format!(
            "Cannot rename schema from {schema} to {new_schema_name}"
        ))
    }

    pub fn deny_set_schema_authorization(
        schema: impl fmt::Display,
        principal: &TrinoPrincipal,
    ) -> Self {
        Self::new(format!(
            "Cannot set authorization for schema {schema} to {principal}"
        ))
    }

    pub fn deny_show_create_schema(schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot show create schema for {schema}"))
    }

    pub fn deny_show_tables(schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot show tables of schema {schema}"))
    }

    pub fn deny_show_functions(schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot show functions of schema {schema}"))
    }

    pub fn deny_show_create_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot show create table for {table}"))
    }

    pub fn deny_create_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot create table {table}"))
    }

    pub fn deny_drop_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop table {table}"))
    }

    pub fn deny_rename_table(table: impl fmt::Display, new_table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot rename table from {table} to {new_table}"))
    }

    pub fn deny_set_table_properties(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot set table properties to {table}"))
    }

    pub fn deny_comment_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot comment table to {table}"))
    }

    pub fn deny_comment_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot comment view to {view}"))
    }

    pub fn deny_comment_column(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot comment column to {table}"))
    }

    pub fn deny_show_columns(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot show columns of table {table}"))
    }

    pub fn deny_add_column(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot add a column to table {table}"))
    }

    pub fn deny_drop_column(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop a column from table {table}"))
    }

    pub fn deny_alter_column(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot alter a column for table {table}"))
    }

    pub fn deny_rename_column(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot rename a column in table {table}"))
    }

    pub fn deny_set_table_authorization(
        table: impl fmt::Display,
        principal: &TrinoPrincipal,
    ) -> Self {
        Self::new(format!(
            "Cannot set authorization for table {table} to {principal}"
        ))
    }

    pub fn deny_select_columns(table: impl fmt::Display, columns: &HashSet<String>) -> Self {
        Self::new(format!(
            "Cannot select from columns {} in table or view {table}",
            sorted_list(columns.iter())
        ))
    }

    pub fn deny_insert_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot insert into table {table}"))
    }

    pub fn deny_delete_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot delete from table {table}"))
    }

    pub fn deny_truncate_table(table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot truncate table {table}"))
    }

    pub fn deny_update_table_columns(
        table: impl fmt::Display,
        columns: &HashSet<String>,
    ) -> Self {
        Self::new(format!(
            "Cannot update columns {} in table {table}",
            sorted_list(columns.iter())
        ))
    }

    pub fn deny_create_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot create view {view}"))
    }

    pub fn deny_rename_view(view: impl fmt::Display, new_view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot rename view from {view} to {new_view}"))
    }

    pub fn deny_set_view_authorization(
        view: impl fmt::Display,
        principal: &TrinoPrincipal,
    ) -> Self {
        Self::new(format!(
            "Cannot set authorization for view {view} to {principal}"
        ))
    }

    pub fn deny_drop_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop view {view}"))
    }

    pub fn deny_create_view_with_select(source: impl fmt::Display, user: &str) -> Self {
        Self::new(format!(
            "View owner {user} cannot create view that selects from {source}"
        ))
    }

    pub fn deny_create_materialized_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot create materialized view {view}"))
    }

    pub fn deny_refresh_materialized_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot refresh materialized view {view}"))
    }

    pub fn deny_set_materialized_view_properties(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot set properties of materialized view {view}"))
    }

    pub fn deny_drop_materialized_view(view: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop materialized view {view}"))
    }

    pub fn deny_rename_materialized_view(
        view: impl fmt::Display,
        new_view: impl fmt::Display,
    ) -> Self {
        Self::new(format!(
            "Cannot rename materialized view from {view} to {new_view}"
        ))
    }

    pub fn deny_grant_execute_function_privilege(
        function: &str,
        grantee: &TrinoPrincipal,
    ) -> Self {
        Self::new(format!(
            "Cannot grant 'EXECUTE' privilege on function {function} to {grantee}"
        ))
    }

    pub fn deny_set_catalog_session_property(property: &str) -> Self {
        Self::new(format!("Cannot set catalog session property {property}"))
    }

    pub fn deny_grant_schema_privilege(privilege: Privilege, schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot grant privilege {privilege} on schema {schema}"))
    }

    pub fn deny_deny_schema_privilege(privilege: Privilege, schema: impl fmt::Display) -> Self {
        Self::new(format!("Cannot deny privilege {privilege} on schema {schema}"))
    }

    pub fn deny_revoke_schema_privilege(privilege: Privilege, schema: impl fmt::Display) -> Self {
        Self::new(format!(
            "Cannot revoke privilege {privilege} on schema {schema}"
        ))
    }

    pub fn deny_grant_table_privilege(privilege: Privilege, table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot grant privilege {privilege} on table {table}"))
    }

    pub fn deny_deny_table_privilege(privilege: Privilege, table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot deny privilege {privilege} on table {table}"))
    }

    pub fn deny_revoke_table_privilege(privilege: Privilege, table: impl fmt::Display) -> Self {
        Self::new(format!("Cannot revoke privilege {privilege} on table {table}"))
    }

    pub fn deny_show_role_authorization_descriptors() -> Self {
        Self::new("Cannot show role authorization descriptors")
    }

    pub fn deny_create_role(role: &str) -> Self {
        Self::new(format!("Cannot create role {role}"))
    }

    pub fn deny_drop_role(role: &str) -> Self {
        Self::new(format!("Cannot drop role {role}"))
    }

    pub fn deny_grant_roles(roles: &HashSet<String>, grantees: &HashSet<TrinoPrincipal>) -> Self {
        Self::new(format!(
            "Cannot grant roles {} to {}",
            sorted_list(roles.iter()),
            sorted_list(grantees.iter())
        ))
    }

    pub fn deny_revoke_roles(roles: &HashSet<String>, grantees: &HashSet<TrinoPrincipal>) -> Self {
        Self::new(format!(
            "Cannot revoke roles {} from {}",
            sorted_list(roles.iter()),
            sorted_list(grantees.iter())
        ))
    }

    pub fn deny_execute_procedure(procedure: impl fmt::Display) -> Self {
        Self::new(format!("Cannot execute procedure {procedure}"))
    }

    pub fn deny_execute_function(function: impl fmt::Display) -> Self {
        Self::new(format!("Cannot execute function {function}"))
    }

    pub fn deny_create_function(function: impl fmt::Display) -> Self {
        Self::new(format!("Cannot create function {function}"))
    }

    pub fn deny_drop_function(function: impl fmt::Display) -> Self {
        Self::new(format!("Cannot drop function {function}"))
    }

    pub fn deny_execute_table_procedure(table: impl fmt::Display, procedure: &str) -> Self {
        Self::new(format!("Cannot execute table procedure {procedure} on {table}"))
    }
}

fn sorted_list<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    let mut rendered: Vec<String> = items.map(|item| item.to_string()).collect();
    rendered.sort_unstable();
    format!("[{}]", rendered.join(", "))
}
