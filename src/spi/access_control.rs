use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AccessControlError;

use super::types::{
    CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName, FunctionKind, Identity,
    Privilege, SchemaFunctionName, SchemaTableName, SystemSecurityContext, TrinoPrincipal,
};

/// The access control capability set of the host engine.
///
/// Each `check_can_*` callback either returns `Ok(())` or fails with the
/// denial kind specific to that operation (or with a bridge-level error
/// when no verdict could be obtained). The `can_*` callbacks report the
/// verdict as a boolean instead of failing. The `filter_*` callbacks
/// reduce a candidate collection to its authorized subset; an empty input
/// always produces an empty output without any policy traffic.
#[async_trait]
pub trait SystemAccessControl: Send + Sync {
    async fn check_can_impersonate_user(
        &self,
        context: &SystemSecurityContext,
        user_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn check_can_execute_query(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_view_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owner: &Identity,
    ) -> Result<(), AccessControlError>;

    /// Unlike the set-valued filters, the host keeps query owners as an
    /// ordered collection; membership is still the only guarantee.
    async fn filter_view_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owners: Vec<Identity>,
    ) -> Result<Vec<Identity>, AccessControlError>;

    async fn check_can_kill_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owner: &Identity,
    ) -> Result<(), AccessControlError>;

    async fn check_can_read_system_information(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_write_system_information(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_system_session_property(
        &self,
        context: &SystemSecurityContext,
        property_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn can_access_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<bool, AccessControlError>;

    async fn check_can_create_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn filter_catalogs(
        &self,
        context: &SystemSecurityContext,
        catalogs: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError>;

    async fn check_can_create_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_rename_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        new_schema_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_schema_authorization(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_schemas(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn filter_schemas(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        schema_names: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError>;

    async fn check_can_show_create_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_create_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_create_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_rename_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        new_table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_table_properties(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_table_comment(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_view_comment(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_column_comment(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_tables(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError>;

    async fn filter_tables(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        table_names: HashSet<SchemaTableName>,
    ) -> Result<HashSet<SchemaTableName>, AccessControlError>;

    async fn check_can_show_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn filter_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError>;

    async fn check_can_add_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_alter_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_rename_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_table_authorization(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError>;

    async fn check_can_select_from_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: &HashSet<String>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_insert_into_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_delete_from_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_truncate_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_update_table_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        updated_columns: &HashSet<String>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_create_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_rename_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
        new_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_view_authorization(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_create_view_with_select_from_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: &HashSet<String>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_create_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_refresh_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_materialized_view_properties(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_rename_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        new_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_grant_execute_function_privilege(
        &self,
        context: &SystemSecurityContext,
        function_name: &str,
        grantee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError>;

    async fn check_can_set_catalog_session_property(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        property_name: &str,
    ) -> Result<(), AccessControlError>;

    async fn check_can_grant_schema_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        grantee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError>;

    async fn check_can_deny_schema_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        grantee: &TrinoPrincipal,
    ) -> Result<(), AccessControlError>;

    async fn check_can_revoke_schema_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        revokee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError>;

    async fn check_can_grant_table_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        grantee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError>;

    async fn check_can_deny_table_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        grantee: &TrinoPrincipal,
    ) -> Result<(), AccessControlError>;

    async fn check_can_revoke_table_privilege(
        &self,
        context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        revokee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_roles(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_create_role(
        &self,
        context: &SystemSecurityContext,
        role: &str,
        grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_role(
        &self,
        context: &SystemSecurityContext,
        role: &str,
    ) -> Result<(), AccessControlError>;

    async fn check_can_grant_roles(
        &self,
        context: &SystemSecurityContext,
        roles: &HashSet<String>,
        grantees: &HashSet<TrinoPrincipal>,
        admin_option: bool,
        grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_revoke_roles(
        &self,
        context: &SystemSecurityContext,
        roles: &HashSet<String>,
        grantees: &HashSet<TrinoPrincipal>,
        admin_option: bool,
        grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_role_authorization_descriptors(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_current_roles(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_role_grants(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError>;

    async fn check_can_execute_procedure(
        &self,
        context: &SystemSecurityContext,
        procedure: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError>;

    /// `kind` is the function flavor when the engine reports one; it is
    /// embedded in the resource so policies can dispatch on it.
    async fn can_execute_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
        kind: Option<FunctionKind>,
    ) -> Result<bool, AccessControlError>;

    async fn can_create_view_with_execute_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<bool, AccessControlError>;

    async fn check_can_create_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_drop_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError>;

    async fn check_can_show_functions(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError>;

    async fn filter_functions(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        function_names: HashSet<SchemaFunctionName>,
    ) -> Result<HashSet<SchemaFunctionName>, AccessControlError>;

    async fn check_can_execute_table_procedure(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        procedure: &str,
    ) -> Result<(), AccessControlError>;
}
