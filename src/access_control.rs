use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use url::Url;

use crate::client::OpaHttpClient;
use crate::config::{ConfigError, OpaConfig};
use crate::errors::{AccessControlError, OpaError};
use crate::schema::{
    Operation, OpaBatchQueryResult, OpaIdentity, OpaQueryContext, OpaQueryInput,
    OpaQueryInputAction, OpaQueryInputGrant, OpaQueryInputResource, OpaQueryResult,
    TrinoSoftwareStack,
};
use crate::spi::{
    AccessDenied, CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName,
    FunctionKind, Identity, Privilege, SchemaFunctionName, SchemaTableName, SystemAccessControl,
    SystemSecurityContext, TrinoPrincipal,
};

/// Version string reported to policies when the engine does not supply one.
pub const UNKNOWN_TRINO_VERSION: &str = "UNKNOWN";

/// Upper bound on in-flight policy requests within a single fan-out
/// filter call. Candidates beyond this are queued, not dropped.
const MAX_CONCURRENT_FILTER_REQUESTS: usize = 16;

/// The bridge's implementation of the engine's access control capability
/// set. One instance serves all callbacks concurrently; the only shared
/// resource is the HTTP client.
///
/// Filtering strategy is decided once at construction: with a batched
/// policy URI configured, filter callbacks submit all candidates in a
/// single request and read back an index list; without one, they fan out
/// one single-decision request per candidate. Non-filter callbacks are
/// identical in both modes.
pub struct OpaAccessControl {
    client: OpaHttpClient,
    policy_uri: Url,
    batched_policy_uri: Option<Url>,
    allow_permission_management: bool,
    software_stack: TrinoSoftwareStack,
}

impl OpaAccessControl {
    pub fn new(config: &OpaConfig, trino_version: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            client: OpaHttpClient::new(config)?,
            policy_uri: config.policy_uri.clone(),
            batched_policy_uri: config.batched_policy_uri.clone(),
            allow_permission_management: config.allow_permission_management,
            software_stack: TrinoSoftwareStack {
                trino_version: trino_version.unwrap_or(UNKNOWN_TRINO_VERSION).to_string(),
            },
        })
    }

    fn build_query_input(
        &self,
        context: &SystemSecurityContext,
        action: OpaQueryInputAction,
    ) -> OpaQueryInput {
        OpaQueryInput {
            context: OpaQueryContext {
                identity: OpaIdentity::from_identity(&context.identity),
                software_stack: self.software_stack.clone(),
            },
            action,
        }
    }

    async fn query_opa(
        &self,
        context: &SystemSecurityContext,
        action: OpaQueryInputAction,
    ) -> Result<bool, OpaError> {
        let input = self.build_query_input(context, action);
        let result: OpaQueryResult = self.client.request(&self.policy_uri, input).await?;
        Ok(result.result.unwrap_or(false))
    }

    async fn query_opa_with_simple_action(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
    ) -> Result<bool, OpaError> {
        self.query_opa(context, OpaQueryInputAction::new(operation)).await
    }

    async fn query_opa_with_simple_resource(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
        resource: OpaQueryInputResource,
    ) -> Result<bool, OpaError> {
        let action = OpaQueryInputAction {
            resource: Some(resource),
            ..OpaQueryInputAction::new(operation)
        };
        self.query_opa(context, action).await
    }

    fn permission_management_verdict(
        &self,
        deny: impl FnOnce() -> AccessDenied,
    ) -> Result<(), AccessControlError> {
        if self.allow_permission_management {
            Ok(())
        } else {
            Err(deny().into())
        }
    }

    /// Reduce `items` to the authorized subset, preserving input order.
    async fn filter_items<T, R>(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
        items: Vec<T>,
        to_resource: R,
    ) -> Result<Vec<T>, AccessControlError>
    where
        T: Send + Sync,
        R: Fn(&T) -> OpaQueryInputResource + Send + Sync,
    {
        if items.is_empty() {
            return Ok(items);
        }
        match &self.batched_policy_uri {
            Some(batch_uri) => {
                let resources = items.iter().map(&to_resource).collect();
                self.batch_filter(context, operation, items, resources, batch_uri).await
            }
            None => self.fan_out_filter(context, operation, items, &to_resource).await,
        }
    }

    async fn fan_out_filter<T, R>(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
        items: Vec<T>,
        to_resource: &R,
    ) -> Result<Vec<T>, AccessControlError>
    where
        T: Send + Sync,
        R: Fn(&T) -> OpaQueryInputResource + Send + Sync,
    {
        let futures: Vec<Pin<Box<dyn Future<Output = Result<(usize, bool), OpaError>> + Send + '_>>> =
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let resource = to_resource(item);
                    Box::pin(self.query_opa_for_index(context, operation, resource, index))
                        as Pin<Box<dyn Future<Output = Result<(usize, bool), OpaError>> + Send + '_>>
                })
                .collect();
        let verdicts: Vec<(usize, bool)> = stream::iter(futures)
            .buffer_unordered(MAX_CONCURRENT_FILTER_REQUESTS)
            .try_collect()
            .await?;

        let mut keep = vec![false; items.len()];
        for (index, allowed) in verdicts {
            keep[index] = allowed;
        }
        Ok(retain_marked(items, keep))
    }

    async fn query_opa_for_index(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
        resource: OpaQueryInputResource,
        index: usize,
    ) -> Result<(usize, bool), OpaError> {
        let allowed = self
            .query_opa_with_simple_resource(context, operation, resource)
            .await?;
        Ok((index, allowed))
    }

    /// One request for the whole candidate list; the response is the list
    /// of authorized indexes into `items`.
    async fn batch_filter<T>(
        &self,
        context: &SystemSecurityContext,
        operation: Operation,
        items: Vec<T>,
        resources: Vec<OpaQueryInputResource>,
        batch_uri: &Url,
    ) -> Result<Vec<T>, AccessControlError> {
        let action = OpaQueryInputAction {
            filter_resources: Some(resources),
            ..OpaQueryInputAction::new(operation)
        };
        let input = self.build_query_input(context, action);
        let result: OpaBatchQueryResult = self.client.request(batch_uri, input).await?;

        let mut keep = vec![false; items.len()];
        for index in result.result.unwrap_or_default() {
            if index >= items.len() {
                return Err(OpaError::DeserializeFailed {
                    reason: format!(
                        "policy returned index {index} out of bounds for {} filtered resources",
                        items.len()
                    ),
                }
                .into());
            }
            keep[index] = true;
        }
        Ok(retain_marked(items, keep))
    }
}

fn retain_marked<T>(items: Vec<T>, keep: Vec<bool>) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}

fn ordered<T: Ord>(items: HashSet<T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort();
    items
}

#[async_trait]
impl SystemAccessControl for OpaAccessControl {
    async fn check_can_impersonate_user(
        &self,
        context: &SystemSecurityContext,
        user_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::user(user_name);
        if self
            .query_opa_with_simple_resource(context, Operation::ImpersonateUser, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_impersonate_user(&context.identity.user, user_name).into())
        }
    }

    async fn check_can_execute_query(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        if self
            .query_opa_with_simple_action(context, Operation::ExecuteQuery)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_execute_query().into())
        }
    }

    async fn check_can_view_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owner: &Identity,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::query_owner(query_owner);
        if self
            .query_opa_with_simple_resource(context, Operation::ViewQueryOwnedBy, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_view_query().into())
        }
    }

    async fn filter_view_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owners: Vec<Identity>,
    ) -> Result<Vec<Identity>, AccessControlError> {
        self.filter_items(
            context,
            Operation::FilterViewQueryOwnedBy,
            query_owners,
            OpaQueryInputResource::query_owner,
        )
        .await
    }

    async fn check_can_kill_query_owned_by(
        &self,
        context: &SystemSecurityContext,
        query_owner: &Identity,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::query_owner(query_owner);
        if self
            .query_opa_with_simple_resource(context, Operation::KillQueryOwnedBy, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_kill_query().into())
        }
    }

    async fn check_can_read_system_information(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        if self
            .query_opa_with_simple_action(context, Operation::ReadSystemInformation)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_read_system_information().into())
        }
    }

    async fn check_can_write_system_information(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        if self
            .query_opa_with_simple_action(context, Operation::WriteSystemInformation)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_write_system_information().into())
        }
    }

    async fn check_can_set_system_session_property(
        &self,
        context: &SystemSecurityContext,
        property_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::system_session_property(property_name);
        if self
            .query_opa_with_simple_resource(context, Operation::SetSystemSessionProperty, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_system_session_property(property_name).into())
        }
    }

    async fn can_access_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<bool, AccessControlError> {
        let resource = OpaQueryInputResource::catalog(catalog_name);
        Ok(self
            .query_opa_with_simple_resource(context, Operation::AccessCatalog, resource)
            .await?)
    }

    async fn check_can_create_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::catalog(catalog_name);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateCatalog, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_catalog(catalog_name).into())
        }
    }

    async fn check_can_drop_catalog(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::catalog(catalog_name);
        if self
            .query_opa_with_simple_resource(context, Operation::DropCatalog, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_catalog(catalog_name).into())
        }
    }

    async fn filter_catalogs(
        &self,
        context: &SystemSecurityContext,
        catalogs: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError> {
        let kept = self
            .filter_items(context, Operation::FilterCatalogs, ordered(catalogs), |catalog| {
                OpaQueryInputResource::catalog(catalog.clone())
            })
            .await?;
        Ok(kept.into_iter().collect())
    }

    async fn check_can_create_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::schema_with_properties(schema, properties);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateSchema, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_schema(schema).into())
        }
    }

    async fn check_can_drop_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::schema(schema);
        if self
            .query_opa_with_simple_resource(context, Operation::DropSchema, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_schema(schema).into())
        }
    }

    async fn check_can_rename_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        new_schema_name: &str,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::schema(schema)),
            target_resource: Some(Box::new(OpaQueryInputResource::schema_in_catalog(
                &schema.catalog_name,
                new_schema_name,
            ))),
            ..OpaQueryInputAction::new(Operation::RenameSchema)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_rename_schema(schema, new_schema_name).into())
        }
    }

    async fn check_can_set_schema_authorization(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::schema(schema)),
            grantee: Some(OpaQueryInputGrant::principal(principal)),
            ..OpaQueryInputAction::new(Operation::SetSchemaAuthorization)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_schema_authorization(schema, principal).into())
        }
    }

    async fn check_can_show_schemas(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::catalog(catalog_name);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowSchemas, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_schemas().into())
        }
    }

    async fn filter_schemas(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        schema_names: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError> {
        let kept = self
            .filter_items(
                context,
                Operation::FilterSchemas,
                ordered(schema_names),
                |schema_name| {
                    OpaQueryInputResource::schema_in_catalog(catalog_name, schema_name.clone())
                },
            )
            .await?;
        Ok(kept.into_iter().collect())
    }

    async fn check_can_show_create_schema(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::schema(schema);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowCreateSchema, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_create_schema(schema).into())
        }
    }

    async fn check_can_show_create_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowCreateTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_create_table(table).into())
        }
    }

    async fn check_can_create_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table_with_properties(table, properties);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_table(table).into())
        }
    }

    async fn check_can_drop_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::DropTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_table(table).into())
        }
    }

    async fn check_can_rename_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        new_table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::table(table)),
            target_resource: Some(Box::new(OpaQueryInputResource::table(new_table))),
            ..OpaQueryInputAction::new(Operation::RenameTable)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_rename_table(table, new_table).into())
        }
    }

    async fn check_can_set_table_properties(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table_with_nullable_properties(table, properties);
        if self
            .query_opa_with_simple_resource(context, Operation::SetTableProperties, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_table_properties(table).into())
        }
    }

    async fn check_can_set_table_comment(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::SetTableComment, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_comment_table(table).into())
        }
    }

    async fn check_can_set_view_comment(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(view);
        if self
            .query_opa_with_simple_resource(context, Operation::SetViewComment, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_comment_view(view).into())
        }
    }

    async fn check_can_set_column_comment(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::SetColumnComment, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_comment_column(table).into())
        }
    }

    async fn check_can_show_tables(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::schema(schema);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowTables, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_tables(schema).into())
        }
    }

    async fn filter_tables(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        table_names: HashSet<SchemaTableName>,
    ) -> Result<HashSet<SchemaTableName>, AccessControlError> {
        let kept = self
            .filter_items(context, Operation::FilterTables, ordered(table_names), |table| {
                OpaQueryInputResource::table_in_catalog(catalog_name, table)
            })
            .await?;
        Ok(kept.into_iter().collect())
    }

    async fn check_can_show_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowColumns, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_columns(table).into())
        }
    }

    async fn filter_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: HashSet<String>,
    ) -> Result<HashSet<String>, AccessControlError> {
        if columns.is_empty() {
            return Ok(columns);
        }
        let columns = ordered(columns);
        let kept = match &self.batched_policy_uri {
            // The one deviation from per-candidate resources: batching
            // sends a single table resource carrying the whole column
            // list, and the returned indexes address that list.
            Some(batch_uri) => {
                let resource = OpaQueryInputResource::table_with_columns(table, columns.clone());
                self.batch_filter(context, Operation::FilterColumns, columns, vec![resource], batch_uri)
                    .await?
            }
            None => {
                self.fan_out_filter(context, Operation::FilterColumns, columns, &|column: &String| {
                    OpaQueryInputResource::table_with_columns(table, vec![column.clone()])
                })
                .await?
            }
        };
        Ok(kept.into_iter().collect())
    }

    async fn check_can_add_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::AddColumn, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_add_column(table).into())
        }
    }

    async fn check_can_drop_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::DropColumn, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_column(table).into())
        }
    }

    async fn check_can_alter_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::AlterColumn, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_alter_column(table).into())
        }
    }

    async fn check_can_rename_column(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::RenameColumn, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_rename_column(table).into())
        }
    }

    async fn check_can_set_table_authorization(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::table(table)),
            grantee: Some(OpaQueryInputGrant::principal(principal)),
            ..OpaQueryInputAction::new(Operation::SetTableAuthorization)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_table_authorization(table, principal).into())
        }
    }

    async fn check_can_select_from_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: &HashSet<String>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table_with_column_set(table, columns);
        if self
            .query_opa_with_simple_resource(context, Operation::SelectFromColumns, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_select_columns(table, columns).into())
        }
    }

    async fn check_can_insert_into_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::InsertIntoTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_insert_table(table).into())
        }
    }

    async fn check_can_delete_from_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::DeleteFromTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_delete_table(table).into())
        }
    }

    async fn check_can_truncate_table(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table(table);
        if self
            .query_opa_with_simple_resource(context, Operation::TruncateTable, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_truncate_table(table).into())
        }
    }

    async fn check_can_update_table_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        updated_columns: &HashSet<String>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table_with_column_set(table, updated_columns);
        if self
            .query_opa_with_simple_resource(context, Operation::UpdateTableColumns, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_update_table_columns(table, updated_columns).into())
        }
    }

    async fn check_can_create_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::view(view);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateView, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_view(view).into())
        }
    }

    async fn check_can_rename_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
        new_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::view(view)),
            target_resource: Some(Box::new(OpaQueryInputResource::view(new_view))),
            ..OpaQueryInputAction::new(Operation::RenameView)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_rename_view(view, new_view).into())
        }
    }

    async fn check_can_set_view_authorization(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
        principal: &TrinoPrincipal,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::view(view)),
            grantee: Some(OpaQueryInputGrant::principal(principal)),
            ..OpaQueryInputAction::new(Operation::SetViewAuthorization)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_view_authorization(view, principal).into())
        }
    }

    async fn check_can_drop_view(
        &self,
        context: &SystemSecurityContext,
        view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::view(view);
        if self
            .query_opa_with_simple_resource(context, Operation::DropView, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_view(view).into())
        }
    }

    async fn check_can_create_view_with_select_from_columns(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        columns: &HashSet<String>,
    ) -> Result<(), AccessControlError> {
        // The selection source is a table, so the resource is not a view.
        let resource = OpaQueryInputResource::table_with_column_set(table, columns);
        if self
            .query_opa_with_simple_resource(
                context,
                Operation::CreateViewWithSelectFromColumns,
                resource,
            )
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_view_with_select(table, &context.identity.user).into())
        }
    }

    async fn check_can_create_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::view_with_properties(materialized_view, properties);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateMaterializedView, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_materialized_view(materialized_view).into())
        }
    }

    async fn check_can_refresh_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::view(materialized_view);
        if self
            .query_opa_with_simple_resource(context, Operation::RefreshMaterializedView, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_refresh_materialized_view(materialized_view).into())
        }
    }

    async fn check_can_set_materialized_view_properties(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Result<(), AccessControlError> {
        let resource =
            OpaQueryInputResource::view_with_nullable_properties(materialized_view, properties);
        if self
            .query_opa_with_simple_resource(
                context,
                Operation::SetMaterializedViewProperties,
                resource,
            )
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_materialized_view_properties(materialized_view).into())
        }
    }

    async fn check_can_drop_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::view(materialized_view);
        if self
            .query_opa_with_simple_resource(context, Operation::DropMaterializedView, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_materialized_view(materialized_view).into())
        }
    }

    async fn check_can_rename_materialized_view(
        &self,
        context: &SystemSecurityContext,
        materialized_view: &CatalogSchemaTableName,
        new_view: &CatalogSchemaTableName,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::view(materialized_view)),
            target_resource: Some(Box::new(OpaQueryInputResource::view(new_view))),
            ..OpaQueryInputAction::new(Operation::RenameMaterializedView)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_rename_materialized_view(materialized_view, new_view).into())
        }
    }

    async fn check_can_grant_execute_function_privilege(
        &self,
        context: &SystemSecurityContext,
        function_name: &str,
        grantee: &TrinoPrincipal,
        grant_option: bool,
    ) -> Result<(), AccessControlError> {
        let action = OpaQueryInputAction {
            resource: Some(OpaQueryInputResource::function_name(function_name)),
            grantee: Some(OpaQueryInputGrant::principal_with_grant_option(
                grantee,
                grant_option,
            )),
            ..OpaQueryInputAction::new(Operation::GrantExecuteFunctionPrivilege)
        };
        if self.query_opa(context, action).await? {
            Ok(())
        } else {
            Err(AccessDenied::deny_grant_execute_function_privilege(function_name, grantee).into())
        }
    }

    async fn check_can_set_catalog_session_property(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        property_name: &str,
    ) -> Result<(), AccessControlError> {
        let resource =
            OpaQueryInputResource::catalog_session_property(catalog_name, property_name);
        if self
            .query_opa_with_simple_resource(context, Operation::SetCatalogSessionProperty, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_set_catalog_session_property(property_name).into())
        }
    }

    async fn check_can_grant_schema_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        _grantee: &TrinoPrincipal,
        _grant_option: bool,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_grant_schema_privilege(privilege, schema)
        })
    }

    async fn check_can_deny_schema_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        _grantee: &TrinoPrincipal,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_deny_schema_privilege(privilege, schema)
        })
    }

    async fn check_can_revoke_schema_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        schema: &CatalogSchemaName,
        _revokee: &TrinoPrincipal,
        _grant_option: bool,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_revoke_schema_privilege(privilege, schema)
        })
    }

    async fn check_can_grant_table_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        _grantee: &TrinoPrincipal,
        _grant_option: bool,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_grant_table_privilege(privilege, table)
        })
    }

    async fn check_can_deny_table_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        _grantee: &TrinoPrincipal,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_deny_table_privilege(privilege, table)
        })
    }

    async fn check_can_revoke_table_privilege(
        &self,
        _context: &SystemSecurityContext,
        privilege: Privilege,
        table: &CatalogSchemaTableName,
        _revokee: &TrinoPrincipal,
        _grant_option: bool,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| {
            AccessDenied::deny_revoke_table_privilege(privilege, table)
        })
    }

    async fn check_can_show_roles(
        &self,
        _context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        // Role inspection only reveals what the session could already
        // observe; always allowed, no policy round trip.
        Ok(())
    }

    async fn check_can_create_role(
        &self,
        _context: &SystemSecurityContext,
        role: &str,
        _grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| AccessDenied::deny_create_role(role))
    }

    async fn check_can_drop_role(
        &self,
        _context: &SystemSecurityContext,
        role: &str,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| AccessDenied::deny_drop_role(role))
    }

    async fn check_can_grant_roles(
        &self,
        _context: &SystemSecurityContext,
        roles: &HashSet<String>,
        grantees: &HashSet<TrinoPrincipal>,
        _admin_option: bool,
        _grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| AccessDenied::deny_grant_roles(roles, grantees))
    }

    async fn check_can_revoke_roles(
        &self,
        _context: &SystemSecurityContext,
        roles: &HashSet<String>,
        grantees: &HashSet<TrinoPrincipal>,
        _admin_option: bool,
        _grantor: Option<&TrinoPrincipal>,
    ) -> Result<(), AccessControlError> {
        self.permission_management_verdict(|| AccessDenied::deny_revoke_roles(roles, grantees))
    }

    async fn check_can_show_role_authorization_descriptors(
        &self,
        context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        if self
            .query_opa_with_simple_action(context, Operation::ShowRoleAuthorizationDescriptors)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_role_authorization_descriptors().into())
        }
    }

    async fn check_can_show_current_roles(
        &self,
        _context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        Ok(())
    }

    async fn check_can_show_role_grants(
        &self,
        _context: &SystemSecurityContext,
    ) -> Result<(), AccessControlError> {
        Ok(())
    }

    async fn check_can_execute_procedure(
        &self,
        context: &SystemSecurityContext,
        procedure: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::procedure(procedure);
        if self
            .query_opa_with_simple_resource(context, Operation::ExecuteProcedure, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_execute_procedure(procedure).into())
        }
    }

    async fn can_execute_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
        kind: Option<FunctionKind>,
    ) -> Result<bool, AccessControlError> {
        let resource = match kind {
            Some(kind) => OpaQueryInputResource::function_with_kind(function, kind),
            None => OpaQueryInputResource::function(function),
        };
        Ok(self
            .query_opa_with_simple_resource(context, Operation::ExecuteFunction, resource)
            .await?)
    }

    async fn can_create_view_with_execute_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<bool, AccessControlError> {
        let resource = OpaQueryInputResource::function(function);
        Ok(self
            .query_opa_with_simple_resource(
                context,
                Operation::CreateViewWithExecuteFunction,
                resource,
            )
            .await?)
    }

    async fn check_can_create_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::function(function);
        if self
            .query_opa_with_simple_resource(context, Operation::CreateFunction, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_create_function(function).into())
        }
    }

    async fn check_can_drop_function(
        &self,
        context: &SystemSecurityContext,
        function: &CatalogSchemaRoutineName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::function(function);
        if self
            .query_opa_with_simple_resource(context, Operation::DropFunction, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_drop_function(function).into())
        }
    }

    async fn check_can_show_functions(
        &self,
        context: &SystemSecurityContext,
        schema: &CatalogSchemaName,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::schema(schema);
        if self
            .query_opa_with_simple_resource(context, Operation::ShowFunctions, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_show_functions(schema).into())
        }
    }

    async fn filter_functions(
        &self,
        context: &SystemSecurityContext,
        catalog_name: &str,
        function_names: HashSet<SchemaFunctionName>,
    ) -> Result<HashSet<SchemaFunctionName>, AccessControlError> {
        let kept = self
            .filter_items(
                context,
                Operation::FilterFunctions,
                ordered(function_names),
                |function| OpaQueryInputResource::function_in_catalog(catalog_name, function),
            )
            .await?;
        Ok(kept.into_iter().collect())
    }

    async fn check_can_execute_table_procedure(
        &self,
        context: &SystemSecurityContext,
        table: &CatalogSchemaTableName,
        procedure: &str,
    ) -> Result<(), AccessControlError> {
        let resource = OpaQueryInputResource::table_procedure(table, procedure);
        if self
            .query_opa_with_simple_resource(context, Operation::ExecuteTableProcedure, resource)
            .await?
        {
            Ok(())
        } else {
            Err(AccessDenied::deny_execute_table_procedure(table, procedure).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::PrincipalType;
    use crate::test_utils::{test_context, TestFixture};
    use serde_json::json;

    fn assert_denied(err: AccessControlError) {
        match err {
            AccessControlError::Denied(denied) => {
                assert!(
                    denied.to_string().starts_with("Access Denied"),
                    "unexpected denial message: {denied}"
                );
            }
            other => panic!("expected denial, got: {other}"),
        }
    }

    /// Run a throwing callback against a permissive, a restrictive and an
    /// undefined-decision policy; assert the emitted action document and
    /// that false and absent verdicts both deny.
    macro_rules! assert_action_behaviour {
        ($expected_action:expr, |$authorizer:ident, $context:ident| $call:expr) => {{
            let expected: serde_json::Value = $expected_action;
            let ctx = test_context();

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({"result": true}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                $call.await.expect("expected access to be allowed");
            }
            assert_eq!(fixture.received_actions().await, vec![expected.clone()]);
            fixture.opa_mock.verify().await;

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({"result": false}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                assert_denied($call.await.expect_err("expected denial on result=false"));
            }

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                assert_denied($call.await.expect_err("expected denial on absent result"));
            }
        }};
    }

    /// Same as above for callbacks that report the verdict as a boolean.
    macro_rules! assert_boolean_behaviour {
        ($expected_action:expr, |$authorizer:ident, $context:ident| $call:expr) => {{
            let expected: serde_json::Value = $expected_action;
            let ctx = test_context();

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({"result": true}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                assert!($call.await.unwrap());
            }
            assert_eq!(fixture.received_actions().await, vec![expected.clone()]);

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({"result": false}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                assert!(!$call.await.unwrap());
            }

            let fixture = TestFixture::new().await;
            fixture.add_allow_response(json!({}), 1).await;
            {
                let $authorizer = fixture.authorizer();
                let $context = &ctx;
                assert!(!$call.await.unwrap());
            }
        }};
    }

    #[tokio::test]
    async fn test_no_resource_actions() {
        assert_action_behaviour!(
            json!({"operation": "ExecuteQuery"}),
            |authorizer, context| authorizer.check_can_execute_query(context)
        );
        assert_action_behaviour!(
            json!({"operation": "ReadSystemInformation"}),
            |authorizer, context| authorizer.check_can_read_system_information(context)
        );
        assert_action_behaviour!(
            json!({"operation": "WriteSystemInformation"}),
            |authorizer, context| authorizer.check_can_write_system_information(context)
        );
        assert_action_behaviour!(
            json!({"operation": "ShowRoleAuthorizationDescriptors"}),
            |authorizer, context| authorizer.check_can_show_role_authorization_descriptors(context)
        );
    }

    #[tokio::test]
    async fn test_impersonate_user() {
        assert_action_behaviour!(
            json!({
                "operation": "ImpersonateUser",
                "resource": {"user": {"user": "some_other_user"}}
            }),
            |authorizer, context| authorizer.check_can_impersonate_user(context, "some_other_user")
        );
    }

    #[tokio::test]
    async fn test_impersonate_user_denial_names_both_users() {
        let fixture = TestFixture::new().await;
        fixture.add_allow_response(json!({"result": false}), 1).await;
        let err = fixture
            .authorizer()
            .check_can_impersonate_user(&test_context(), "other")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access Denied: User source-user cannot impersonate user other"
        );
    }

    #[tokio::test]
    async fn test_identity_resource_actions() {
        let owner = Identity::for_user("dummy-user").with_groups(["some-group"]);
        let resource = json!({"user": {"user": "dummy-user", "groups": ["some-group"]}});
        assert_action_behaviour!(
            json!({"operation": "ViewQueryOwnedBy", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_view_query_owned_by(context, &owner)
        );
        assert_action_behaviour!(
            json!({"operation": "KillQueryOwnedBy", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_kill_query_owned_by(context, &owner)
        );
    }

    #[tokio::test]
    async fn test_string_resource_actions() {
        assert_action_behaviour!(
            json!({
                "operation": "SetSystemSessionProperty",
                "resource": {"systemSessionProperty": {"name": "resource_name"}}
            }),
            |authorizer, context| {
                authorizer.check_can_set_system_session_property(context, "resource_name")
            }
        );
        let catalog = json!({"catalog": {"name": "resource_name"}});
        assert_action_behaviour!(
            json!({"operation": "CreateCatalog", "resource": catalog.clone()}),
            |authorizer, context| authorizer.check_can_create_catalog(context, "resource_name")
        );
        assert_action_behaviour!(
            json!({"operation": "DropCatalog", "resource": catalog.clone()}),
            |authorizer, context| authorizer.check_can_drop_catalog(context, "resource_name")
        );
        assert_action_behaviour!(
            json!({"operation": "ShowSchemas", "resource": catalog.clone()}),
            |authorizer, context| authorizer.check_can_show_schemas(context, "resource_name")
        );
    }

    #[tokio::test]
    async fn test_can_access_catalog() {
        assert_boolean_behaviour!(
            json!({
                "operation": "AccessCatalog",
                "resource": {"catalog": {"name": "test_catalog"}}
            }),
            |authorizer, context| authorizer.can_access_catalog(context, "test_catalog")
        );
    }

    #[tokio::test]
    async fn test_schema_resource_actions() {
        let schema = CatalogSchemaName::new("my_catalog", "my_schema");
        let resource = json!({"schema": {"catalogName": "my_catalog", "schemaName": "my_schema"}});
        assert_action_behaviour!(
            json!({"operation": "DropSchema", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_drop_schema(context, &schema)
        );
        assert_action_behaviour!(
            json!({"operation": "ShowCreateSchema", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_show_create_schema(context, &schema)
        );
        assert_action_behaviour!(
            json!({"operation": "ShowTables", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_show_tables(context, &schema)
        );
        assert_action_behaviour!(
            json!({"operation": "ShowFunctions", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_show_functions(context, &schema)
        );
    }

    #[tokio::test]
    async fn test_create_schema_always_carries_properties() {
        let schema = CatalogSchemaName::new("my_catalog", "my_schema");
        let empty = BTreeMap::new();
        assert_action_behaviour!(
            json!({
                "operation": "CreateSchema",
                "resource": {"schema": {
                    "catalogName": "my_catalog",
                    "schemaName": "my_schema",
                    "properties": {}
                }}
            }),
            |authorizer, context| authorizer.check_can_create_schema(context, &schema, &empty)
        );

        let properties: BTreeMap<String, Value> =
            [("some_key".to_string(), json!("some_value"))].into();
        assert_action_behaviour!(
            json!({
                "operation": "CreateSchema",
                "resource": {"schema": {
                    "catalogName": "my_catalog",
                    "schemaName": "my_schema",
                    "properties": {"some_key": "some_value"}
                }}
            }),
            |authorizer, context| authorizer.check_can_create_schema(context, &schema, &properties)
        );
    }

    #[tokio::test]
    async fn test_table_resource_actions() {
        let table = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let resource = json!({"table": {
            "catalogName": "my_catalog",
            "schemaName": "my_schema",
            "tableName": "my_table"
        }});
        assert_action_behaviour!(
            json!({"operation": "ShowCreateTable", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_show_create_table(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "DropTable", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_drop_table(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "SetTableComment", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_set_table_comment(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "SetViewComment", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_set_view_comment(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "SetColumnComment", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_set_column_comment(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "ShowColumns", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_show_columns(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "AddColumn", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_add_column(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "DropColumn", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_drop_column(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "AlterColumn", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_alter_column(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "RenameColumn", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_rename_column(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "InsertIntoTable", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_insert_into_table(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "DeleteFromTable", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_delete_from_table(context, &table)
        );
        assert_action_behaviour!(
            json!({"operation": "TruncateTable", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_truncate_table(context, &table)
        );
    }

    #[tokio::test]
    async fn test_view_resource_actions() {
        let view = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_view");
        let resource = json!({"view": {
            "catalogName": "my_catalog",
            "schemaName": "my_schema",
            "tableName": "my_view"
        }});
        assert_action_behaviour!(
            json!({"operation": "CreateView", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_create_view(context, &view)
        );
        assert_action_behaviour!(
            json!({"operation": "DropView", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_drop_view(context, &view)
        );
        assert_action_behaviour!(
            json!({"operation": "RefreshMaterializedView", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_refresh_materialized_view(context, &view)
        );
        assert_action_behaviour!(
            json!({"operation": "DropMaterializedView", "resource": resource.clone()}),
            |authorizer, context| authorizer.check_can_drop_materialized_view(context, &view)
        );
    }

    #[tokio::test]
    async fn test_properties_carrying_actions() {
        let name = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let create_properties: BTreeMap<String, Value> = [
            ("string_item".to_string(), json!("string_value")),
            ("boxed_number_item".to_string(), json!(32)),
        ]
        .into();
        let expected_create = json!({
            "string_item": "string_value",
            "boxed_number_item": 32
        });
        assert_action_behaviour!(
            json!({"operation": "CreateTable", "resource": {"table": {
                "catalogName": "my_catalog",
                "schemaName": "my_schema",
                "tableName": "my_table",
                "properties": expected_create.clone()
            }}}),
            |authorizer, context| {
                authorizer.check_can_create_table(context, &name, &create_properties)
            }
        );
        assert_action_behaviour!(
            json!({"operation": "CreateMaterializedView", "resource": {"view": {
                "catalogName": "my_catalog",
                "schemaName": "my_schema",
                "tableName": "my_table",
                "properties": expected_create.clone()
            }}}),
            |authorizer, context| {
                authorizer.check_can_create_materialized_view(context, &name, &create_properties)
            }
        );

        let set_properties: BTreeMap<String, Option<Value>> = [
            ("string_item".to_string(), Some(json!("string_value"))),
            ("empty_item".to_string(), None),
            ("boxed_number_item".to_string(), Some(json!(32))),
        ]
        .into();
        let expected_set = json!({
            "string_item": "string_value",
            "empty_item": null,
            "boxed_number_item": 32
        });
        assert_action_behaviour!(
            json!({"operation": "SetTableProperties", "resource": {"table": {
                "catalogName": "my_catalog",
                "schemaName": "my_schema",
                "tableName": "my_table",
                "properties": expected_set.clone()
            }}}),
            |authorizer, context| {
                authorizer.check_can_set_table_properties(context, &name, &set_properties)
            }
        );
        assert_action_behaviour!(
            json!({"operation": "SetMaterializedViewProperties", "resource": {"view": {
                "catalogName": "my_catalog",
                "schemaName": "my_schema",
                "tableName": "my_table",
                "properties": expected_set.clone()
            }}}),
            |authorizer, context| {
                authorizer.check_can_set_materialized_view_properties(context, &name, &set_properties)
            }
        );
    }

    #[tokio::test]
    async fn test_rename_actions_carry_target_resource() {
        let source = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let target = CatalogSchemaTableName::new("my_catalog", "new_schema_name", "new_table_name");
        let source_table = json!({
            "catalogName": "my_catalog", "schemaName": "my_schema", "tableName": "my_table"
        });
        let target_table = json!({
            "catalogName": "my_catalog", "schemaName": "new_schema_name", "tableName": "new_table_name"
        });
        assert_action_behaviour!(
            json!({
                "operation": "RenameTable",
                "resource": {"table": source_table.clone()},
                "targetResource": {"table": target_table.clone()}
            }),
            |authorizer, context| authorizer.check_can_rename_table(context, &source, &target)
        );
        assert_action_behaviour!(
            json!({
                "operation": "RenameView",
                "resource": {"view": source_table.clone()},
                "targetResource": {"view": target_table.clone()}
            }),
            |authorizer, context| authorizer.check_can_rename_view(context, &source, &target)
        );
        assert_action_behaviour!(
            json!({
                "operation": "RenameMaterializedView",
                "resource": {"view": source_table.clone()},
                "targetResource": {"view": target_table.clone()}
            }),
            |authorizer, context| {
                authorizer.check_can_rename_materialized_view(context, &source, &target)
            }
        );

        let schema = CatalogSchemaName::new("my_catalog", "my_schema");
        assert_action_behaviour!(
            json!({
                "operation": "RenameSchema",
                "resource": {"schema": {"catalogName": "my_catalog", "schemaName": "my_schema"}},
                "targetResource": {"schema": {"catalogName": "my_catalog", "schemaName": "new_schema_name"}}
            }),
            |authorizer, context| {
                authorizer.check_can_rename_schema(context, &schema, "new_schema_name")
            }
        );
    }

    #[tokio::test]
    async fn test_authorization_actions_carry_grantee() {
        let principal = TrinoPrincipal::new(PrincipalType::User, "my_user");
        let grantee = json!({"principals": [{"name": "my_user", "type": "USER"}]});

        let schema = CatalogSchemaName::new("my_catalog", "my_schema");
        assert_action_behaviour!(
            json!({
                "operation": "SetSchemaAuthorization",
                "resource": {"schema": {"catalogName": "my_catalog", "schemaName": "my_schema"}},
                "grantee": grantee.clone()
            }),
            |authorizer, context| {
                authorizer.check_can_set_schema_authorization(context, &schema, &principal)
            }
        );

        let table = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let table_json = json!({
            "catalogName": "my_catalog", "schemaName": "my_schema", "tableName": "my_table"
        });
        assert_action_behaviour!(
            json!({
                "operation": "SetTableAuthorization",
                "resource": {"table": table_json.clone()},
                "grantee": grantee.clone()
            }),
            |authorizer, context| {
                authorizer.check_can_set_table_authorization(context, &table, &principal)
            }
        );
        assert_action_behaviour!(
            json!({
                "operation": "SetViewAuthorization",
                "resource": {"view": table_json.clone()},
                "grantee": grantee.clone()
            }),
            |authorizer, context| {
                authorizer.check_can_set_view_authorization(context, &table, &principal)
            }
        );
    }

    #[tokio::test]
    async fn test_column_actions_carry_the_column_set() {
        let table = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let columns: HashSet<String> = ["my_column".to_string()].into();
        let resource = json!({"table": {
            "catalogName": "my_catalog",
            "schemaName": "my_schema",
            "tableName": "my_table",
            "columns": ["my_column"]
        }});
        assert_action_behaviour!(
            json!({"operation": "SelectFromColumns", "resource": resource.clone()}),
            |authorizer, context| {
                authorizer.check_can_select_from_columns(context, &table, &columns)
            }
        );
        assert_action_behaviour!(
            json!({"operation": "UpdateTableColumns", "resource": resource.clone()}),
            |authorizer, context| {
                authorizer.check_can_update_table_columns(context, &table, &columns)
            }
        );
        assert_action_behaviour!(
            json!({"operation": "CreateViewWithSelectFromColumns", "resource": resource.clone()}),
            |authorizer, context| {
                authorizer.check_can_create_view_with_select_from_columns(context, &table, &columns)
            }
        );
    }

    #[tokio::test]
    async fn test_catalog_session_property() {
        assert_action_behaviour!(
            json!({
                "operation": "SetCatalogSessionProperty",
                "resource": {"catalogSessionProperty": {
                    "catalogName": "my_catalog",
                    "propertyName": "my_property"
                }}
            }),
            |authorizer, context| {
                authorizer.check_can_set_catalog_session_property(context, "my_catalog", "my_property")
            }
        );
    }

    #[tokio::test]
    async fn test_function_resource_actions() {
        let routine = CatalogSchemaRoutineName::new("my_catalog", "my_schema", "my_routine_name");
        let function = json!({"function": {
            "catalogName": "my_catalog",
            "schemaName": "my_schema",
            "functionName": "my_routine_name"
        }});
        assert_action_behaviour!(
            json!({"operation": "CreateFunction", "resource": function.clone()}),
            |authorizer, context| authorizer.check_can_create_function(context, &routine)
        );
        assert_action_behaviour!(
            json!({"operation": "DropFunction", "resource": function.clone()}),
            |authorizer, context| authorizer.check_can_drop_function(context, &routine)
        );
        assert_boolean_behaviour!(
            json!({"operation": "ExecuteFunction", "resource": function.clone()}),
            |authorizer, context| authorizer.can_execute_function(context, &routine, None)
        );
        assert_boolean_behaviour!(
            json!({"operation": "CreateViewWithExecuteFunction", "resource": function.clone()}),
            |authorizer, context| {
                authorizer.can_create_view_with_execute_function(context, &routine)
            }
        );
    }

    #[tokio::test]
    async fn test_can_execute_function_with_function_kind() {
        let routine = CatalogSchemaRoutineName::new("my_catalog", "my_schema", "my_routine_name");
        assert_boolean_behaviour!(
            json!({
                "operation": "ExecuteFunction",
                "resource": {"function": {
                    "catalogName": "my_catalog",
                    "schemaName": "my_schema",
                    "functionName": "my_routine_name",
                    "functionKind": "TABLE"
                }}
            }),
            |authorizer, context| {
                authorizer.can_execute_function(context, &routine, Some(FunctionKind::Table))
            }
        );
    }

    #[tokio::test]
    async fn test_execute_procedure_carries_schema_and_function() {
        let procedure = CatalogSchemaRoutineName::new("my_catalog", "my_schema", "my_procedure");
        assert_action_behaviour!(
            json!({
                "operation": "ExecuteProcedure",
                "resource": {
                    "schema": {"catalogName": "my_catalog", "schemaName": "my_schema"},
                    "function": {"functionName": "my_procedure"}
                }
            }),
            |authorizer, context| authorizer.check_can_execute_procedure(context, &procedure)
        );
    }

    #[tokio::test]
    async fn test_execute_table_procedure_carries_table_and_function() {
        let table = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        assert_action_behaviour!(
            json!({
                "operation": "ExecuteTableProcedure",
                "resource": {
                    "table": {
                        "catalogName": "my_catalog",
                        "schemaName": "my_schema",
                        "tableName": "my_table"
                    },
                    "function": {"functionName": "my_procedure"}
                }
            }),
            |authorizer, context| {
                authorizer.check_can_execute_table_procedure(context, &table, "my_procedure")
            }
        );
    }

    #[tokio::test]
    async fn test_grant_execute_function_privilege() {
        let grantee = TrinoPrincipal::new(PrincipalType::User, "my_user");
        assert_action_behaviour!(
            json!({
                "operation": "GrantExecuteFunctionPrivilege",
                "resource": {"function": {"functionName": "my_function"}},
                "grantee": {
                    "principals": [{"name": "my_user", "type": "USER"}],
                    "grantOption": true
                }
            }),
            |authorizer, context| {
                authorizer.check_can_grant_execute_function_privilege(
                    context,
                    "my_function",
                    &grantee,
                    true,
                )
            }
        );
    }

    #[tokio::test]
    async fn test_request_context_with_known_trino_version() {
        let fixture = TestFixture::new().await;
        fixture.add_allow_response(json!({"result": true}), 1).await;
        let authorizer = OpaAccessControl::new(&fixture.config(), Some("12345.67890")).unwrap();
        let context = SystemSecurityContext::new(
            Identity::for_user("test_user").with_groups(["some_group"]),
        );

        authorizer.check_can_execute_query(&context).await.unwrap();

        assert_eq!(
            fixture.received_bodies().await,
            vec![json!({
                "input": {
                    "context": {
                        "identity": {
                            "user": "test_user",
                            "groups": ["some_group"],
                            "enabledRoles": [],
                            "catalogRoles": {},
                            "extraCredentials": {}
                        },
                        "softwareStack": {"trinoVersion": "12345.67890"}
                    },
                    "action": {"operation": "ExecuteQuery"}
                }
            })]
        );
    }

    #[tokio::test]
    async fn test_request_context_with_unknown_trino_version() {
        let fixture = TestFixture::new().await;
        fixture.add_allow_response(json!({"result": true}), 1).await;
        let authorizer = OpaAccessControl::new(&fixture.config(), None).unwrap();

        authorizer.check_can_execute_query(&test_context()).await.unwrap();

        let bodies = fixture.received_bodies().await;
        assert_eq!(
            bodies[0]["input"]["context"]["softwareStack"]["trinoVersion"],
            json!("UNKNOWN")
        );
    }

    #[tokio::test]
    async fn test_response_with_extra_fields_still_allows() {
        let fixture = TestFixture::new().await;
        fixture
            .add_allow_response(
                json!({
                    "result": true,
                    "decision_id": "foo",
                    "some_debug_info": {"test": ""}
                }),
                1,
            )
            .await;
        fixture
            .authorizer()
            .check_can_execute_query(&test_context())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_illegal_responses_propagate_as_opa_errors() {
        let cases: [(u16, &str, fn(&OpaError) -> bool); 4] = [
            (404, "{}", |e| matches!(e, OpaError::PolicyNotFound { .. })),
            (400, "{}", |e| matches!(e, OpaError::OpaServerError { .. })),
            (500, "", |e| matches!(e, OpaError::OpaServerError { .. })),
            (200, r#"{ "this"": is broken_json; }"#, |e| {
                matches!(e, OpaError::DeserializeFailed { .. })
            }),
        ];
        for (status, body, matcher) in cases {
            let fixture = TestFixture::new().await;
            fixture.add_allow_status(status, body).await;
            let err = fixture
                .authorizer()
                .check_can_execute_query(&test_context())
                .await
                .unwrap_err();
            match err {
                AccessControlError::Opa(opa) => assert!(matcher(&opa), "status {status}: {opa}"),
                other => panic!("expected an OPA error, got: {other}"),
            }
        }
    }

    async fn run_gated_operations(
        authorizer: &OpaAccessControl,
        context: &SystemSecurityContext,
    ) -> Vec<Result<(), AccessControlError>> {
        let schema = CatalogSchemaName::new("my_catalog", "my_schema");
        let table = CatalogSchemaTableName::new("my_catalog", "my_schema", "my_table");
        let principal = TrinoPrincipal::new(PrincipalType::User, "my_user");
        let roles: HashSet<String> = ["role_one".to_string()].into();
        let grantees: HashSet<TrinoPrincipal> = [principal.clone()].into();

        vec![
            authorizer
                .check_can_grant_schema_privilege(context, Privilege::Select, &schema, &principal, false)
                .await,
            authorizer
                .check_can_deny_schema_privilege(context, Privilege::Select, &schema, &principal)
                .await,
            authorizer
                .check_can_revoke_schema_privilege(context, Privilege::Select, &schema, &principal, false)
                .await,
            authorizer
                .check_can_grant_table_privilege(context, Privilege::Insert, &table, &principal, true)
                .await,
            authorizer
                .check_can_deny_table_privilege(context, Privilege::Insert, &table, &principal)
                .await,
            authorizer
                .check_can_revoke_table_privilege(context, Privilege::Insert, &table, &principal, false)
                .await,
            authorizer.check_can_create_role(context, "my_role", None).await,
            authorizer.check_can_drop_role(context, "my_role").await,
            authorizer
                .check_can_grant_roles(context, &roles, &grantees, false, None)
                .await,
            authorizer
                .check_can_revoke_roles(context, &roles, &grantees, false, None)
                .await,
        ]
    }

    #[tokio::test]
    async fn test_permission_management_denied_without_policy_traffic() {
        let fixture = TestFixture::new().await;
        let authorizer = fixture.gate_authorizer(false);
        for result in run_gated_operations(&authorizer, &test_context()).await {
            assert_denied(result.expect_err("gated operation should deny"));
        }
        fixture.assert_no_requests().await;
    }

    #[tokio::test]
    async fn test_permission_management_allowed_without_policy_traffic() {
        let fixture = TestFixture::new().await;
        let authorizer = fixture.gate_authorizer(true);
        for result in run_gated_operations(&authorizer, &test_context()).await {
            result.expect("gated operation should succeed");
        }
        fixture.assert_no_requests().await;
    }

    #[tokio::test]
    async fn test_role_inspection_is_always_allowed() {
        for allow in [false, true] {
            let fixture = TestFixture::new().await;
            let authorizer = fixture.gate_authorizer(allow);
            let context = test_context();
            authorizer.check_can_show_roles(&context).await.unwrap();
            authorizer.check_can_show_current_roles(&context).await.unwrap();
            authorizer.check_can_show_role_grants(&context).await.unwrap();
            fixture.assert_no_requests().await;
        }
    }
}
