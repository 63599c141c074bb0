use std::collections::HashSet;

use serde::Serialize;

use crate::spi::{Privilege, TrinoPrincipal};

use super::resource::OpaQueryInputResource;

/// Fixed operation identifiers. The serialized name alone determines
/// which resource fields an action carries, so the variant names are the
/// wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operation {
    ImpersonateUser,
    ExecuteQuery,
    ViewQueryOwnedBy,
    FilterViewQueryOwnedBy,
    KillQueryOwnedBy,
    ReadSystemInformation,
    WriteSystemInformation,
    SetSystemSessionProperty,
    AccessCatalog,
    CreateCatalog,
    DropCatalog,
    FilterCatalogs,
    ShowSchemas,
    CreateSchema,
    DropSchema,
    RenameSchema,
    SetSchemaAuthorization,
    FilterSchemas,
    ShowCreateSchema,
    ShowCreateTable,
    CreateTable,
    DropTable,
    RenameTable,
    SetTableProperties,
    SetTableComment,
    SetViewComment,
    SetColumnComment,
    ShowTables,
    FilterTables,
    ShowColumns,
    FilterColumns,
    AddColumn,
    DropColumn,
    AlterColumn,
    RenameColumn,
    SetTableAuthorization,
    SelectFromColumns,
    InsertIntoTable,
    DeleteFromTable,
    TruncateTable,
    UpdateTableColumns,
    CreateView,
    RenameView,
    SetViewAuthorization,
    DropView,
    CreateViewWithSelectFromColumns,
    CreateMaterializedView,
    RefreshMaterializedView,
    SetMaterializedViewProperties,
    DropMaterializedView,
    RenameMaterializedView,
    GrantExecuteFunctionPrivilege,
    SetCatalogSessionProperty,
    GrantSchemaPrivilege,
    DenySchemaPrivilege,
    RevokeSchemaPrivilege,
    GrantTablePrivilege,
    DenyTablePrivilege,
    RevokeTablePrivilege,
    ShowRoles,
    CreateRole,
    DropRole,
    GrantRoles,
    RevokeRoles,
    ShowRoleAuthorizationDescriptors,
    ShowCurrentRoles,
    ShowRoleGrants,
    ExecuteProcedure,
    ExecuteFunction,
    CreateFunction,
    DropFunction,
    ShowFunctions,
    FilterFunctions,
    CreateViewWithExecuteFunction,
    ExecuteTableProcedure,
}

/// The decision request. At most one of `resource` and `filter_resources`
/// may be populated; the HTTP client rejects documents violating this
/// before anything is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaQueryInputAction {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<OpaQueryInputResource>,
    #[serde(rename = "filterResources", skip_serializing_if = "Option::is_none")]
    pub filter_resources: Option<Vec<OpaQueryInputResource>>,
    #[serde(rename = "targetResource", skip_serializing_if = "Option::is_none")]
    pub target_resource: Option<Box<OpaQueryInputResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grantee: Option<OpaQueryInputGrant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grantor: Option<TrinoPrincipal>,
}

impl OpaQueryInputAction {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            resource: None,
            filter_resources: None,
            target_resource: None,
            grantee: None,
            grantor: None,
        }
    }
}

/// The receiving end of a privilege or authorization change.
/// `grant_option` is tri-state: deny operations have no grant-option
/// concept and omit the field rather than sending `false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaQueryInputGrant {
    pub principals: Vec<TrinoPrincipal>,
    #[serde(rename = "grantOption", skip_serializing_if = "Option::is_none")]
    pub grant_option: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privilege: Option<Privilege>,
}

impl OpaQueryInputGrant {
    pub fn principal(principal: &TrinoPrincipal) -> Self {
        Self {
            principals: vec![principal.clone()],
            grant_option: None,
            privilege: None,
        }
    }

    pub fn principal_with_grant_option(principal: &TrinoPrincipal, grant_option: bool) -> Self {
        Self {
            grant_option: Some(grant_option),
            ..Self::principal(principal)
        }
    }

    pub fn privileged(
        principal: &TrinoPrincipal,
        privilege: Privilege,
        grant_option: Option<bool>,
    ) -> Self {
        Self {
            principals: vec![principal.clone()],
            grant_option,
            privilege: Some(privilege),
        }
    }

    pub fn principals(principals: &HashSet<TrinoPrincipal>, grant_option: Option<bool>) -> Self {
        let mut principals: Vec<TrinoPrincipal> = principals.iter().cloned().collect();
        principals.sort();
        Self {
            principals,
            grant_option,
            privilege: None,
        }
    }
}
