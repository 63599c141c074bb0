use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::spi::{
    CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName, FunctionKind, Identity,
    SchemaFunctionName, SchemaTableName,
};

use super::sorted;

/// The resource an action targets. Exactly the fields of the populated
/// variant appear on the wire, each under its own key (`table`, `view`,
/// `schema`, ...). Whether a table-shaped object serializes under `table`
/// or `view` is decided by the variant, not by a runtime flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OpaQueryInputResource {
    User {
        user: OpaUser,
    },
    SystemSessionProperty {
        #[serde(rename = "systemSessionProperty")]
        system_session_property: NamedEntity,
    },
    CatalogSessionProperty {
        #[serde(rename = "catalogSessionProperty")]
        catalog_session_property: OpaCatalogSessionProperty,
    },
    Catalog {
        catalog: NamedEntity,
    },
    Schema {
        schema: OpaCatalogSchema,
    },
    Table {
        table: OpaTable,
    },
    View {
        view: OpaTable,
    },
    Function {
        function: OpaFunction,
    },
    /// Procedures are addressed by their containing schema plus a bare
    /// function name.
    SchemaRoutine {
        schema: OpaCatalogSchema,
        function: OpaFunction,
    },
    /// Table procedures carry both the table they operate on and the
    /// procedure name.
    TableProcedure {
        table: OpaTable,
        function: OpaFunction,
    },
    Role {
        role: NamedEntity,
    },
    Roles {
        roles: Vec<NamedEntity>,
    },
}

/// Wrapper for resources that are identified by a bare name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedEntity {
    pub name: String,
}

/// A user resource. Impersonation targets carry only the name; query
/// owner targets also carry the owner's groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaUser {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaCatalogSessionProperty {
    pub catalog_name: String,
    pub property_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaCatalogSchema {
    pub catalog_name: String,
    pub schema_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Option<Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaTable {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Option<Value>>>,
}

impl OpaTable {
    fn from_name(table: &CatalogSchemaTableName) -> Self {
        Self {
            catalog_name: table.catalog_name.clone(),
            schema_name: table.schema_name.clone(),
            table_name: table.table_name.clone(),
            columns: None,
            properties: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    pub function_name: String,
    /// The function flavor, present when the engine reports one on the
    /// execute-function callback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_kind: Option<FunctionKind>,
}

impl OpaQueryInputResource {
    pub fn user(name: impl Into<String>) -> Self {
        Self::User {
            user: OpaUser {
                user: name.into(),
                groups: None,
            },
        }
    }

    pub fn query_owner(owner: &Identity) -> Self {
        Self::User {
            user: OpaUser {
                user: owner.user.clone(),
                groups: Some(sorted(&owner.groups)),
            },
        }
    }

    pub fn system_session_property(name: impl Into<String>) -> Self {
        Self::SystemSessionProperty {
            system_session_property: NamedEntity { name: name.into() },
        }
    }

    pub fn catalog_session_property(
        catalog_name: impl Into<String>,
        property_name: impl Into<String>,
    ) -> Self {
        Self::CatalogSessionProperty {
            catalog_session_property: OpaCatalogSessionProperty {
                catalog_name: catalog_name.into(),
                property_name: property_name.into(),
            },
        }
    }

    pub fn catalog(name: impl Into<String>) -> Self {
        Self::Catalog {
            catalog: NamedEntity { name: name.into() },
        }
    }

    pub fn schema(schema: &CatalogSchemaName) -> Self {
        Self::schema_in_catalog(&schema.catalog_name, &schema.schema_name)
    }

    pub fn schema_in_catalog(
        catalog_name: impl Into<String>,
        schema_name: impl Into<String>,
    ) -> Self {
        Self::Schema {
            schema: OpaCatalogSchema {
                catalog_name: catalog_name.into(),
                schema_name: schema_name.into(),
                properties: None,
            },
        }
    }

    pub fn schema_with_properties(
        schema: &CatalogSchemaName,
        properties: &BTreeMap<String, Value>,
    ) -> Self {
        Self::Schema {
            schema: OpaCatalogSchema {
                catalog_name: schema.catalog_name.clone(),
                schema_name: schema.schema_name.clone(),
                properties: Some(nullable_properties(properties)),
            },
        }
    }

    pub fn table(table: &CatalogSchemaTableName) -> Self {
        Self::Table {
            table: OpaTable::from_name(table),
        }
    }

    pub fn table_in_catalog(catalog_name: impl Into<String>, table: &SchemaTableName) -> Self {
        Self::Table {
            table: OpaTable {
                catalog_name: catalog_name.into(),
                schema_name: table.schema_name.clone(),
                table_name: table.table_name.clone(),
                columns: None,
                properties: None,
            },
        }
    }

    pub fn table_with_columns(table: &CatalogSchemaTableName, columns: Vec<String>) -> Self {
        Self::Table {
            table: OpaTable {
                columns: Some(columns),
                ..OpaTable::from_name(table)
            },
        }
    }

    pub fn table_with_column_set(table: &CatalogSchemaTableName, columns: &HashSet<String>) -> Self {
        Self::table_with_columns(table, sorted(columns))
    }

    pub fn table_with_properties(
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Self {
        Self::Table {
            table: OpaTable {
                properties: Some(nullable_properties(properties)),
                ..OpaTable::from_name(table)
            },
        }
    }

    pub fn table_with_nullable_properties(
        table: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Self {
        Self::Table {
            table: OpaTable {
                properties: Some(properties.clone()),
                ..OpaTable::from_name(table)
            },
        }
    }

    pub fn view(view: &CatalogSchemaTableName) -> Self {
        Self::View {
            view: OpaTable::from_name(view),
        }
    }

    pub fn view_with_properties(
        view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Value>,
    ) -> Self {
        Self::View {
            view: OpaTable {
                properties: Some(nullable_properties(properties)),
                ..OpaTable::from_name(view)
            },
        }
    }

    pub fn view_with_nullable_properties(
        view: &CatalogSchemaTableName,
        properties: &BTreeMap<String, Option<Value>>,
    ) -> Self {
        Self::View {
            view: OpaTable {
                properties: Some(properties.clone()),
                ..OpaTable::from_name(view)
            },
        }
    }

    pub fn function(function: &CatalogSchemaRoutineName) -> Self {
        Self::Function {
            function: OpaFunction {
                catalog_name: Some(function.catalog_name.clone()),
                schema_name: Some(function.schema_name.clone()),
                function_name: function.routine_name.clone(),
                function_kind: None,
            },
        }
    }

    pub fn function_with_kind(function: &CatalogSchemaRoutineName, kind: FunctionKind) -> Self {
        Self::Function {
            function: OpaFunction {
                catalog_name: Some(function.catalog_name.clone()),
                schema_name: Some(function.schema_name.clone()),
                function_name: function.routine_name.clone(),
                function_kind: Some(kind),
            },
        }
    }

    pub fn function_name(name: impl Into<String>) -> Self {
        Self::Function {
            function: OpaFunction {
                catalog_name: None,
                schema_name: None,
                function_name: name.into(),
                function_kind: None,
            },
        }
    }

    pub fn function_in_catalog(
        catalog_name: impl Into<String>,
        function: &SchemaFunctionName,
    ) -> Self {
        Self::Function {
            function: OpaFunction {
                catalog_name: Some(catalog_name.into()),
                schema_name: Some(function.schema_name.clone()),
                function_name: function.function_name.clone(),
                function_kind: None,
            },
        }
    }

    pub fn procedure(procedure: &CatalogSchemaRoutineName) -> Self {
        Self::SchemaRoutine {
            schema: OpaCatalogSchema {
                catalog_name: procedure.catalog_name.clone(),
                schema_name: procedure.schema_name.clone(),
                properties: None,
            },
            function: OpaFunction {
                catalog_name: None,
                schema_name: None,
                function_name: procedure.routine_name.clone(),
                function_kind: None,
            },
        }
    }

    pub fn table_procedure(table: &CatalogSchemaTableName, procedure: impl Into<String>) -> Self {
        Self::TableProcedure {
            table: OpaTable::from_name(table),
            function: OpaFunction {
                catalog_name: None,
                schema_name: None,
                function_name: procedure.into(),
                function_kind: None,
            },
        }
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::Role {
            role: NamedEntity { name: name.into() },
        }
    }

    pub fn roles(names: &HashSet<String>) -> Self {
        Self::Roles {
            roles: sorted(names)
                .into_iter()
                .map(|name| NamedEntity { name })
                .collect(),
        }
    }
}

fn nullable_properties(properties: &BTreeMap<String, Value>) -> BTreeMap<String, Option<Value>> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), Some(value.clone())))
        .collect()
}
