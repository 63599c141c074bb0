use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

/// The identity a query runs as, as reported by the engine session.
/// Immutable for the duration of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub user: String,
    pub groups: HashSet<String>,
    pub enabled_roles: HashSet<String>,
    pub catalog_roles: HashMap<String, SelectedRole>,
    pub extra_credentials: HashMap<String, String>,
    pub principal: Option<String>,
}

impl Identity {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_enabled_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_credentials<I, K, V>(mut self, credentials: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.extra_credentials = credentials
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    pub fn with_catalog_roles<I, K>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = (K, SelectedRole)>,
        K: Into<String>,
    {
        self.catalog_roles = roles
            .into_iter()
            .map(|(catalog, role)| (catalog.into(), role))
            .collect();
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}

/// A role selection for a single catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedRole {
    #[serde(rename = "type")]
    pub role_type: SelectedRoleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SelectedRoleType {
    All,
    None,
    Role,
}

/// The security context each callback is evaluated under.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSecurityContext {
    pub identity: Identity,
}

impl SystemSecurityContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogSchemaName {
    pub catalog_name: String,
    pub schema_name: String,
}

impl CatalogSchemaName {
    pub fn new(catalog_name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schema_name: schema_name.into(),
        }
    }
}

impl fmt::Display for CatalogSchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.catalog_name, self.schema_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaTableName {
    pub schema_name: String,
    pub table_name: String,
}

impl SchemaTableName {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for SchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogSchemaTableName {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
}

impl CatalogSchemaTableName {
    pub fn new(
        catalog_name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for CatalogSchemaTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.catalog_name, self.schema_name, self.table_name
        )
    }
}

/// Fully qualified name of a function or procedure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogSchemaRoutineName {
    pub catalog_name: String,
    pub schema_name: String,
    pub routine_name: String,
}

impl CatalogSchemaRoutineName {
    pub fn new(
        catalog_name: impl Into<String>,
        schema_name: impl Into<String>,
        routine_name: impl Into<String>,
    ) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            schema_name: schema_name.into(),
            routine_name: routine_name.into(),
        }
    }
}

impl fmt::Display for CatalogSchemaRoutineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.catalog_name, self.schema_name, self.routine_name
        )
    }
}

/// Schema-qualified function name, used by the function filter callback
/// where the catalog is passed separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaFunctionName {
    pub schema_name: String,
    pub function_name: String,
}

impl SchemaFunctionName {
    pub fn new(schema_name: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            function_name: function_name.into(),
        }
    }
}

impl fmt::Display for SchemaFunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.function_name)
    }
}

/// A user or role that privileges and ownership can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TrinoPrincipal {
    pub name: String,
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
}

impl TrinoPrincipal {
    pub fn new(principal_type: PrincipalType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            principal_type,
        }
    }
}

impl fmt::Display for TrinoPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.principal_type, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrincipalType {
    User,
    Role,
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "USER",
            Self::Role => "ROLE",
        })
    }
}

/// SQL privileges subject to grant/deny/revoke management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privilege {
    Select,
    Insert,
    Delete,
    Update,
    Ownership,
    Create,
    Execute,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Ownership => "OWNERSHIP",
            Self::Create => "CREATE",
            Self::Execute => "EXECUTE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FunctionKind {
    Aggregate,
    Scalar,
    Table,
    Window,
}
