//! The host engine side of the bridge: the identity and naming types the
//! engine calls us with, the access-denied taxonomy it expects back, and
//! the capability trait the factory's product satisfies.

mod access_control;
mod access_denied;
mod types;

pub use access_control::SystemAccessControl;
pub use access_denied::AccessDenied;
pub use types::{
    CatalogSchemaName, CatalogSchemaRoutineName, CatalogSchemaTableName, FunctionKind, Identity,
    PrincipalType, Privilege, SchemaFunctionName, SchemaTableName, SelectedRole, SelectedRoleType,
    SystemSecurityContext, TrinoPrincipal,
};
