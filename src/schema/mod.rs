//! The canonical JSON shapes sent to and received from the policy
//! endpoint. Policies across the ecosystem depend on these exact field
//! names, so every rename here is part of the wire contract.
//!
//! Collections are serialized in sorted order and maps as `BTreeMap` so
//! that two identical authorization questions produce byte-identical
//! documents.

mod action;
mod resource;
mod response;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::spi::{Identity, SelectedRole};

pub use action::{Operation, OpaQueryInputAction, OpaQueryInputGrant};
pub use resource::{
    NamedEntity, OpaCatalogSchema, OpaCatalogSessionProperty, OpaFunction, OpaQueryInputResource,
    OpaTable, OpaUser,
};
pub use response::{OpaBatchQueryResult, OpaQueryResult};

/// Top-level wrapper of every policy query, per the OPA data API:
/// the evaluated document is always nested under `input`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaQuery {
    pub input: OpaQueryInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaQueryInput {
    pub context: OpaQueryContext,
    pub action: OpaQueryInputAction,
}

/// Who is asking, plus the engine version the question originates from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaQueryContext {
    pub identity: OpaIdentity,
    #[serde(rename = "softwareStack")]
    pub software_stack: TrinoSoftwareStack,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrinoSoftwareStack {
    #[serde(rename = "trinoVersion")]
    pub trino_version: String,
}

/// The full identity shape used for `context.identity`. Empty collections
/// are emitted rather than omitted: policy authors rely on the fields
/// being present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpaIdentity {
    pub user: String,
    pub groups: Vec<String>,
    #[serde(rename = "enabledRoles")]
    pub enabled_roles: Vec<String>,
    #[serde(rename = "catalogRoles")]
    pub catalog_roles: BTreeMap<String, SelectedRole>,
    #[serde(rename = "extraCredentials")]
    pub extra_credentials: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

impl OpaIdentity {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            user: identity.user.clone(),
            groups: sorted(&identity.groups),
            enabled_roles: sorted(&identity.enabled_roles),
            catalog_roles: identity
                .catalog_roles
                .iter()
                .map(|(catalog, role)| (catalog.clone(), role.clone()))
                .collect(),
            extra_credentials: identity
                .extra_credentials
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            principal: identity.principal.clone(),
        }
    }
}

pub(crate) fn sorted(items: &HashSet<String>) -> Vec<String> {
    let mut items: Vec<String> = items.iter().cloned().collect();
    items.sort_unstable();
    items
}
