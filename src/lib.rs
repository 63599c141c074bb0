//! Authorization bridge between a Trino-style SQL engine and an Open
//! Policy Agent endpoint.
//!
//! Every security-relevant callback of the engine (query execution,
//! catalog/schema/table/column access, DDL, impersonation, query
//! ownership, function execution) is translated into a canonical JSON
//! input document and POSTed to a configured OPA policy for a verdict.
//! Collection-valued callbacks are reduced either by issuing one request
//! per candidate (fan-out mode) or, when a batched endpoint is
//! configured, by a single request carrying the ordered candidate list.
//!
//! The bridge keeps no state between callbacks, performs no caching and
//! never interprets an infrastructure failure as "allow".

pub mod access_control;
pub mod client;
pub mod config;
pub mod errors;
pub mod factory;
pub mod schema;
pub mod spi;

#[cfg(test)]
pub(crate) mod test_utils;

pub use access_control::OpaAccessControl;
pub use client::OpaHttpClient;
pub use config::{ConfigError, HttpClientConfig, OpaConfig};
pub use errors::{AccessControlError, OpaError};
pub use factory::OpaAccessControlFactory;
