use std::collections::BTreeMap;
use std::sync::Arc;

use crate::access_control::OpaAccessControl;
use crate::config::{ConfigError, OpaConfig};
use crate::spi::SystemAccessControl;

/// Entry point the host engine loads the bridge through: resolves the
/// property map, builds the shared HTTP client, and hands back an object
/// satisfying the access control capability set. A missing policy URI is
/// a fatal startup error.
pub struct OpaAccessControlFactory;

impl OpaAccessControlFactory {
    /// The name the bridge registers under in the engine's
    /// access control configuration.
    pub const NAME: &'static str = "opa";

    /// `trino_version` is the engine version reported by the host at
    /// startup; it is embedded in every request's `softwareStack` and
    /// falls back to `"UNKNOWN"` when the host supplies none.
    pub fn create(
        properties: &BTreeMap<String, String>,
        trino_version: Option<&str>,
    ) -> Result<Arc<dyn SystemAccessControl>, ConfigError> {
        let config = OpaConfig::from_properties(properties)?;
        Ok(Arc::new(OpaAccessControl::new(&config, trino_version)?))
    }
}
