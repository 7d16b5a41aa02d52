//! Load tenancy settings from the process environment or a JSON file.

use crate::config::{validate, TenancyConfig};
use crate::error::ConfigError;
use std::path::Path;

pub const ENV_TENANT_HEADER: &str = "TENANT_HEADER";
pub const ENV_SUBDOMAIN_ROUTING: &str = "ENABLE_SUBDOMAIN_TENANT_ROUTING";
pub const ENV_DEFAULT_TENANT: &str = "DEFAULT_TENANT_ID";
pub const ENV_IMPERSONATION_HEADER: &str = "TENANT_IMPERSONATION_HEADER";
pub const ENV_STRICT_MODE: &str = "TENANT_STRICT_MODE";
pub const ENV_LISTINGS_INCLUDE_UNSCOPED: &str = "TENANT_LISTINGS_INCLUDE_UNSCOPED";
pub const ENV_VALIDATION_CACHE_CAPACITY: &str = "TENANT_VALIDATION_CACHE_CAPACITY";
pub const ENV_FALLBACK_SCHEMA: &str = "TENANT_FALLBACK_SCHEMA";

impl TenancyConfig {
    /// Build from environment variables; unset variables keep their defaults. Validates before returning.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TenancyConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = TenancyConfig::default();
        if let Some(v) = lookup(ENV_TENANT_HEADER) {
            config.tenant_header = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_SUBDOMAIN_ROUTING) {
            config.enable_subdomain_routing = parse_flag(ENV_SUBDOMAIN_ROUTING, &v)?;
        }
        if let Some(v) = lookup(ENV_DEFAULT_TENANT) {
            let v = v.trim();
            config.default_tenant_id = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = lookup(ENV_IMPERSONATION_HEADER) {
            config.impersonation_header = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_STRICT_MODE) {
            config.strict_mode = parse_flag(ENV_STRICT_MODE, &v)?;
        }
        if let Some(v) = lookup(ENV_LISTINGS_INCLUDE_UNSCOPED) {
            config.listings_include_unscoped = parse_flag(ENV_LISTINGS_INCLUDE_UNSCOPED, &v)?;
        }
        if let Some(v) = lookup(ENV_VALIDATION_CACHE_CAPACITY) {
            config.validation_cache_capacity =
                v.trim().parse().map_err(|_| ConfigError::InvalidSetting {
                    key: ENV_VALIDATION_CACHE_CAPACITY,
                    reason: format!("expected a positive integer, got '{}'", v),
                })?;
        }
        if let Some(v) = lookup(ENV_FALLBACK_SCHEMA) {
            config.search_path_fallback_schema = v.trim().to_string();
        }
        validate(&config)?;
        Ok(config)
    }
}

/// Load from a JSON file. Missing fields take defaults.
pub async fn load_from_file(path: impl AsRef<Path>) -> Result<TenancyConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let config: TenancyConfig = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    validate(&config)?;
    Ok(config)
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidSetting {
            key,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = TenancyConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, TenancyConfig::default());
        assert_eq!(config.tenant_header, "X-Tenant-ID");
    }

    #[test]
    fn reads_flags_and_default_tenant() {
        let config = TenancyConfig::from_lookup(lookup_from(&[
            (ENV_SUBDOMAIN_ROUTING, "true"),
            (ENV_DEFAULT_TENANT, " acme "),
            (ENV_STRICT_MODE, "1"),
        ]))
        .unwrap();
        assert!(config.enable_subdomain_routing);
        assert!(config.strict_mode);
        assert_eq!(config.default_tenant_id.as_deref(), Some("acme"));
    }

    #[test]
    fn blank_default_tenant_is_unset() {
        let config = TenancyConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_TENANT, "  ")])).unwrap();
        assert_eq!(config.default_tenant_id, None);
    }

    #[test]
    fn rejects_garbage_flag() {
        let err = TenancyConfig::from_lookup(lookup_from(&[(ENV_SUBDOMAIN_ROUTING, "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { key: ENV_SUBDOMAIN_ROUTING, .. }));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: TenancyConfig =
            serde_json::from_str(r#"{"enable_subdomain_routing": true}"#).unwrap();
        assert!(config.enable_subdomain_routing);
        assert_eq!(config.impersonation_header, "X-Impersonate-Tenant");
        assert_eq!(config.validation_cache_capacity, 100);
    }
}
