//! Config validation: header names, default tenant, cache bounds, fallback schema.

use crate::config::TenancyConfig;
use crate::error::ConfigError;
use crate::validator::is_valid_tenant_id;
use axum::http::HeaderName;

pub fn validate(config: &TenancyConfig) -> Result<(), ConfigError> {
    for (key, name) in [
        ("tenant_header", &config.tenant_header),
        ("impersonation_header", &config.impersonation_header),
    ] {
        if name.is_empty() || HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(ConfigError::InvalidSetting {
                key,
                reason: format!("'{}' is not a valid header name", name),
            });
        }
    }

    if let Some(default_tenant) = &config.default_tenant_id {
        if !is_valid_tenant_id(default_tenant) {
            return Err(ConfigError::InvalidSetting {
                key: "default_tenant_id",
                reason: format!("'{}' is not a valid tenant id", default_tenant),
            });
        }
    }

    if config.validation_cache_capacity == 0 {
        return Err(ConfigError::InvalidSetting {
            key: "validation_cache_capacity",
            reason: "must be greater than zero".into(),
        });
    }

    if !is_valid_tenant_id(&config.search_path_fallback_schema) {
        return Err(ConfigError::InvalidSetting {
            key: "search_path_fallback_schema",
            reason: format!("'{}' is not a valid schema name", config.search_path_fallback_schema),
        });
    }

    Ok(())
}
