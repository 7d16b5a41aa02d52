//! Tenant id validation: a memoized syntactic check and a separate registry-backed check.

use crate::config::VALIDATION_CACHE_CAPACITY;
use crate::error::AppError;
use crate::tenant::TenantDirectory;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Letters, digits, hyphen and underscore; 2 to 50 characters.
pub const TENANT_ID_PATTERN: &str = r"^[A-Za-z0-9_-]{2,50}$";

fn tenant_id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TENANT_ID_PATTERN).ok()).as_ref()
}

/// Uncached syntactic rule. Prefer [`TenantValidator::is_valid`] on hot paths.
pub fn is_valid_tenant_id(candidate: &str) -> bool {
    tenant_id_regex().is_some_and(|re| re.is_match(candidate))
}

/// Shared across requests. The memo is bounded and evicts least-recently-used ids;
/// racing validations of the same id may both compute, which is harmless.
#[derive(Clone)]
pub struct TenantValidator {
    memo: Cache<String, bool>,
}

impl Default for TenantValidator {
    fn default() -> Self {
        Self::with_capacity(VALIDATION_CACHE_CAPACITY)
    }
}

impl TenantValidator {
    pub fn with_capacity(capacity: u64) -> Self {
        let memo = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        TenantValidator { memo }
    }

    /// Syntactic check only. Never touches the registry.
    pub fn is_valid(&self, candidate: &str) -> bool {
        if let Some(hit) = self.memo.get(candidate) {
            return hit;
        }
        let valid = is_valid_tenant_id(candidate);
        self.memo.insert(candidate.to_string(), valid);
        valid
    }

    /// Accepts loosely-typed input (e.g. a claim value). Anything but a string is invalid.
    pub fn is_valid_value(&self, candidate: &Value) -> bool {
        match candidate {
            Value::String(s) => self.is_valid(s),
            _ => false,
        }
    }

    /// Authoritative check: syntactically valid, present in the registry and active.
    /// Invoked explicitly by write paths; resolution never calls it.
    pub async fn is_active_in_registry(
        &self,
        directory: &dyn TenantDirectory,
        tenant_id: &str,
    ) -> Result<bool, AppError> {
        if !self.is_valid(tenant_id) {
            return Ok(false);
        }
        directory.is_active(tenant_id).await
    }

    /// Number of memoized ids after pending evictions are applied.
    pub fn cached_entries(&self) -> u64 {
        self.memo.run_pending_tasks();
        self.memo.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::{MemoryTenantDirectory, NewTenant};
    use serde_json::json;

    #[test]
    fn accepts_well_formed_ids() {
        let v = TenantValidator::default();
        assert!(v.is_valid("tenant1"));
        assert!(v.is_valid("tenant_123"));
        assert!(v.is_valid("tenant-abc"));
        assert!(v.is_valid("ab"));
        assert!(v.is_valid(&"a".repeat(50)));
    }

    #[test]
    fn rejects_malformed_ids() {
        let v = TenantValidator::default();
        assert!(!v.is_valid(""));
        assert!(!v.is_valid("a"));
        assert!(!v.is_valid(&"a".repeat(51)));
        assert!(!v.is_valid(&"a".repeat(60)));
        assert!(!v.is_valid("tenant@123"));
        assert!(!v.is_valid("tenant 1"));
        assert!(!v.is_valid("tenänt"));
    }

    #[test]
    fn rejects_non_string_values() {
        let v = TenantValidator::default();
        assert!(!v.is_valid_value(&json!(null)));
        assert!(!v.is_valid_value(&json!(123)));
        assert!(!v.is_valid_value(&json!(["tenant1"])));
        assert!(v.is_valid_value(&json!("tenant1")));
    }

    #[test]
    fn memo_is_consistent_on_repeat() {
        let v = TenantValidator::default();
        assert!(!v.is_valid("bad!"));
        assert!(!v.is_valid("bad!"));
        assert!(v.is_valid("good"));
        assert!(v.is_valid("good"));
    }

    #[test]
    fn memo_stays_bounded() {
        let v = TenantValidator::with_capacity(3);
        for i in 0..20 {
            assert!(v.is_valid(&format!("tenant{}", i)));
        }
        assert!(v.cached_entries() <= 3);
    }

    #[test]
    fn shared_memo_answers_consistently_across_threads() {
        let v = TenantValidator::with_capacity(8);
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let v = v.clone();
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let id = format!("tenant{}", (i + t) % 12);
                        assert!(v.is_valid(&id), "{}", id);
                        assert!(!v.is_valid("bad id!"));
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert!(v.cached_entries() <= 8);
        assert!(v.is_valid("tenant3"));
        assert!(!v.is_valid("bad id!"));
    }

    #[tokio::test]
    async fn registry_check_requires_active_record() {
        let directory = MemoryTenantDirectory::default();
        directory
            .create(NewTenant::named("acme", "Acme Corp"), None)
            .await
            .unwrap();
        directory
            .create(NewTenant::named("globex", "Globex"), None)
            .await
            .unwrap();
        directory.deactivate("globex", None).await.unwrap();

        let v = TenantValidator::default();
        assert!(v.is_active_in_registry(&directory, "acme").await.unwrap());
        assert!(!v.is_active_in_registry(&directory, "globex").await.unwrap());
        assert!(!v.is_active_in_registry(&directory, "initech").await.unwrap());
        assert!(!v.is_active_in_registry(&directory, "x").await.unwrap());
    }
}
