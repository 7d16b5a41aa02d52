//! The authenticated actor, as handed over by the authentication layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim keys searched, in order, for a tenant hint.
pub const TENANT_CLAIM_KEYS: &[&str] = &["tenant_id", "tenant", "org_id", "organization", "company_id"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Standard,
}

/// Identity-provider claims. Some providers hand over a raw JSON document that has not been parsed yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimSet {
    Structured(Map<String, Value>),
    Raw(String),
}

impl ClaimSet {
    /// First tenant claim present, stringified. A raw payload that is not a JSON object is an error.
    pub fn tenant_hint(&self) -> Result<Option<String>, serde_json::Error> {
        match self {
            ClaimSet::Structured(map) => Ok(tenant_from_map(map)),
            ClaimSet::Raw(raw) => {
                let map: Map<String, Value> = serde_json::from_str(raw)?;
                Ok(tenant_from_map(&map))
            }
        }
    }
}

fn tenant_from_map(map: &Map<String, Value>) -> Option<String> {
    TENANT_CLAIM_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(stringify_claim))
}

fn stringify_claim(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Option<i64>,
    pub username: String,
    pub role: Role,
    /// Tenant carried directly on the user record; preferred over claims.
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub claims: Option<ClaimSet>,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Principal {
            id: None,
            username: username.into(),
            role,
            tenant_id: None,
            claims: None,
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self::new(username, Role::Admin)
    }

    pub fn standard(username: impl Into<String>) -> Self {
        Self::new(username, Role::Standard)
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_claims(mut self, claims: ClaimSet) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
