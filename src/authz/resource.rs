//! Protected resource kinds and the tenant-label capability.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Database,
    Datasource,
    Dashboard,
    Chart,
    SavedQuery,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Database,
        ResourceKind::Datasource,
        ResourceKind::Dashboard,
        ResourceKind::Chart,
        ResourceKind::SavedQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Database => "Database",
            ResourceKind::Datasource => "Datasource",
            ResourceKind::Dashboard => "Dashboard",
            ResourceKind::Chart => "Chart",
            ResourceKind::SavedQuery => "SavedQuery",
        }
    }

    /// URL segment used by the resource routes.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceKind::Database => "databases",
            ResourceKind::Datasource => "datasets",
            ResourceKind::Dashboard => "dashboards",
            ResourceKind::Chart => "charts",
            ResourceKind::SavedQuery => "saved_queries",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.path_segment() == segment)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability of resources that can carry a tenant label.
pub trait TenantLabeled {
    /// `None` means the resource is unscoped.
    fn tenant_label(&self) -> Option<&str>;
}

pub trait ProtectedResource: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn resource_id(&self) -> String;

    /// `None` when this kind cannot carry a label at all.
    fn tenant_labeled(&self) -> Option<&dyn TenantLabeled> {
        None
    }

    /// Database a datasource reads from; its label is checked too.
    fn owning_database(&self) -> Option<&dyn ProtectedResource> {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: i64,
    pub database_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    pub id: i64,
    pub table_name: String,
    pub database: Database,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: i64,
    pub dashboard_title: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: i64,
    pub slice_name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    pub label: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

macro_rules! labeled_resource {
    ($ty:ty, $kind:expr) => {
        impl TenantLabeled for $ty {
            fn tenant_label(&self) -> Option<&str> {
                self.tenant_id.as_deref()
            }
        }

        impl ProtectedResource for $ty {
            fn kind(&self) -> ResourceKind {
                $kind
            }

            fn resource_id(&self) -> String {
                self.id.to_string()
            }

            fn tenant_labeled(&self) -> Option<&dyn TenantLabeled> {
                Some(self)
            }
        }
    };
}

labeled_resource!(Database, ResourceKind::Database);
labeled_resource!(Dashboard, ResourceKind::Dashboard);
labeled_resource!(Chart, ResourceKind::Chart);
labeled_resource!(SavedQuery, ResourceKind::SavedQuery);

impl TenantLabeled for Datasource {
    fn tenant_label(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }
}

impl ProtectedResource for Datasource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Datasource
    }

    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn tenant_labeled(&self) -> Option<&dyn TenantLabeled> {
        Some(self)
    }

    fn owning_database(&self) -> Option<&dyn ProtectedResource> {
        Some(&self.database)
    }
}

/// Untyped row from a resource catalog. `labeled` is false when the backing table has no tenant column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceRow {
    pub kind: ResourceKind,
    pub id: String,
    pub tenant_id: Option<String>,
    #[serde(skip)]
    pub labeled: bool,
    #[serde(skip)]
    pub owner: Option<Box<ResourceRow>>,
    pub data: Value,
}

impl ResourceRow {
    pub fn labeled(kind: ResourceKind, id: impl Into<String>, tenant_id: Option<&str>, data: Value) -> Self {
        ResourceRow {
            kind,
            id: id.into(),
            tenant_id: tenant_id.map(str::to_string),
            labeled: true,
            owner: None,
            data,
        }
    }

    pub fn with_owner(mut self, owner: ResourceRow) -> Self {
        self.owner = Some(Box::new(owner));
        self
    }
}

impl TenantLabeled for ResourceRow {
    fn tenant_label(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }
}

impl ProtectedResource for ResourceRow {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn resource_id(&self) -> String {
        self.id.clone()
    }

    fn tenant_labeled(&self) -> Option<&dyn TenantLabeled> {
        self.labeled.then_some(self as &dyn TenantLabeled)
    }

    fn owning_database(&self) -> Option<&dyn ProtectedResource> {
        self.owner.as_deref().map(|o| o as &dyn ProtectedResource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_path_segment(kind.path_segment()), Some(kind));
        }
        assert_eq!(ResourceKind::from_path_segment("users"), None);
    }

    #[test]
    fn datasource_exposes_owning_database() {
        let ds = Datasource {
            id: 3,
            table_name: "orders".into(),
            database: Database {
                id: 1,
                database_name: "warehouse".into(),
                tenant_id: Some("acme".into()),
            },
            tenant_id: None,
        };
        let owner = ds.owning_database().unwrap();
        assert_eq!(owner.kind(), ResourceKind::Database);
        assert_eq!(owner.tenant_labeled().unwrap().tenant_label(), Some("acme"));
        assert_eq!(ds.tenant_labeled().unwrap().tenant_label(), None);
    }

    #[test]
    fn unlabeled_row_has_no_capability() {
        let mut row = ResourceRow::labeled(ResourceKind::Chart, "9", Some("acme"), Value::Null);
        row.labeled = false;
        assert!(row.tenant_labeled().is_none());
    }
}
