//! Tenant filter predicates over protected-resource tables.

use crate::authz::ResourceKind;
use crate::sql::{quoted, QueryBuf};
use crate::tenant::TenantId;

/// Foreign key from a resource to the database it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnerLink {
    pub foreign_key: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub tenant_column: &'static str,
}

/// Storage definition of one resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceTable {
    pub kind: ResourceKind,
    pub table: &'static str,
    pub id_column: &'static str,
    /// `None` when the table cannot carry a tenant label.
    pub tenant_column: Option<&'static str>,
    pub owner: Option<OwnerLink>,
}

pub const TENANT_COLUMN: &str = "tenant_id";

const DATABASE_OWNER: OwnerLink = OwnerLink {
    foreign_key: "database_id",
    table: "dbs",
    id_column: "id",
    tenant_column: TENANT_COLUMN,
};

pub const DATABASES: ResourceTable = ResourceTable {
    kind: ResourceKind::Database,
    table: "dbs",
    id_column: "id",
    tenant_column: Some(TENANT_COLUMN),
    owner: None,
};

pub const DATASETS: ResourceTable = ResourceTable {
    kind: ResourceKind::Datasource,
    table: "tables",
    id_column: "id",
    tenant_column: Some(TENANT_COLUMN),
    owner: Some(DATABASE_OWNER),
};

pub const DASHBOARDS: ResourceTable = ResourceTable {
    kind: ResourceKind::Dashboard,
    table: "dashboards",
    id_column: "id",
    tenant_column: Some(TENANT_COLUMN),
    owner: None,
};

pub const CHARTS: ResourceTable = ResourceTable {
    kind: ResourceKind::Chart,
    table: "slices",
    id_column: "id",
    tenant_column: Some(TENANT_COLUMN),
    owner: None,
};

pub const SAVED_QUERIES: ResourceTable = ResourceTable {
    kind: ResourceKind::SavedQuery,
    table: "saved_query",
    id_column: "id",
    tenant_column: Some(TENANT_COLUMN),
    owner: None,
};

pub const PROTECTED_TABLES: [ResourceTable; 5] = [DATABASES, DATASETS, DASHBOARDS, CHARTS, SAVED_QUERIES];

impl ResourceTable {
    pub fn for_kind(kind: ResourceKind) -> &'static ResourceTable {
        match kind {
            ResourceKind::Database => &DATABASES,
            ResourceKind::Datasource => &DATASETS,
            ResourceKind::Dashboard => &DASHBOARDS,
            ResourceKind::Chart => &CHARTS,
            ResourceKind::SavedQuery => &SAVED_QUERIES,
        }
    }
}

/// Equality predicate on a table's tenant label, reusable across queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantFilter {
    pub column: &'static str,
    pub tenant: TenantId,
    /// Also admit rows whose label is NULL.
    pub include_unscoped: bool,
    pub owner: Option<OwnerLink>,
}

/// Predicate for `table` scoped to `tenant`, or `None` when the table has no tenant column.
/// No predicate means no filtering, never "match nothing".
pub fn tenant_filter(table: &ResourceTable, tenant: &TenantId, include_unscoped: bool) -> Option<TenantFilter> {
    let column = table.tenant_column?;
    Some(TenantFilter {
        column,
        tenant: tenant.clone(),
        include_unscoped,
        owner: table.owner,
    })
}

impl TenantFilter {
    /// In-process evaluation, for catalogs that are not backed by SQL.
    /// `owner_label` is the owning database's label, when there is one.
    pub fn matches(&self, label: Option<&str>, owner_label: Option<&str>) -> bool {
        let own = match label {
            Some(l) => l == self.tenant.as_str(),
            None => self.include_unscoped,
        };
        let owner_ok = owner_label.map_or(true, |l| l == self.tenant.as_str());
        own && owner_ok
    }

    /// WHERE fragment against `alias`, binding the tenant once.
    pub fn push_sql(&self, q: &mut QueryBuf, alias: &str) -> String {
        let n = q.push_param(self.tenant.as_str());
        let col = format!("{}.{}", alias, quoted(self.column));
        let mut clause = if self.include_unscoped {
            format!("({} = ${} OR {} IS NULL)", col, n, col)
        } else {
            format!("{} = ${}", col, n)
        };
        if let Some(owner) = &self.owner {
            let fk = format!("{}.{}", alias, quoted(owner.foreign_key));
            clause.push_str(&format!(
                " AND ({fk} IS NULL OR {fk} IN (SELECT o.{id} FROM {table} o WHERE o.{tc} IS NULL OR o.{tc} = ${n}))",
                fk = fk,
                id = quoted(owner.id_column),
                table = quoted(owner.table),
                tc = quoted(owner.tenant_column),
                n = n,
            ));
        }
        clause
    }
}
