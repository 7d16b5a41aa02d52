//! HTTP handlers for tenant introspection, tenant administration and protected-resource reads.

pub mod resource;
pub mod tenant;
