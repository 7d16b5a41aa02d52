//! Tenant-specific artifacts derived from shared configuration: cache keys, schema search paths, filter predicates.

pub mod cache;
pub mod filter;
pub mod schema;

pub use cache::*;
pub use filter::*;
pub use schema::*;
