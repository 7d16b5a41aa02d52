//! Tenant-scoped authorization: resource capabilities and the gate in front of the base policy.

mod gate;
mod resource;

pub use gate::*;
pub use resource::*;
