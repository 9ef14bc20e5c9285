//! gspaas Core
//!
//! Host-side model for the gspaas provider: attribute values, desired and
//! observed resource state, typed schemas, and the plan built from them.

pub mod differ;
pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
