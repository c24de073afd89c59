//! Capability parameters.
//!
//! - [`ParamValue`] - Dynamic parameter values as they arrive in requests
//! - [`ParamDef`] - Schema entries describing each capability's parameters
//! - [`schema`] - The schema table of a capability

mod defs;
mod value;

pub use defs::*;
pub use value::ParamValue;
