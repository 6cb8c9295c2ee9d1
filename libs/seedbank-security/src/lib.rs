#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permission context passed through every hydration call, and the access
//! policy that decides which `(kind, id)` pairs a context may view.

pub mod access_scope;
pub mod constants;
pub mod context;
pub mod policy;

pub use access_scope::AccessScope;
pub use constants::ANONYMOUS_SUBJECT_ID;
pub use context::{SecurityContext, SecurityContextBuilder};
pub use policy::{AccessPolicy, AllowAll, PolicyRef, RestrictedPolicy};
