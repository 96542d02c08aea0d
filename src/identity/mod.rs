//! Caller identity and tenant scope, threaded explicitly into every store call.
//! Keep the public surface thin and split implementation across sub-modules.

mod context;
mod organization;
mod principal;

pub use context::SecurityContext;
pub use organization::Organization;
pub use principal::User;
