//! Identity resolution and record-level authorization.

pub mod guard;
pub mod middleware;
pub mod models;

pub use guard::{extract_token, AccessGuard, Action};
pub use middleware::{auth_middleware, optional_auth_middleware};
pub use models::{AuthUser, MaybeAuthUser};
