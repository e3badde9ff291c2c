pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod permissions;
pub mod session;
pub mod utils;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser, MaybeUser};
pub use permissions::{require_permission, Permissions};
pub use utils::{extract_claims_from_context, require_owner_or_permission, require_role};
