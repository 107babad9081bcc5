mod helpers;
mod middleware;
mod token;

pub use middleware::{AuthError, OptionalIdentity, RequireAdmin, RequireIdentity};
pub use token::{TokenGenerator, parse_token};
