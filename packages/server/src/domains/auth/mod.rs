//! Auth domain - session tokens
//!
//! Sessions are signed JWTs carrying the principal's internal and public
//! identifiers. Verification happens in `server::middleware::jwt_auth`.

pub mod jwt;

pub use jwt::{Claims, JwtService};
