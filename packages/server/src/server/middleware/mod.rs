// HTTP middleware
pub mod jwt_auth;
pub mod policy_gate;

pub use jwt_auth::*;
pub use policy_gate::*;
