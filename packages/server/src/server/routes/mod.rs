// HTTP routes
pub mod health;
pub mod permissions;

pub use health::*;
pub use permissions::*;
