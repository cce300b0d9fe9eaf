// handlers/protected/auth/mod.rs - Account endpoints for the caller's own identity

pub mod change_password;
pub mod me;

pub use change_password::change_password_post;
pub use me::me_get;
