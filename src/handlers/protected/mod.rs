// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which puts an
// `AuthUser` into the request extensions. `users` routes additionally sit
// behind a role guard.

pub mod auth;
pub mod catalog;
pub mod users;
