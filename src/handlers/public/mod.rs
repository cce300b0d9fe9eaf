// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service probes plus the token acquisition flow: register, verify email, login.

pub mod auth;
pub mod system;
