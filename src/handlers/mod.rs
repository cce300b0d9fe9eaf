// handlers/mod.rs - Tiered handler layout
//
// Public (no auth) → Protected (bearer JWT) → role-gated user administration.
// Role gates are attached per route in `app.rs`; handlers here assume the
// middleware in front of them has already run.

pub mod protected;
pub mod public;
