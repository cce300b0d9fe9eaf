pub mod app;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod repository;
pub mod services;
pub mod state;
pub mod table;

pub use app::router;
pub use state::AppState;
