use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::entities::{JobCategory, JobType, Location, ProductGroup};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_role, RoleGuard, ADMIN_ROLES, SUPER_ADMIN_ONLY};
use crate::repository::Slugged;
use crate::services::Catalog;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/version", get(public::system::version))
        .route("/api/ping", get(public::system::ping))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware, outermost first
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/verify-email", get(auth::verify_email_get))
}

/// Everything behind the bearer token. The JWT layer is added last so it
/// wraps the per-route role guards and runs before them.
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/me", get(auth::me_get))
        .route("/api/auth/change-password", post(auth::change_password_post))
        .merge(catalog_routes::<Location>("/api/locations"))
        .merge(catalog_routes::<JobCategory>("/api/job-categories"))
        .merge(catalog_routes::<JobType>("/api/job-types"))
        .merge(catalog_routes::<ProductGroup>("/api/product-groups"))
        .merge(user_routes())
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn catalog_routes<E>(base: &str) -> Router<AppState>
where
    E: Slugged + Serialize,
    Catalog<E>: FromRef<AppState>,
{
    use protected::catalog;

    Router::new()
        .route(base, get(catalog::list::<E>).post(catalog::create::<E>))
        .route(
            &format!("{base}/:slug"),
            get(catalog::show::<E>)
                .put(catalog::update::<E>)
                .delete(catalog::delete::<E>),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    let admins = middleware::from_fn_with_state(RoleGuard(ADMIN_ROLES), require_role);
    let super_admins = middleware::from_fn_with_state(RoleGuard(SUPER_ADMIN_ONLY), require_role);

    Router::new()
        .route(
            "/api/users",
            get(users::list_users)
                .post(users::create_user)
                .route_layer(admins.clone()),
        )
        .route(
            "/api/users/:id",
            delete(users::delete_user)
                .route_layer(admins)
                .merge(put(users::update_user).route_layer(super_admins)),
        )
        .route("/api/users/:id/change-password", post(users::change_user_password))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
