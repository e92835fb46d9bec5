//! API routes

pub mod auth;
pub mod groups;
pub mod health;
pub mod memberships;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    auth::{require_admin, require_auth},
    state::AppState,
};

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public API routes (no auth required)
    let public_api_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup));

    // Management routes, admin group only
    let admin_api_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route(
            "/groups/:group_id",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/users-groups/:group_id/users/:user_id",
            post(memberships::add_user_to_group).delete(memberships::remove_user_from_group),
        )
        .route("/users-groups/users/:user_id", get(memberships::user_groups))
        .route("/users-groups/:group_id/users", get(memberships::group_users))
        // Last layer added runs first: authenticate, then check the admin group
        .layer(middleware::from_fn_with_state(auth_state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    let api_routes = Router::new()
        .merge(public_api_routes)
        .merge(admin_api_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}
