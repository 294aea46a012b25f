//! Route definitions for the Inventory Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, require_admin},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Any authenticated user
        .nest("/companies", company_routes(state.clone()))
        .route(
            "/chatbot",
            post(handlers::chat)
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Administrators only
        .nest("/products", product_routes(state.clone()))
        .nest("/inventory", inventory_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Company routes; writes check the administrator role in the handler
fn company_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_companies).post(handlers::create_company),
        )
        .route(
            "/:nit",
            get(handlers::get_company)
                .put(handlers::update_company)
                .delete(handlers::delete_company),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product routes (administrators)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/convert-currency", get(handlers::convert_currency))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:id/suggestions", get(handlers::product_suggestions))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory routes (administrators)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::create_inventory),
        )
        .route("/predictions", get(handlers::inventory_predictions))
        .route("/company/:nit", get(handlers::company_inventory))
        .route("/export/:nit", get(handlers::export_inventory))
        .route("/export/:nit/email", post(handlers::email_inventory_export))
        .route(
            "/:id",
            get(handlers::get_inventory)
                .put(handlers::update_inventory)
                .delete(handlers::delete_inventory),
        )
        .route("/:id/adjust", post(handlers::adjust_inventory))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
