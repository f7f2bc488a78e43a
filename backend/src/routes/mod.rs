//! Route definitions for the Inventory Management Platform

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/user", user_routes(state.clone()))
        // Protected routes
        .nest("/users", user_management_routes(state.clone()))
        .nest("/organizations", organization_routes(state.clone()))
        .nest("/categories", category_routes(state.clone()))
        .nest("/suppliers", supplier_routes(state.clone()))
        .nest("/items", item_routes(state.clone()))
        .nest("/orders", order_routes(state.clone()))
        .nest("/reports", report_routes(state))
}

/// Registration, login and the caller's own profile
fn user_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route("/profile", patch(handlers::update_profile))
        .route("/change-password", patch(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// User management routes (protected)
fn user_management_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Organization routes (protected)
fn organization_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_organizations))
        .route("/me", get(handlers::get_my_organization))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Category routes (protected)
fn category_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:category_id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier routes (protected)
fn supplier_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Item routes (protected)
fn item_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Order routes (protected)
fn order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Report routes (protected, admin only)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/summaryReport", get(handlers::summary_report))
        .route(
            "/earningsReportLast7Days",
            get(handlers::earnings_last_7_days),
        )
        .route(
            "/earningsReportLast3Months",
            get(handlers::earnings_last_3_months),
        )
        .route("/inventoryValuation", get(handlers::inventory_valuation))
        .route("/salesReport", get(handlers::sales_report))
        .route("/orderHistory", get(handlers::order_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig, JwtConfig, LoggingConfig, ServerConfig};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Router over a pool that never connects; only paths that fail before
    /// touching the database are exercised
    fn test_app() -> Router {
        let config = Config {
            environment: "test".into(),
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".into(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/unused".into(),
                max_connections: 1,
                min_connections: 0,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry: 3600,
            },
            logging: LoggingConfig::default(),
        };
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let state = AppState {
            db,
            config: Arc::new(config),
        };
        Router::new()
            .nest("/api", api_routes(state.clone()))
            .with_state(state)
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        for uri in ["/api/items", "/api/orders", "/api/reports/summaryReport", "/api/user/me"] {
            let response = test_app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/categories")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn registration_is_validated_before_storage() {
        let body = serde_json::json!({
            "username": "owner",
            "email": "not-an-email",
            "password": "long-enough",
            "organizationName": "Acme",
            "country": "US",
            "currency": "USD"
        });
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/user/register")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
