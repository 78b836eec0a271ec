use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware};
use crate::routes::{
    assignments, audit_logs, branches, devices, employees, health, requests, returns,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        // Branches
        .route(
            "/api/v1/branches",
            get(branches::list_branches).post(branches::create_branch),
        )
        .route(
            "/api/v1/branches/:id",
            get(branches::get_branch)
                .put(branches::update_branch)
                .delete(branches::delete_branch),
        )
        // Employees
        .route(
            "/api/v1/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/v1/employees/:id",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        // Devices
        .route(
            "/api/v1/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route("/api/v1/devices/stats", get(devices::device_stats))
        .route(
            "/api/v1/devices/:id",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route(
            "/api/v1/devices/:id/change-status",
            post(devices::change_device_status),
        )
        .route(
            "/api/v1/devices/:id/mark-lost",
            post(devices::mark_device_lost),
        )
        .route(
            "/api/v1/devices/:id/mark-retired",
            post(devices::mark_device_retired),
        )
        // Device requests
        .route(
            "/api/v1/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/api/v1/requests/:id",
            get(requests::get_request)
                .put(requests::update_request)
                .delete(requests::delete_request),
        )
        // Assignments
        .route(
            "/api/v1/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/api/v1/assignments/:id",
            get(assignments::get_assignment).put(assignments::update_assignment),
        )
        .route(
            "/api/v1/assignments/:id/sign-letter",
            post(assignments::sign_letter),
        )
        .route(
            "/api/v1/assignments/:id/return",
            post(assignments::file_return),
        )
        // Returns
        .route(
            "/api/v1/returns",
            get(returns::list_returns).post(returns::create_return),
        )
        .route("/api/v1/returns/:id", get(returns::get_return))
        // Audit trail
        .route("/api/v1/audit-logs", get(audit_logs::list_audit_logs));

    // Public routes (no actor headers required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
