use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
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
use crate::middleware::{
    claim_rate_limit_middleware, metrics_handler, metrics_middleware, require_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    assignments, auth, health, invites, patients, programs, task_templates, therapist_types,
    users,
};
use crate::services::auth::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub claim_rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let auth_service = AuthService::new(pool.clone(), &config.jwt)
        .expect("Failed to initialize auth service");

    // Claim attempts are rate limited per user to stop code guessing
    // (claim_rate_limit_per_minute = 0 disables the limiter).
    let claim_rate_limiter = if config.security.claim_rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.claim_rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        auth: auth_service,
        claim_rate_limiter,
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

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh));

    // The claim endpoint carries its own middleware stack: auth runs first
    // so the rate limiter can key on the caller's user id.
    let claim_routes = Router::new()
        .route("/api/v1/invites/claim", post(invites::claim_invite))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            claim_rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Authenticated routes; role checks happen per handler.
    let user_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/ensure-role", post(auth::ensure_role))
        // Task templates
        .route(
            "/api/v1/task-templates",
            get(task_templates::list_task_templates).post(task_templates::create_task_template),
        )
        .route(
            "/api/v1/task-templates/:template_id",
            get(task_templates::get_task_template)
                .put(task_templates::update_task_template)
                .delete(task_templates::delete_task_template),
        )
        // Programs
        .route(
            "/api/v1/programs",
            get(programs::list_programs).post(programs::create_program),
        )
        .route(
            "/api/v1/programs/:program_id",
            get(programs::get_program)
                .put(programs::update_program)
                .delete(programs::delete_program),
        )
        .route(
            "/api/v1/programs/:program_id/assignments",
            post(programs::assign_program),
        )
        // Assignments
        .route("/api/v1/assignments", get(assignments::list_assignments))
        .route(
            "/api/v1/assignments/:assignment_id",
            get(assignments::get_assignment).delete(assignments::deactivate_assignment),
        )
        .route(
            "/api/v1/assignments/:assignment_id/progress",
            patch(assignments::update_progress),
        )
        // Patients
        .route(
            "/api/v1/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/api/v1/patients/:patient_id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        );

    // Admin routes; every handler enforces the admin claim.
    let admin_routes = Router::new()
        .route("/api/v1/admin/users", get(users::list_users))
        .route("/api/v1/admin/users/:user_id/role", put(users::set_user_role))
        .route(
            "/api/v1/admin/invites",
            get(invites::list_invites).post(invites::create_invite),
        )
        .route(
            "/api/v1/admin/invites/:invite_id",
            get(invites::get_invite)
                .patch(invites::update_invite)
                .delete(invites::delete_invite),
        )
        .route(
            "/api/v1/admin/invites/:invite_id/revoke",
            post(invites::revoke_invite),
        )
        .route(
            "/api/v1/admin/therapist-types",
            get(therapist_types::list_therapist_types)
                .post(therapist_types::create_therapist_type),
        )
        .route(
            "/api/v1/admin/therapist-types/:type_id",
            delete(therapist_types::delete_therapist_type),
        );

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(claim_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
