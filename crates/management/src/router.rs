//! Grievance API router: public intake plus session-guarded admin endpoints.

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers::{self, ManagementState};

/// Build the full router. Admin routes other than login require a bearer session.
pub fn management_router(state: ManagementState) -> Router {
    let admin = Router::new()
        .route("/api/v1/admin/auth/logout", post(handlers::logout))
        .route("/api/v1/admin/view", get(handlers::current_view))
        .route("/api/v1/admin/complaints", get(handlers::list_complaints))
        .route("/api/v1/admin/complaints/:id/status", put(handlers::update_status))
        .route("/api/v1/admin/reports/overview", get(handlers::reports_overview))
        .route("/api/v1/admin/reports/chat", get(handlers::chat_report))
        .route(
            "/api/v1/admin/reports/conversations",
            get(handlers::recent_conversations),
        )
        .route(
            "/api/v1/admin/courses",
            get(handlers::get_courses).put(handlers::replace_courses),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        // Public intake
        .route("/api/v1/complaints", post(handlers::submit_complaint))
        .route("/api/v1/chat/messages", post(handlers::record_chat))
        // Auth
        .route("/api/v1/admin/auth/login", post(handlers::login))
        // Operational
        .route("/health", get(handlers::health))
        .merge(admin)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
