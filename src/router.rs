use crate::handlers::{
    admin_amounts::{
        create_admin_amount, delete_admin_amount, get_admin_amounts, update_admin_amount,
    },
    agent_amounts::{
        create_agent_amount, delete_agent_amount, get_agent_amounts, get_my_amounts,
        update_agent_amount,
    },
    agents::{create_agent, delete_agent, get_agents},
    auth::{agent_login, login, signup},
    health::health_check,
    installments::{
        create_installment, delete_installment, get_installment, get_installments,
        update_installment,
    },
    users::get_users,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/agent-login", post(agent_login))
        .route("/api/v1/auth/signup", post(signup))
        // Agent directory routes (admin)
        .route("/api/v1/agents", get(get_agents))
        .route("/api/v1/agents", post(create_agent))
        .route("/api/v1/agents/:agent_id", delete(delete_agent))
        // User directory routes (admin)
        .route("/api/v1/users", get(get_users))
        // Installment CRUD routes
        .route("/api/v1/installments", get(get_installments))
        .route("/api/v1/installments", post(create_installment))
        .route("/api/v1/installments/:installment_id", get(get_installment))
        .route("/api/v1/installments/:installment_id", put(update_installment))
        .route("/api/v1/installments/:installment_id", delete(delete_installment))
        // Admin amount-ledger routes
        .route("/api/v1/admin-amounts", get(get_admin_amounts))
        .route("/api/v1/admin-amounts", post(create_admin_amount))
        .route("/api/v1/admin-amounts/:amount_id", put(update_admin_amount))
        .route("/api/v1/admin-amounts/:amount_id", delete(delete_admin_amount))
        // Agent amount-ledger routes
        .route("/api/v1/agent-amounts", get(get_agent_amounts))
        .route("/api/v1/agent-amounts", post(create_agent_amount))
        .route("/api/v1/agent-amounts/my-amounts", get(get_my_amounts))
        .route("/api/v1/agent-amounts/:amount_id", put(update_agent_amount))
        .route("/api/v1/agent-amounts/:amount_id", delete(delete_agent_amount))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
