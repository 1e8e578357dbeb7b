use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// HMAC secret used to sign and verify bearer tokens
    pub jwt_secret: String,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::login,
        crate::handlers::auth::agent_login,
        crate::handlers::auth::signup,
        crate::handlers::agents::get_agents,
        crate::handlers::agents::create_agent,
        crate::handlers::agents::delete_agent,
        crate::handlers::users::get_users,
        crate::handlers::installments::get_installments,
        crate::handlers::installments::get_installment,
        crate::handlers::installments::create_installment,
        crate::handlers::installments::update_installment,
        crate::handlers::installments::delete_installment,
        crate::handlers::admin_amounts::get_admin_amounts,
        crate::handlers::admin_amounts::create_admin_amount,
        crate::handlers::admin_amounts::update_admin_amount,
        crate::handlers::admin_amounts::delete_admin_amount,
        crate::handlers::agent_amounts::get_agent_amounts,
        crate::handlers::agent_amounts::get_my_amounts,
        crate::handlers::agent_amounts::create_agent_amount,
        crate::handlers::agent_amounts::update_agent_amount,
        crate::handlers::agent_amounts::delete_agent_amount,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            crate::auth::Role,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AgentLoginRequest,
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::UserSession,
            crate::handlers::auth::AgentSession,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::AgentLoginResponse,
            crate::handlers::agents::CreateAgentRequest,
            crate::handlers::agents::AgentResponse,
            crate::handlers::users::UserResponse,
            crate::handlers::installments::CreateInstallmentRequest,
            crate::handlers::installments::UpdateInstallmentRequest,
            crate::handlers::installments::InstallmentResponse,
            crate::handlers::admin_amounts::CreateAdminAmountRequest,
            crate::handlers::admin_amounts::UpdateAmountEntryRequest,
            crate::handlers::admin_amounts::AmountEntryResponse,
            crate::handlers::agent_amounts::CreateAgentAmountRequest,
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::auth::AgentLoginResponse>,
            ApiResponse<crate::handlers::agents::AgentResponse>,
            ApiResponse<Vec<crate::handlers::agents::AgentResponse>>,
            ApiResponse<Vec<crate::handlers::users::UserResponse>>,
            ApiResponse<crate::handlers::installments::InstallmentResponse>,
            ApiResponse<Vec<crate::handlers::installments::InstallmentResponse>>,
            ApiResponse<crate::handlers::admin_amounts::AmountEntryResponse>,
            ApiResponse<Vec<crate::handlers::admin_amounts::AmountEntryResponse>>,
            ApiResponse<String>,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and signup endpoints"),
        (name = "agents", description = "Agent directory administration"),
        (name = "users", description = "User directory administration"),
        (name = "installments", description = "Installment CRUD and lifecycle"),
        (name = "admin-amounts", description = "Admin-recorded amount ledger"),
        (name = "agent-amounts", description = "Agent-recorded amount ledger"),
    ),
    info(
        title = "FlexyPay API",
        description = "Installment tracking API - role-gated CRUD over agents, installments and amount ledgers",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
