use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use chrono::Utc;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{self, Role};
use crate::helpers::identity;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for admin/user login
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Account email
    #[validate(length(min = 1))]
    pub email: String,
    /// Account password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for agent login
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct AgentLoginRequest {
    /// Agent username (matched case-insensitively)
    #[validate(length(min = 1))]
    pub username: String,
    /// Agent password
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request body for self-service signup
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Account email (must be unique)
    #[validate(email)]
    pub email: String,
    /// Account password
    #[validate(length(min = 6))]
    pub password: String,
    /// Display name
    #[validate(length(min = 1))]
    pub full_name: String,
}

/// Identity payload returned alongside a token for users and admins
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

/// Identity payload returned alongside a token for agents
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Successful admin/user login payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSession,
}

/// Successful agent login payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentLoginResponse {
    pub token: String,
    pub user: AgentSession,
}

/// The constant credential-failure response. Unknown identity and wrong
/// password are indistinguishable to the caller.
fn invalid_credentials() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials".to_string(),
            code: "INVALID_CREDENTIALS".to_string(),
            success: false,
        }),
    )
}

fn login_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Failed to process login".to_string(),
            code: "INTERNAL_ERROR".to_string(),
            success: false,
        }),
    )
}

/// Authenticate an admin or user by email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<LoginRequest>>,
) -> Result<Json<ApiResponse<LoginResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Login attempt for email: {}", request.email);

    let user_model = match user::Entity::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
    {
        Ok(Some(user_model)) => user_model,
        Ok(None) => {
            warn!("Login failed: unknown email");
            return Err(invalid_credentials());
        }
        Err(db_error) => {
            error!("Failed to look up user during login: {}", db_error);
            return Err(login_error());
        }
    };

    match auth::verify_password(&request.password, &user_model.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed for user {}: password mismatch", user_model.id);
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!("Password verification error: {}", e);
            return Err(login_error());
        }
    }

    let role = Role::from(user_model.role);
    let token = auth::create_token(&state.jwt_secret, user_model.id, role, &user_model.email)
        .map_err(|_| login_error())?;

    info!("User {} logged in with role {}", user_model.id, role.as_str());
    let response = ApiResponse {
        data: LoginResponse {
            token,
            user: UserSession {
                id: user_model.id,
                email: user_model.email,
                role,
                full_name: user_model.full_name,
            },
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Authenticate an agent by username and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/agent-login",
    tag = "auth",
    request_body = AgentLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AgentLoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn agent_login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<AgentLoginRequest>>,
) -> Result<Json<ApiResponse<AgentLoginResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Agent login attempt for username: {}", request.username);

    let agent_model = match identity::find_agent_by_username(&state.db, &request.username).await {
        Ok(Some(agent_model)) => agent_model,
        Ok(None) => {
            warn!("Agent login failed: unknown username");
            return Err(invalid_credentials());
        }
        Err(db_error) => {
            error!("Failed to look up agent during login: {}", db_error);
            return Err(login_error());
        }
    };

    match auth::verify_password(&request.password, &agent_model.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                "Agent login failed for agent {}: password mismatch",
                agent_model.id
            );
            return Err(invalid_credentials());
        }
        Err(e) => {
            error!("Password verification error: {}", e);
            return Err(login_error());
        }
    }

    let token = auth::create_token(
        &state.jwt_secret,
        agent_model.id,
        Role::Agent,
        &agent_model.email,
    )
    .map_err(|_| login_error())?;

    info!("Agent {} ({}) logged in", agent_model.id, agent_model.username);
    let response = ApiResponse {
        data: AgentLoginResponse {
            token,
            user: AgentSession {
                id: agent_model.id,
                username: agent_model.username,
                email: agent_model.email,
                role: Role::Agent,
            },
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn signup(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<SignupRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Signup attempt for email: {}", request.email);

    let existing = match user::Entity::find()
        .filter(user::Column::Email.eq(request.email.clone()))
        .one(&state.db)
        .await
    {
        Ok(existing) => existing,
        Err(db_error) => {
            error!("Failed to check for existing user: {}", db_error);
            return Err(login_error());
        }
    };

    if existing.is_some() {
        warn!("Signup rejected: email already registered");
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "User already exists".to_string(),
                code: "USER_ALREADY_EXISTS".to_string(),
                success: false,
            }),
        ));
    }

    let password_hash = match auth::hash_password(&request.password) {
        Ok(password_hash) => password_hash,
        Err(e) => {
            error!("Failed to hash password during signup: {}", e);
            return Err(login_error());
        }
    };

    let new_user = user::ActiveModel {
        email: Set(request.email.clone()),
        password_hash: Set(password_hash),
        role: Set(user::UserRole::User),
        full_name: Set(request.full_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let user_model = match new_user.insert(&state.db).await {
        Ok(user_model) => user_model,
        Err(db_error) => {
            error!("Failed to create user account: {}", db_error);
            return Err(login_error());
        }
    };

    let token = auth::create_token(
        &state.jwt_secret,
        user_model.id,
        Role::User,
        &user_model.email,
    )
    .map_err(|_| login_error())?;

    info!("User account {} created via signup", user_model.id);
    let response = ApiResponse {
        data: LoginResponse {
            token,
            user: UserSession {
                id: user_model.id,
                email: user_model.email,
                role: Role::User,
                full_name: user_model.full_name,
            },
        },
        message: "Account created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}
