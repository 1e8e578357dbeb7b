use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::agent;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{self, AdminUser};
use crate::helpers::identity;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a new agent
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateAgentRequest {
    /// Username (must be unique, matched case-insensitively)
    #[validate(length(min = 1))]
    pub username: String,
    /// Email (must be unique, matched case-insensitively)
    #[validate(email)]
    pub email: String,
    /// Initial password, stored as a bcrypt hash
    #[validate(length(min = 6))]
    pub password: String,
}

/// Agent response model. Carries no password material in any form.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<agent::Model> for AgentResponse {
    fn from(model: agent::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// Get all agents
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "agents",
    responses(
        (status = 200, description = "Agents retrieved successfully", body = ApiResponse<Vec<AgentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_agents(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AgentResponse>>>, StatusCode> {
    debug!("Fetching all agents");

    match agent::Entity::find()
        .order_by_desc(agent::Column::CreatedAt)
        .all(&state.db)
        .await
    {
        Ok(agents) => {
            debug!("Retrieved {} agents", agents.len());
            let data: Vec<AgentResponse> = agents.into_iter().map(AgentResponse::from).collect();
            let response = ApiResponse {
                data,
                message: "Agents retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve agents: {}", db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create a new agent
#[utoipa::path(
    post,
    path = "/api/v1/agents",
    tag = "agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 201, description = "Agent created successfully", body = ApiResponse<AgentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin, request))]
pub async fn create_agent(
    _admin: AdminUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateAgentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AgentResponse>>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Creating agent with username: {}", request.username);

    // Duplicate checks are case-insensitive: "Ali" and "ali" collide.
    match identity::find_agent_by_username(&state.db, &request.username).await {
        Ok(Some(_)) => {
            warn!("Agent creation rejected: username '{}' taken", request.username);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Username already exists".to_string(),
                    code: "USERNAME_ALREADY_EXISTS".to_string(),
                    success: false,
                }),
            ));
        }
        Ok(None) => {}
        Err(db_error) => {
            error!("Failed to check username uniqueness: {}", db_error);
            return Err(database_error());
        }
    }

    match identity::find_agent_by_email(&state.db, &request.email).await {
        Ok(Some(_)) => {
            warn!("Agent creation rejected: email '{}' taken", request.email);
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Email already exists".to_string(),
                    code: "EMAIL_ALREADY_EXISTS".to_string(),
                    success: false,
                }),
            ));
        }
        Ok(None) => {}
        Err(db_error) => {
            error!("Failed to check email uniqueness: {}", db_error);
            return Err(database_error());
        }
    }

    let password_hash = match auth::hash_password(&request.password) {
        Ok(password_hash) => password_hash,
        Err(e) => {
            error!("Failed to hash agent password: {}", e);
            return Err(database_error());
        }
    };

    let new_agent = agent::ActiveModel {
        username: Set(request.username.clone()),
        email: Set(request.email.clone()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    match new_agent.insert(&state.db).await {
        Ok(agent_model) => {
            info!(
                "Agent created with ID: {}, username: {}",
                agent_model.id, agent_model.username
            );
            let response = ApiResponse {
                data: AgentResponse::from(agent_model),
                message: "Agent created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create agent '{}': {}", request.username, db_error);
            Err(database_error())
        }
    }
}

/// Delete an agent
#[utoipa::path(
    delete,
    path = "/api/v1/agents/{agent_id}",
    tag = "agents",
    params(
        ("agent_id" = i32, Path, description = "Agent ID"),
    ),
    responses(
        (status = 200, description = "Agent deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn delete_agent(
    _admin: AdminUser,
    Path(agent_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Deleting agent with ID: {}", agent_id);

    match agent::Entity::delete_by_id(agent_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Agent with ID {} deleted", agent_id);
                let response = ApiResponse {
                    data: format!("Agent {} deleted", agent_id),
                    message: "Agent deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Agent with ID {} not found for deletion", agent_id);
                Err((
                    StatusCode::NOT_FOUND,
                    Json(ErrorResponse {
                        error: "Agent not found".to_string(),
                        code: "NOT_FOUND".to_string(),
                        success: false,
                    }),
                ))
            }
        }
        Err(db_error) => {
            error!("Failed to delete agent with ID {}: {}", agent_id, db_error);
            Err(database_error())
        }
    }
}

fn database_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}
