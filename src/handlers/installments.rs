use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::{agent, installment};
use model::entities::installment::InstallmentStatus;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AdminUser, AuthUser, Role};
use crate::helpers::identity;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a new installment.
///
/// Admin callers must name a target agent; agents and users create
/// self-owned installments and any `agentName` is ignored.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstallmentRequest {
    #[validate(length(min = 1))]
    pub title: String,
    pub amount: Decimal,
    /// Due date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Target agent username (admin only)
    pub agent_name: Option<String>,
    /// Initial status; only honored for admin callers
    pub status: Option<String>,
}

/// Request body for updating an installment (admin only, partial)
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstallmentRequest {
    pub title: Option<String>,
    pub amount: Option<Decimal>,
    /// Due date (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    /// Reassign to another agent by username
    pub agent_name: Option<String>,
}

/// Installment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    pub id: i32,
    pub title: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: String,
    pub agent_id: Option<i32>,
    pub agent_name: Option<String>,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<installment::Model> for InstallmentResponse {
    fn from(model: installment::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            amount: model.amount,
            date: model.due_date,
            status: status_to_string(model.status),
            agent_id: model.agent_id,
            agent_name: model.agent_name,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn status_to_string(status: InstallmentStatus) -> String {
    match status {
        InstallmentStatus::Pending => "pending",
        InstallmentStatus::Approved => "approved",
    }
    .to_string()
}

fn parse_status(status: &str) -> Result<InstallmentStatus, String> {
    match status {
        "pending" => Ok(InstallmentStatus::Pending),
        "approved" => Ok(InstallmentStatus::Approved),
        other => Err(format!("Unknown status '{}'", other)),
    }
}

fn validation_error(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "VALIDATION_ERROR".to_string(),
            success: false,
        }),
    )
}

fn agent_not_found(status: StatusCode) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: "Agent not found".to_string(),
            code: "AGENT_NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Installment not found".to_string(),
            code: "NOT_FOUND".to_string(),
            success: false,
        }),
    )
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

/// Get installments, filtered to the caller's own records for non-admins
#[utoipa::path(
    get,
    path = "/api/v1/installments",
    tag = "installments",
    responses(
        (status = 200, description = "Installments retrieved successfully", body = ApiResponse<Vec<InstallmentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth))]
pub async fn get_installments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InstallmentResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let claims = auth.0;
    debug!(
        "Fetching installments for caller {} with role {}",
        claims.id,
        claims.role.as_str()
    );

    let mut query = installment::Entity::find().order_by_desc(installment::Column::CreatedAt);

    // Role-scoped data gate: non-admins only ever see their own rows.
    query = match claims.role {
        Role::Admin => query,
        Role::Agent => query.filter(installment::Column::AgentId.eq(claims.id)),
        Role::User => query.filter(installment::Column::UserId.eq(claims.id)),
    };

    match query.all(&state.db).await {
        Ok(installments) => {
            debug!("Retrieved {} installments", installments.len());
            let data: Vec<InstallmentResponse> = installments
                .into_iter()
                .map(InstallmentResponse::from)
                .collect();
            let response = ApiResponse {
                data,
                message: "Installments retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve installments: {}", db_error);
            Err(database_error())
        }
    }
}

/// Get a single installment; only the owner or an admin may read it
#[utoipa::path(
    get,
    path = "/api/v1/installments/{installment_id}",
    tag = "installments",
    params(
        ("installment_id" = i32, Path, description = "Installment ID"),
    ),
    responses(
        (status = 200, description = "Installment retrieved successfully", body = ApiResponse<InstallmentResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller does not own this installment", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth))]
pub async fn get_installment(
    auth: AuthUser,
    Path(installment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InstallmentResponse>>, (StatusCode, Json<ErrorResponse>)> {
    let claims = auth.0;
    debug!("Fetching installment {}", installment_id);

    let installment_model = match installment::Entity::find_by_id(installment_id)
        .one(&state.db)
        .await
    {
        Ok(Some(installment_model)) => installment_model,
        Ok(None) => {
            warn!("Installment {} not found", installment_id);
            return Err(not_found());
        }
        Err(db_error) => {
            error!("Failed to retrieve installment {}: {}", installment_id, db_error);
            return Err(database_error());
        }
    };

    let is_owner = match claims.role {
        Role::Admin => true,
        Role::Agent => installment_model.agent_id == Some(claims.id),
        Role::User => installment_model.user_id == Some(claims.id),
    };

    if !is_owner {
        warn!(
            "Caller {} denied access to installment {}",
            claims.id, installment_id
        );
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Forbidden".to_string(),
                code: "FORBIDDEN".to_string(),
                success: false,
            }),
        ));
    }

    let response = ApiResponse {
        data: InstallmentResponse::from(installment_model),
        message: "Installment retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Create an installment.
///
/// Admins assign to an agent by username; agents and users create
/// self-owned records, always starting as `pending`.
#[utoipa::path(
    post,
    path = "/api/v1/installments",
    tag = "installments",
    request_body = CreateInstallmentRequest,
    responses(
        (status = 201, description = "Installment created successfully", body = ApiResponse<InstallmentResponse>),
        (status = 400, description = "Invalid request or unknown agent", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth, request))]
pub async fn create_installment(
    auth: AuthUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateInstallmentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<InstallmentResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    let claims = auth.0;
    debug!(
        "Creating installment '{}' for caller {} with role {}",
        request.title,
        claims.id,
        claims.role.as_str()
    );

    if request.amount < Decimal::ZERO {
        return Err(validation_error("Amount must be a non-negative number"));
    }

    let (agent_id, agent_name, user_id, status) = match claims.role {
        Role::Admin => {
            let Some(ref requested_name) = request.agent_name else {
                return Err(validation_error("agentName is required"));
            };

            // Owner must exist before anything is persisted.
            let agent_model = match identity::find_agent_by_username(&state.db, requested_name).await
            {
                Ok(Some(agent_model)) => agent_model,
                Ok(None) => {
                    warn!("Installment rejected: agent '{}' not found", requested_name);
                    return Err(agent_not_found(StatusCode::BAD_REQUEST));
                }
                Err(db_error) => {
                    error!("Failed to resolve agent '{}': {}", requested_name, db_error);
                    return Err(database_error());
                }
            };

            let status = match request.status.as_deref() {
                Some(status_str) => match parse_status(status_str) {
                    Ok(status) => status,
                    Err(message) => return Err(validation_error(&message)),
                },
                None => InstallmentStatus::Pending,
            };

            (
                Some(agent_model.id),
                Some(agent_model.username),
                None,
                status,
            )
        }
        Role::Agent => {
            let agent_model = match agent::Entity::find_by_id(claims.id).one(&state.db).await {
                Ok(Some(agent_model)) => agent_model,
                Ok(None) => {
                    warn!("Authenticated agent {} no longer exists", claims.id);
                    return Err(agent_not_found(StatusCode::NOT_FOUND));
                }
                Err(db_error) => {
                    error!("Failed to resolve agent {}: {}", claims.id, db_error);
                    return Err(database_error());
                }
            };
            (
                Some(agent_model.id),
                Some(agent_model.username),
                None,
                InstallmentStatus::Pending,
            )
        }
        Role::User => (None, None, Some(claims.id), InstallmentStatus::Pending),
    };

    let new_installment = installment::ActiveModel {
        title: Set(request.title.clone()),
        amount: Set(request.amount),
        due_date: Set(request.date),
        status: Set(status),
        agent_id: Set(agent_id),
        agent_name: Set(agent_name),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };

    match new_installment.insert(&state.db).await {
        Ok(installment_model) => {
            info!("Installment created with ID: {}", installment_model.id);
            let response = ApiResponse {
                data: InstallmentResponse::from(installment_model),
                message: "Installment created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create installment: {}", db_error);
            Err(database_error())
        }
    }
}

/// Update an installment (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/installments/{installment_id}",
    tag = "installments",
    params(
        ("installment_id" = i32, Path, description = "Installment ID"),
    ),
    request_body = UpdateInstallmentRequest,
    responses(
        (status = 200, description = "Installment updated successfully", body = ApiResponse<InstallmentResponse>),
        (status = 400, description = "Invalid request, unknown agent or invalid transition", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin, request))]
pub async fn update_installment(
    _admin: AdminUser,
    Path(installment_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateInstallmentRequest>,
) -> Result<Json<ApiResponse<InstallmentResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Updating installment {}", installment_id);

    let existing = match installment::Entity::find_by_id(installment_id)
        .one(&state.db)
        .await
    {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Installment {} not found for update", installment_id);
            return Err(not_found());
        }
        Err(db_error) => {
            error!("Failed to look up installment {}: {}", installment_id, db_error);
            return Err(database_error());
        }
    };

    let current_status = existing.status;
    let mut updated: installment::ActiveModel = existing.into();

    if let Some(title) = request.title {
        updated.title = Set(title);
    }
    if let Some(amount) = request.amount {
        if amount < Decimal::ZERO {
            return Err(validation_error("Amount must be a non-negative number"));
        }
        updated.amount = Set(amount);
    }
    if let Some(date) = request.date {
        updated.due_date = Set(date);
    }

    if let Some(ref requested_name) = request.agent_name {
        let agent_model = match identity::find_agent_by_username(&state.db, requested_name).await {
            Ok(Some(agent_model)) => agent_model,
            Ok(None) => {
                warn!("Reassignment rejected: agent '{}' not found", requested_name);
                return Err(agent_not_found(StatusCode::BAD_REQUEST));
            }
            Err(db_error) => {
                error!("Failed to resolve agent '{}': {}", requested_name, db_error);
                return Err(database_error());
            }
        };
        updated.agent_id = Set(Some(agent_model.id));
        updated.agent_name = Set(Some(agent_model.username));
        updated.user_id = Set(None);
    }

    if let Some(ref status_str) = request.status {
        let next_status = match parse_status(status_str) {
            Ok(next_status) => next_status,
            Err(message) => return Err(validation_error(&message)),
        };

        // The lifecycle is one-way: pending -> approved.
        if current_status == InstallmentStatus::Approved
            && next_status == InstallmentStatus::Pending
        {
            warn!(
                "Rejected transition of installment {} back to pending",
                installment_id
            );
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Cannot move an approved installment back to pending".to_string(),
                    code: "INVALID_STATUS_TRANSITION".to_string(),
                    success: false,
                }),
            ));
        }
        updated.status = Set(next_status);
    }

    updated.updated_at = Set(Some(Utc::now()));

    match updated.update(&state.db).await {
        Ok(installment_model) => {
            info!("Installment {} updated", installment_id);
            let response = ApiResponse {
                data: InstallmentResponse::from(installment_model),
                message: "Installment updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update installment {}: {}", installment_id, db_error);
            Err(database_error())
        }
    }
}

/// Delete an installment (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/installments/{installment_id}",
    tag = "installments",
    params(
        ("installment_id" = i32, Path, description = "Installment ID"),
    ),
    responses(
        (status = 200, description = "Installment deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Installment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn delete_installment(
    _admin: AdminUser,
    Path(installment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Deleting installment {}", installment_id);

    let existing = match installment::Entity::find_by_id(installment_id)
        .one(&state.db)
        .await
    {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Installment {} not found for deletion", installment_id);
            return Err(not_found());
        }
        Err(db_error) => {
            error!("Failed to look up installment {}: {}", installment_id, db_error);
            return Err(database_error());
        }
    };

    match existing.delete(&state.db).await {
        Ok(_) => {
            info!("Installment {} deleted", installment_id);
            let response = ApiResponse {
                data: format!("Installment {} deleted", installment_id),
                message: "Installment deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to delete installment {}: {}", installment_id, db_error);
            Err(database_error())
        }
    }
}
