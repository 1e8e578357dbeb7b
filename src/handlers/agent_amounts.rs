use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use model::entities::{agent, agent_amount};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::admin_amounts::{
    amount_not_found, database_error, invalid_amount, AmountEntryResponse, UpdateAmountEntryRequest,
};
use crate::auth::{AdminUser, AuthUser, Role};
use crate::helpers::amounts::compute_bakaya;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for an agent creating their own amount entry.
///
/// There is deliberately no name field of any kind: both `username` and
/// `createdBy` are resolved from the authenticated identity, never from
/// client input.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentAmountRequest {
    /// Total amount owed
    pub amount: Decimal,
    /// Amount collected so far
    pub wasool_amount: Decimal,
    /// Entry date (YYYY-MM-DD)
    pub date: NaiveDate,
}

fn agents_only(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: message.to_string(),
            code: "FORBIDDEN".to_string(),
            success: false,
        }),
    )
}

/// Resolve the authenticated agent's username for stamping and filtering.
async fn resolve_agent_username(
    state: &AppState,
    agent_id: i32,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    match agent::Entity::find_by_id(agent_id).one(&state.db).await {
        Ok(Some(agent_model)) => Ok(agent_model.username),
        Ok(None) => {
            warn!("Authenticated agent {} no longer exists", agent_id);
            Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Agent not found".to_string(),
                    code: "AGENT_NOT_FOUND".to_string(),
                    success: false,
                }),
            ))
        }
        Err(db_error) => {
            error!("Failed to resolve agent {}: {}", agent_id, db_error);
            Err(database_error())
        }
    }
}

/// Get all agent amount entries (admin overview)
#[utoipa::path(
    get,
    path = "/api/v1/agent-amounts",
    tag = "agent-amounts",
    responses(
        (status = 200, description = "Agent amounts retrieved successfully", body = ApiResponse<Vec<AmountEntryResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_agent_amounts(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AmountEntryResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Fetching all agent amounts");

    match agent_amount::Entity::find()
        .order_by_desc(agent_amount::Column::CreatedAt)
        .all(&state.db)
        .await
    {
        Ok(entries) => {
            debug!("Retrieved {} agent amounts", entries.len());
            let data: Vec<AmountEntryResponse> =
                entries.into_iter().map(AmountEntryResponse::from).collect();
            let response = ApiResponse {
                data,
                message: "Agent amounts retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve agent amounts: {}", db_error);
            Err(database_error())
        }
    }
}

/// Get the authenticated agent's own amount entries
#[utoipa::path(
    get,
    path = "/api/v1/agent-amounts/my-amounts",
    tag = "agent-amounts",
    responses(
        (status = 200, description = "Own agent amounts retrieved successfully", body = ApiResponse<Vec<AmountEntryResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an agent", body = ErrorResponse),
        (status = 404, description = "Agent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth))]
pub async fn get_my_amounts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AmountEntryResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    let claims = auth.0;

    if claims.role != Role::Agent {
        warn!(
            "Caller {} with role {} denied access to my-amounts",
            claims.id,
            claims.role.as_str()
        );
        return Err(agents_only("Only agents can access their own amounts"));
    }

    let username = resolve_agent_username(&state, claims.id).await?;
    debug!("Fetching amounts created by agent '{}'", username);

    match agent_amount::Entity::find()
        .filter(agent_amount::Column::CreatedBy.eq(username))
        .order_by_desc(agent_amount::Column::CreatedAt)
        .all(&state.db)
        .await
    {
        Ok(entries) => {
            debug!("Retrieved {} own agent amounts", entries.len());
            let data: Vec<AmountEntryResponse> =
                entries.into_iter().map(AmountEntryResponse::from).collect();
            let response = ApiResponse {
                data,
                message: "Agent amounts retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve own agent amounts: {}", db_error);
            Err(database_error())
        }
    }
}

/// Create an agent amount entry.
///
/// Only agents may call this; `created_by` is forced to the caller's own
/// username and the outstanding balance is derived server-side.
#[utoipa::path(
    post,
    path = "/api/v1/agent-amounts",
    tag = "agent-amounts",
    request_body = CreateAgentAmountRequest,
    responses(
        (status = 201, description = "Agent amount created successfully", body = ApiResponse<AmountEntryResponse>),
        (status = 400, description = "Invalid amounts", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an agent", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth, request))]
pub async fn create_agent_amount(
    auth: AuthUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateAgentAmountRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AmountEntryResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    let claims = auth.0;

    if claims.role != Role::Agent {
        warn!(
            "Caller {} with role {} denied agent-amount creation",
            claims.id,
            claims.role.as_str()
        );
        return Err(agents_only("Only agents can create agent amounts"));
    }

    let bakaya_amount = match compute_bakaya(request.amount, request.wasool_amount) {
        Ok(bakaya_amount) => bakaya_amount,
        Err(amount_error) => {
            warn!("Agent amount rejected: {}", amount_error);
            return Err(invalid_amount(amount_error));
        }
    };

    let created_by = resolve_agent_username(&state, claims.id).await?;
    debug!(
        "Creating agent amount by '{}': amount={}, wasool={}",
        created_by, request.amount, request.wasool_amount
    );

    let new_entry = agent_amount::ActiveModel {
        username: Set(created_by.clone()),
        amount: Set(request.amount),
        wasool_amount: Set(request.wasool_amount),
        bakaya_amount: Set(bakaya_amount),
        date: Set(request.date),
        created_by: Set(created_by),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };

    match new_entry.insert(&state.db).await {
        Ok(entry) => {
            info!("Agent amount created with ID: {}", entry.id);
            let response = ApiResponse {
                data: AmountEntryResponse::from(entry),
                message: "Agent amount created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create agent amount: {}", db_error);
            Err(database_error())
        }
    }
}

/// Update an agent amount entry (admin only); the balance is recomputed
#[utoipa::path(
    put,
    path = "/api/v1/agent-amounts/{amount_id}",
    tag = "agent-amounts",
    params(
        ("amount_id" = i32, Path, description = "Amount entry ID"),
    ),
    request_body = UpdateAmountEntryRequest,
    responses(
        (status = 200, description = "Agent amount updated successfully", body = ApiResponse<AmountEntryResponse>),
        (status = 400, description = "Invalid amounts", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Amount entry not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin, request))]
pub async fn update_agent_amount(
    _admin: AdminUser,
    Path(amount_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateAmountEntryRequest>,
) -> Result<Json<ApiResponse<AmountEntryResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Updating agent amount {}", amount_id);

    let bakaya_amount = match compute_bakaya(request.amount, request.wasool_amount) {
        Ok(bakaya_amount) => bakaya_amount,
        Err(amount_error) => {
            warn!("Agent amount update rejected: {}", amount_error);
            return Err(invalid_amount(amount_error));
        }
    };

    let existing = match agent_amount::Entity::find_by_id(amount_id).one(&state.db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Agent amount {} not found for update", amount_id);
            return Err(amount_not_found());
        }
        Err(db_error) => {
            error!("Failed to look up agent amount {}: {}", amount_id, db_error);
            return Err(database_error());
        }
    };

    let mut updated: agent_amount::ActiveModel = existing.into();
    updated.amount = Set(request.amount);
    updated.wasool_amount = Set(request.wasool_amount);
    updated.bakaya_amount = Set(bakaya_amount);
    updated.date = Set(request.date);
    updated.updated_at = Set(Some(Utc::now()));

    match updated.update(&state.db).await {
        Ok(entry) => {
            info!("Agent amount {} updated", amount_id);
            let response = ApiResponse {
                data: AmountEntryResponse::from(entry),
                message: "Agent amount updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update agent amount {}: {}", amount_id, db_error);
            Err(database_error())
        }
    }
}

/// Delete an agent amount entry (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/agent-amounts/{amount_id}",
    tag = "agent-amounts",
    params(
        ("amount_id" = i32, Path, description = "Amount entry ID"),
    ),
    responses(
        (status = 200, description = "Agent amount deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Amount entry not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn delete_agent_amount(
    _admin: AdminUser,
    Path(amount_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Deleting agent amount {}", amount_id);

    let existing = match agent_amount::Entity::find_by_id(amount_id).one(&state.db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Agent amount {} not found for deletion", amount_id);
            return Err(amount_not_found());
        }
        Err(db_error) => {
            error!("Failed to look up agent amount {}: {}", amount_id, db_error);
            return Err(database_error());
        }
    };

    match existing.delete(&state.db).await {
        Ok(_) => {
            info!("Agent amount {} deleted", amount_id);
            let response = ApiResponse {
                data: format!("Agent amount {} deleted", amount_id),
                message: "Agent amount deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to delete agent amount {}: {}", amount_id, db_error);
            Err(database_error())
        }
    }
}
