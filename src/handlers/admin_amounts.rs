use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::{admin_amount, agent_amount};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::AdminUser;
use crate::helpers::amounts::{compute_bakaya, AmountError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating an admin amount entry.
///
/// `bakayaAmount` is not accepted: the outstanding balance is always
/// derived server-side.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminAmountRequest {
    /// Customer the entry concerns
    #[validate(length(min = 1))]
    pub username: String,
    /// Total amount owed
    pub amount: Decimal,
    /// Amount collected so far
    pub wasool_amount: Decimal,
    /// Entry date (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Request body for updating an amount entry. All fields are required,
/// mirroring the create payload minus the customer name.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAmountEntryRequest {
    pub amount: Decimal,
    pub wasool_amount: Decimal,
    /// Entry date (YYYY-MM-DD)
    pub date: NaiveDate,
}

/// Amount-ledger entry response model, shared by the admin and agent
/// ledgers since the two tables are structurally identical.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmountEntryResponse {
    pub id: i32,
    pub username: String,
    pub amount: Decimal,
    pub wasool_amount: Decimal,
    pub bakaya_amount: Decimal,
    pub date: NaiveDate,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<admin_amount::Model> for AmountEntryResponse {
    fn from(model: admin_amount::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            amount: model.amount,
            wasool_amount: model.wasool_amount,
            bakaya_amount: model.bakaya_amount,
            date: model.date,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<agent_amount::Model> for AmountEntryResponse {
    fn from(model: agent_amount::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            amount: model.amount,
            wasool_amount: model.wasool_amount,
            bakaya_amount: model.bakaya_amount,
            date: model.date,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub(super) fn invalid_amount(error: AmountError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            code: "INVALID_AMOUNT".to_string(),
            success: false,
        }),
    )
}

pub(super) fn amount_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Amount entry not found".to_string(),
            code: "NOT_FOUND".to_string(),
            success: false,
        }),
    )
}

pub(super) fn database_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: "DATABASE_ERROR".to_string(),
            success: false,
        }),
    )
}

/// Get all admin amount entries
#[utoipa::path(
    get,
    path = "/api/v1/admin-amounts",
    tag = "admin-amounts",
    responses(
        (status = 200, description = "Admin amounts retrieved successfully", body = ApiResponse<Vec<AmountEntryResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_admin_amounts(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AmountEntryResponse>>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Fetching all admin amounts");

    match admin_amount::Entity::find()
        .order_by_desc(admin_amount::Column::CreatedAt)
        .all(&state.db)
        .await
    {
        Ok(entries) => {
            debug!("Retrieved {} admin amounts", entries.len());
            let data: Vec<AmountEntryResponse> =
                entries.into_iter().map(AmountEntryResponse::from).collect();
            let response = ApiResponse {
                data,
                message: "Admin amounts retrieved successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to retrieve admin amounts: {}", db_error);
            Err(database_error())
        }
    }
}

/// Create an admin amount entry; the outstanding balance is derived
/// server-side and `created_by` is stamped `"Admin"`.
#[utoipa::path(
    post,
    path = "/api/v1/admin-amounts",
    tag = "admin-amounts",
    request_body = CreateAdminAmountRequest,
    responses(
        (status = 201, description = "Admin amount created successfully", body = ApiResponse<AmountEntryResponse>),
        (status = 400, description = "Invalid amounts", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin, request))]
pub async fn create_admin_amount(
    _admin: AdminUser,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateAdminAmountRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AmountEntryResponse>>), (StatusCode, Json<ErrorResponse>)>
{
    debug!(
        "Creating admin amount for '{}': amount={}, wasool={}",
        request.username, request.amount, request.wasool_amount
    );

    let bakaya_amount = match compute_bakaya(request.amount, request.wasool_amount) {
        Ok(bakaya_amount) => bakaya_amount,
        Err(amount_error) => {
            warn!("Admin amount rejected: {}", amount_error);
            return Err(invalid_amount(amount_error));
        }
    };

    let new_entry = admin_amount::ActiveModel {
        username: Set(request.username.clone()),
        amount: Set(request.amount),
        wasool_amount: Set(request.wasool_amount),
        bakaya_amount: Set(bakaya_amount),
        date: Set(request.date),
        created_by: Set("Admin".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };

    match new_entry.insert(&state.db).await {
        Ok(entry) => {
            info!("Admin amount created with ID: {}", entry.id);
            let response = ApiResponse {
                data: AmountEntryResponse::from(entry),
                message: "Admin amount created successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!("Failed to create admin amount: {}", db_error);
            Err(database_error())
        }
    }
}

/// Update an admin amount entry; the outstanding balance is recomputed
#[utoipa::path(
    put,
    path = "/api/v1/admin-amounts/{amount_id}",
    tag = "admin-amounts",
    params(
        ("amount_id" = i32, Path, description = "Amount entry ID"),
    ),
    request_body = UpdateAmountEntryRequest,
    responses(
        (status = 200, description = "Admin amount updated successfully", body = ApiResponse<AmountEntryResponse>),
        (status = 400, description = "Invalid amounts", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Amount entry not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin, request))]
pub async fn update_admin_amount(
    _admin: AdminUser,
    Path(amount_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateAmountEntryRequest>,
) -> Result<Json<ApiResponse<AmountEntryResponse>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Updating admin amount {}", amount_id);

    // Validate before touching the row so a rejected update changes nothing.
    let bakaya_amount = match compute_bakaya(request.amount, request.wasool_amount) {
        Ok(bakaya_amount) => bakaya_amount,
        Err(amount_error) => {
            warn!("Admin amount update rejected: {}", amount_error);
            return Err(invalid_amount(amount_error));
        }
    };

    let existing = match admin_amount::Entity::find_by_id(amount_id).one(&state.db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Admin amount {} not found for update", amount_id);
            return Err(amount_not_found());
        }
        Err(db_error) => {
            error!("Failed to look up admin amount {}: {}", amount_id, db_error);
            return Err(database_error());
        }
    };

    let mut updated: admin_amount::ActiveModel = existing.into();
    updated.amount = Set(request.amount);
    updated.wasool_amount = Set(request.wasool_amount);
    updated.bakaya_amount = Set(bakaya_amount);
    updated.date = Set(request.date);
    updated.updated_at = Set(Some(Utc::now()));

    match updated.update(&state.db).await {
        Ok(entry) => {
            info!("Admin amount {} updated", amount_id);
            let response = ApiResponse {
                data: AmountEntryResponse::from(entry),
                message: "Admin amount updated successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to update admin amount {}: {}", amount_id, db_error);
            Err(database_error())
        }
    }
}

/// Delete an admin amount entry
#[utoipa::path(
    delete,
    path = "/api/v1/admin-amounts/{amount_id}",
    tag = "admin-amounts",
    params(
        ("amount_id" = i32, Path, description = "Amount entry ID"),
    ),
    responses(
        (status = 200, description = "Admin amount deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "Amount entry not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn delete_admin_amount(
    _admin: AdminUser,
    Path(amount_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Deleting admin amount {}", amount_id);

    let existing = match admin_amount::Entity::find_by_id(amount_id).one(&state.db).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            warn!("Admin amount {} not found for deletion", amount_id);
            return Err(amount_not_found());
        }
        Err(db_error) => {
            error!("Failed to look up admin amount {}: {}", amount_id, db_error);
            return Err(database_error());
        }
    };

    match existing.delete(&state.db).await {
        Ok(_) => {
            info!("Admin amount {} deleted", amount_id);
            let response = ApiResponse {
                data: format!("Admin amount {} deleted", amount_id),
                message: "Admin amount deleted successfully".to_string(),
                success: true,
            };
            Ok(Json(response))
        }
        Err(db_error) => {
            error!("Failed to delete admin amount {}: {}", amount_id, db_error);
            Err(database_error())
        }
    }
}
