use anyhow::Result;
use chrono::Utc;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};

use crate::auth;
use crate::schemas::AppState;

/// Initialize application state against an explicit database URL
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    dotenvy::dotenv().ok();

    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    let jwt_secret = match std::env::var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ => {
            tracing::warn!("JWT_SECRET is not set, using an insecure development secret");
            "please_change_this".to_string()
        }
    };

    let state = AppState { db, jwt_secret };

    seed_admin(&state).await?;

    Ok(state)
}

/// Create the bootstrap admin account when `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD` are provided and no user with that email exists yet.
pub async fn seed_admin(state: &AppState) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let password_hash = auth::hash_password(&password)?;
    let admin = user::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        role: Set(user::UserRole::Admin),
        full_name: Set("Admin".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    admin.insert(&state.db).await?;

    tracing::info!("Bootstrap admin created: {}", email);
    Ok(())
}
