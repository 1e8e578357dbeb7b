use model::entities::agent;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryFilter};

/// Look up an agent by username, case-insensitively.
///
/// Usernames are stored with whatever casing the admin entered; logins and
/// assignments match on the lowercased value.
pub async fn find_agent_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<agent::Model>, DbErr> {
    agent::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(agent::Column::Username)))
                .eq(username.to_lowercase()),
        )
        .one(db)
        .await
}

/// Look up an agent by email, case-insensitively.
pub async fn find_agent_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<agent::Model>, DbErr> {
    agent::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(agent::Column::Email))).eq(email.to_lowercase()))
        .one(db)
        .await
}
