use sea_orm::entity::prelude::*;

/// A collection agent, created and deleted by the admin only.
///
/// Usernames and emails are unique and matched case-insensitively at the
/// query layer; the columns store whatever casing the admin entered.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "agents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt digest. Never serialized in API responses.
    pub password_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Installments assigned to this agent by the admin.
    #[sea_orm(has_many = "super::installment::Entity")]
    Installment,
}

impl Related<super::installment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
