use sea_orm::entity::prelude::*;

/// A ledger entry recorded by an agent for their own collections.
///
/// Structurally identical to [`super::admin_amount`]; the difference is
/// provenance: `created_by` holds the creating agent's username, resolved
/// server-side from the authenticated identity rather than client input.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "agent_amounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Mirrors `created_by`: agents record collections under their own name.
    pub username: String,
    pub amount: Decimal,
    pub wasool_amount: Decimal,
    /// Outstanding balance, derived as `round2(amount - wasool_amount)`.
    pub bakaya_amount: Decimal,
    pub date: Date,
    /// Username of the agent who recorded the entry.
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
