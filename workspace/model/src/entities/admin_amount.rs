use sea_orm::entity::prelude::*;

/// A ledger entry recorded by the admin against a customer name.
///
/// `bakaya_amount` (outstanding) is always derived server-side as
/// `round2(amount - wasool_amount)`; it is never accepted from a caller.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admin_amounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Customer the entry concerns. Free text, not a foreign key.
    pub username: String,
    /// Total amount owed.
    pub amount: Decimal,
    /// Amount collected so far. Invariant: `0 <= wasool_amount <= amount`.
    pub wasool_amount: Decimal,
    /// Outstanding balance, derived.
    pub bakaya_amount: Decimal,
    pub date: Date,
    /// Always `"Admin"` for this table.
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
