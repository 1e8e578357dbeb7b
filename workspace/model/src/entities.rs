//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the installment-tracking application
//! here: identities (users, agents), installments, and the two
//! amount-ledger tables.

pub mod admin_amount;
pub mod agent;
pub mod agent_amount;
pub mod installment;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::admin_amount::Entity as AdminAmount;
    pub use super::agent::Entity as Agent;
    pub use super::agent_amount::Entity as AgentAmount;
    pub use super::installment::Entity as Installment;
    pub use super::user::Entity as User;
}
