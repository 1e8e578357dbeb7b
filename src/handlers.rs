pub mod admin_amounts;
pub mod agent_amounts;
pub mod agents;
pub mod auth;
pub mod health;
pub mod installments;
pub mod users;
