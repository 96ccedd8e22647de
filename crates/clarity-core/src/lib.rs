//! Domain logic for clarity: identity gateway, route guard, checklist
//! generation, and the per-user checklist store.

pub mod auth;
pub mod generate;
pub mod guard;
pub mod store;
