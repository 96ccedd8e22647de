//! Database layer for clarity: connection pooling, embedded migrations,
//! models, and query functions for the users and checklists tables.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
