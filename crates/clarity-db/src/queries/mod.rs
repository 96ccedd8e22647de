pub mod checklists;
pub mod users;
