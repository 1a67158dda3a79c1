//! SeaORM entities for the `questions` and `choices` tables.

pub mod choice;
pub mod question;
