//! Domain entities - the core business objects.

mod choice;
mod question;

pub use choice::Choice;
pub use question::{Poll, Question};

/// Maximum length of question and choice texts, in characters.
pub const MAX_TEXT_LEN: usize = 200;
