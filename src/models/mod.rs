pub mod interview;
pub mod product;

pub use interview::{Answers, Keywords, Questions, SearchOutcome};
pub use product::{ProductRecord, SearchPage};
