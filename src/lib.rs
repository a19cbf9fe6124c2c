pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{Result, StudyError};
pub use models::{
    ContentType, ReviewResult, StudyItem, StudySession, calculate_first_review,
    calculate_next_review, get_next_review_date,
};
