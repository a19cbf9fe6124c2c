pub mod content_type;
pub mod review_log;
pub mod scheduler;
pub mod session_card;
pub mod study_item;
pub mod study_session;

pub use content_type::ContentType;
pub use review_log::ReviewLogEntry;
pub use scheduler::{ReviewResult, calculate_first_review, calculate_next_review, get_next_review_date};
pub use session_card::SessionCard;
pub use study_item::StudyItem;
pub use study_session::StudySession;
