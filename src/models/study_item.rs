//! A schedulable unit of content (flashcard, book section or legal article) owned by a user.
use super::ContentType;
use super::scheduler::{ReviewResult, calculate_next_review, next_review_date_from};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
    pub user_id: String,
    pub content_id: String,
    pub content_type: ContentType,
    pub interval_days: u32,
    pub consecutive_correct: u32,
    pub next_review_date: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl StudyItem {
    /// A freshly scheduled item, due immediately.
    pub fn new(
        user_id: impl Into<String>,
        content_id: impl Into<String>,
        content_type: ContentType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            content_id: content_id.into(),
            content_type,
            interval_days: 0,
            consecutive_correct: 0,
            next_review_date: now,
            last_reviewed_at: None,
        }
    }

    /// Runs the scheduler for one review and stores the outcome.
    /// The due date is computed in `now`'s time zone so it lands on a calendar day there.
    pub fn apply_review<Tz: TimeZone>(&mut self, quality_level: i32, now: &DateTime<Tz>) -> ReviewResult {
        let result =
            calculate_next_review(quality_level, self.interval_days, self.consecutive_correct);

        self.interval_days = result.next_interval_days;
        self.consecutive_correct = result.new_consecutive_correct;
        self.next_review_date =
            next_review_date_from(now.clone(), result.next_interval_days).with_timezone(&Utc);
        self.last_reviewed_at = Some(now.with_timezone(&Utc));

        result
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }
}
