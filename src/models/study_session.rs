//! Study session management for spaced repetition practice.
//! Handles multi-round review of due study items with scheduler integration.

use super::scheduler::PASSING_QUALITY;
use super::{SessionCard, StudyItem};
use crate::database::db;
use crate::error::{Result, StudyError};
use chrono::Local;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Manages a study session with multiple review rounds.
/// Items that aren't recalled well (quality < 3) are repeated in subsequent rounds.
pub struct StudySession {
    pub user_id: String,
    pub all_cards: Vec<SessionCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
}

impl StudySession {
    /// Creates a new session from items that are due for review.
    pub fn new_from_due_items(
        user_id: String,
        items: Vec<StudyItem>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let cards: Vec<_> = items.into_iter().map(SessionCard::new).collect();
        let indices: Vec<usize> = (0..cards.len()).collect();

        info!(user_id = %user_id, items = cards.len(), "study session started");

        Self {
            user_id,
            all_cards: cards,
            current_round_cards: indices,
            current_index: 0,
            conn,
            round_number: 1,
        }
    }

    /// Loads the user's due items from the database and starts a session over them.
    pub fn start(
        user_id: &str,
        limit: Option<usize>,
        conn: Arc<Mutex<Connection>>,
    ) -> Result<Self> {
        let items = {
            let guard = conn.lock().map_err(|_| StudyError::LockPoisoned)?;
            db::get_items_due_for_review(user_id, chrono::Utc::now(), limit, &guard)?
        };
        Ok(Self::new_from_due_items(user_id.to_string(), items, conn))
    }

    pub fn current_card(&self) -> Option<&SessionCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn current_item(&self) -> Option<&StudyItem> {
        self.current_card().map(|card| &card.item)
    }

    pub fn next_item(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with items that weren't passed.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| !card.is_passed)
                    .unwrap_or(false)
            })
            .collect();

        if failed_indices.is_empty() {
            info!(user_id = %self.user_id, rounds = self.round_number, "study session completed");
            return;
        }

        self.current_round_cards = failed_indices;
        self.current_index = 0;
        self.round_number += 1;
        debug!(
            round = self.round_number,
            items = self.current_round_cards.len(),
            "starting retry round"
        );
    }

    /// Grades the current item, persists the review and updates the in-memory schedule.
    /// Items graded >= 3 are passed for this session.
    pub fn grade_current_item(&mut self, quality: i32) -> Result<()> {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some(card) = self.all_cards.get_mut(actual_idx) else {
            return Ok(());
        };

        let updated = {
            let mut conn = self.conn.lock().map_err(|_| StudyError::LockPoisoned)?;
            db::submit_review(
                &card.item.user_id,
                &card.item.content_id,
                card.item.content_type,
                quality,
                &Local::now(),
                &mut conn,
            )?
        };

        if quality >= PASSING_QUALITY {
            card.mark_as_passed();
        } else {
            card.mark_as_failed();
        }
        card.item = updated;
        Ok(())
    }

    pub fn passed_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|card| card.is_passed)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    /// Returns true when the current round is empty or every item in it has been passed.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.passed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} items", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} items to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use chrono::{Duration, Utc};

    fn session_with(ids: &[&str]) -> StudySession {
        let conn = db::open_in_memory().unwrap();
        let past = Utc::now() - Duration::days(1);
        for id in ids {
            db::schedule_item("ana", id, ContentType::Flashcard, past, &conn).unwrap();
        }
        StudySession::start("ana", None, Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_empty_session_is_completed() {
        let session = session_with(&[]);
        assert!(session.is_completed());
        assert!(session.current_item().is_none());
    }

    #[test]
    fn test_all_passed_in_first_round() {
        let mut session = session_with(&["a", "b"]);
        assert_eq!(session.phase_message(), "Round 1: 2 items");

        session.grade_current_item(5).unwrap();
        session.next_item();
        session.grade_current_item(3).unwrap();
        session.next_item();

        assert!(session.is_completed());
        assert_eq!(session.round_number, 1);
        assert_eq!(session.passed_count(), 2);
    }

    #[test]
    fn test_failed_items_are_repeated() {
        let mut session = session_with(&["a", "b", "c"]);

        session.grade_current_item(5).unwrap();
        session.next_item();
        session.grade_current_item(1).unwrap();
        session.next_item();
        session.grade_current_item(2).unwrap();
        session.next_item();

        assert!(!session.is_completed());
        assert_eq!(session.round_number, 2);
        assert_eq!(session.total_count(), 2);
        assert_eq!(session.remaining_count(), 2);
        assert_eq!(session.phase_message(), "Round 2 (Review): 2 items to retry");
        assert_eq!(session.current_item().unwrap().content_id, "b");

        session.grade_current_item(4).unwrap();
        session.next_item();
        session.grade_current_item(4).unwrap();
        session.next_item();
        assert!(session.is_completed());
    }

    #[test]
    fn test_grading_persists_review() {
        let mut session = session_with(&["a"]);
        session.grade_current_item(1).unwrap();

        let item = session.current_item().unwrap();
        assert_eq!(item.consecutive_correct, 0);
        assert_eq!(item.interval_days, 1);
        assert!(item.last_reviewed_at.is_some());

        let conn = session.conn.lock().unwrap();
        let history = db::get_review_history("ana", "a", ContentType::Flashcard, &conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quality_level, 1);
    }
}
