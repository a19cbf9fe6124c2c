//! Wrapper for study items that tracks progress within one study session.
use super::StudyItem;

#[derive(Clone)]
pub struct SessionCard {
    pub item: StudyItem,
    pub is_passed: bool,
}

impl SessionCard {
    pub fn new(item: StudyItem) -> Self {
        Self {
            item,
            is_passed: false,
        }
    }

    pub fn mark_as_passed(&mut self) {
        self.is_passed = true;
    }

    pub fn mark_as_failed(&mut self) {
        self.is_passed = false;
    }
}
