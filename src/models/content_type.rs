//! Kind of content a study item points at.
use crate::error::StudyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Flashcard,
    BookSection,
    LegalArticle,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [
        ContentType::Flashcard,
        ContentType::BookSection,
        ContentType::LegalArticle,
    ];

    /// Stable string form used in SQL rows, JSON and the CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Flashcard => "flashcard",
            ContentType::BookSection => "book_section",
            ContentType::LegalArticle => "legal_article",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| StudyError::UnknownContentType(s.to_string()))
    }
}
