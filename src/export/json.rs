//! JSON import/export module for a user's study items.
//! Saves and loads the full schedule so it can be moved between databases.

use crate::database::db;
use crate::error::Result;
use crate::models::StudyItem;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyExport {
    pub user_id: String,
    pub exported_at: DateTime<Utc>,
    pub items: Vec<StudyItem>,
}

impl StudyExport {
    /// Snapshot of everything the user has scheduled.
    pub fn from_database(user_id: &str, conn: &Connection) -> Result<Self> {
        Ok(Self {
            user_id: user_id.to_string(),
            exported_at: Utc::now(),
            items: db::get_all_items(user_id, conn)?,
        })
    }
}

/// Exports study items to a JSON file at the specified path.
pub fn export_items_to_path(export: &StudyExport, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(export)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(
        user_id = %export.user_id,
        items = export.items.len(),
        path = %path.display(),
        "study items exported"
    );
    Ok(())
}

/// Imports study items from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_items(path: &Path) -> Result<StudyExport> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let export: StudyExport = serde_json::from_str(&contents)?;
    info!(
        user_id = %export.user_id,
        items = export.items.len(),
        path = %path.display(),
        "study items imported"
    );
    Ok(export)
}

/// Writes imported items into the database under `user_id`, overwriting existing schedules.
/// All items are stored or none are. Returns the number of items stored.
pub fn store_imported_items(export: &StudyExport, user_id: &str, conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    for item in &export.items {
        let item = StudyItem {
            user_id: user_id.to_string(),
            ..item.clone()
        };
        db::upsert_study_item(&item, &tx)?;
    }
    tx.commit()?;
    Ok(export.items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use crate::models::ContentType;
    use chrono::TimeZone;
    use std::fs;

    fn create_test_export() -> StudyExport {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut reviewed = StudyItem::new("ana", "art-5", ContentType::LegalArticle, now);
        reviewed.apply_review(5, &now);

        StudyExport {
            user_id: "ana".to_string(),
            exported_at: now,
            items: vec![
                StudyItem::new("ana", "card-1", ContentType::Flashcard, now),
                reviewed,
            ],
        }
    }

    #[test]
    fn test_export_items_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        export_items_to_path(&create_test_export(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"legal_article\""));
        assert!(written.contains("\"consecutive_correct\": 1"));
    }

    #[test]
    fn test_import_items() {
        let json_content = r#"{
  "user_id": "ana",
  "exported_at": "2024-05-01T09:00:00Z",
  "items": [
    {
      "user_id": "ana",
      "content_id": "ch-1",
      "content_type": "book_section",
      "interval_days": 3,
      "consecutive_correct": 2,
      "next_review_date": "2024-05-04T09:00:00Z"
    }
  ]
}"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(&path, json_content).unwrap();

        let export = import_items(&path).unwrap();
        assert_eq!(export.items.len(), 1);
        let item = &export.items[0];
        assert_eq!(item.content_type, ContentType::BookSection);
        assert_eq!(item.interval_days, 3);
        assert_eq!(item.consecutive_correct, 2);
        assert_eq!(item.last_reviewed_at, None);
    }

    #[test]
    fn test_export_and_import_preserve_items() {
        let original = create_test_export();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.json");

        export_items_to_path(&original, &path).unwrap();
        let imported = import_items(&path).unwrap();

        assert_eq!(original, imported);
    }

    #[test]
    fn test_store_imported_items_under_new_user() {
        let conn = db::open_in_memory().unwrap();
        let export = create_test_export();

        let stored = store_imported_items(&export, "bob", &conn).unwrap();
        assert_eq!(stored, 2);

        let items = db::get_all_items("bob", &conn).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.user_id == "bob"));
        assert!(db::get_all_items("ana", &conn).unwrap().is_empty());

        let roundtrip = StudyExport::from_database("bob", &conn).unwrap();
        assert_eq!(roundtrip.items.len(), 2);
    }

    #[test]
    fn test_failed_store_leaves_no_partial_import() {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "CREATE TRIGGER reject_article BEFORE INSERT ON study_items
             WHEN NEW.content_id = 'art-5'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            (),
        )
        .unwrap();

        let result = store_imported_items(&create_test_export(), "bob", &conn);
        assert!(matches!(result, Err(StudyError::Database(_))));
        assert!(db::get_all_items("bob", &conn).unwrap().is_empty());
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_items(Path::new("nonexistent_file_xyz123.json"));
        assert!(matches!(result, Err(StudyError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        assert!(matches!(import_items(&path), Err(StudyError::Json(_))));
    }
}
