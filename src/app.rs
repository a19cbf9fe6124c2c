//! Terminal study session.
//! Walks the user through due items and records a 0-5 recall rating for each.

use chrono::Local;
use std::io::{BufRead, Write};
use study_scheduler::{Result, StudySession};

/// Outcome of one terminal session
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub reviews: usize,
    pub rounds: usize,
    pub completed: bool,
}

enum Answer {
    Quality(i32),
    Quit,
}

/// Reads lines until one is a rating or a quit request. EOF counts as quit.
fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Answer> {
    loop {
        write!(output, "Rate your recall 0-5 (q to quit): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::Quit);
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(Answer::Quit);
        }
        // out-of-range ratings are clamped by the scheduler
        match line.parse::<i32>() {
            Ok(quality) => return Ok(Answer::Quality(quality)),
            Err(_) => writeln!(output, "'{line}' is not a number")?,
        }
    }
}

/// Runs the session until every item passes or the user quits
pub fn run_session<R: BufRead, W: Write>(
    session: &mut StudySession,
    mut input: R,
    output: &mut W,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();

    if session.is_completed() {
        writeln!(output, "Nothing is due for review.")?;
        summary.completed = true;
        return Ok(summary);
    }

    while !session.is_completed() {
        let Some(item) = session.current_item() else {
            break;
        };
        writeln!(output)?;
        writeln!(output, "{}", session.phase_message())?;
        writeln!(
            output,
            "Progress: {} / {} passed ({} remaining)",
            session.passed_count(),
            session.total_count(),
            session.remaining_count()
        )?;
        writeln!(output, "[{}] {}", item.content_type, item.content_id)?;

        let quality = match read_answer(&mut input, output)? {
            Answer::Quality(quality) => quality,
            Answer::Quit => break,
        };

        session.grade_current_item(quality)?;
        summary.reviews += 1;
        if let Some(item) = session.current_item() {
            let next: chrono::DateTime<Local> = item.next_review_date.into();
            writeln!(
                output,
                "Next review in {} day(s), on {}",
                item.interval_days,
                next.format("%Y-%m-%d")
            )?;
        }
        session.next_item();
    }

    summary.rounds = session.round_number;
    summary.completed = session.is_completed();
    if summary.completed {
        writeln!(output, "Congratulations! Every due item has been reviewed.")?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use study_scheduler::ContentType;
    use study_scheduler::database::db;

    fn session_with(ids: &[&str]) -> StudySession {
        let conn = db::open_in_memory().unwrap();
        let past = Utc::now() - Duration::hours(1);
        for id in ids {
            db::schedule_item("ana", id, ContentType::LegalArticle, past, &conn).unwrap();
        }
        StudySession::start("ana", None, Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_nothing_due() {
        let mut session = session_with(&[]);
        let mut output = Vec::new();

        let summary = run_session(&mut session, Cursor::new(""), &mut output).unwrap();
        assert!(summary.completed);
        assert_eq!(summary.reviews, 0);
        assert!(String::from_utf8(output).unwrap().contains("Nothing is due"));
    }

    #[test]
    fn test_failed_item_is_asked_again() {
        let mut session = session_with(&["art-1", "art-2"]);
        let mut output = Vec::new();

        let summary =
            run_session(&mut session, Cursor::new("5\n1\nabc\n4\n"), &mut output).unwrap();
        assert_eq!(
            summary,
            SessionSummary {
                reviews: 3,
                rounds: 2,
                completed: true
            }
        );

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Round 2 (Review): 1 items to retry"));
        assert!(text.contains("'abc' is not a number"));
    }

    #[test]
    fn test_quit_stops_early() {
        let mut session = session_with(&["art-1", "art-2"]);
        let mut output = Vec::new();

        let summary = run_session(&mut session, Cursor::new("3\nq\n"), &mut output).unwrap();
        assert_eq!(summary.reviews, 1);
        assert!(!summary.completed);
    }

    #[test]
    fn test_eof_stops_early() {
        let mut session = session_with(&["art-1"]);
        let mut output = Vec::new();

        let summary = run_session(&mut session, Cursor::new(""), &mut output).unwrap();
        assert_eq!(summary.reviews, 0);
        assert!(!summary.completed);
    }
}
