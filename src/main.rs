mod app;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use study_scheduler::config::{Config, config_dir};
use study_scheduler::database::db;
use study_scheduler::export::json::{
    StudyExport, export_items_to_path, import_items, store_imported_items,
};
use study_scheduler::{ContentType, Result, StudyItem, StudySession, get_next_review_date};

#[derive(Parser)]
#[command(name = "study", version, about = "Spaced repetition review scheduler")]
struct Cli {
    /// User whose study items are used (defaults to the configured user)
    #[arg(long, global = true)]
    user: Option<String>,

    /// SQLite database file (defaults to the configured path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a content unit for review
    Schedule {
        content_type: ContentType,
        content_id: String,
    },
    /// List items due for review now
    Due {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Submit a 0-5 recall rating for one item
    Review {
        content_type: ContentType,
        content_id: String,
        #[arg(allow_negative_numbers = true)]
        quality: i32,
    },
    /// Review every due item interactively
    Session,
    /// Show the review history of one item
    History {
        content_type: ContentType,
        content_id: String,
    },
    /// Print the date a review would be due after the given interval
    NextDate { days: u32 },
    /// Export the user's study items to a JSON file
    Export { path: PathBuf },
    /// Import study items from a JSON file
    Import { path: PathBuf },
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a value, e.g. `study.session_limit 20`
    Set { key: String, value: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Ignore a second initialisation; the first subscriber stays active.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn format_local(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

fn print_item(item: &StudyItem) {
    println!(
        "{:<14} {:<24} interval {:>4}d  streak {:>3}  due {}",
        item.content_type,
        item.content_id,
        item.interval_days,
        item.consecutive_correct,
        format_local(item.next_review_date)
    );
}

fn open_database(cli_db: Option<&Path>, config: &Config) -> Result<Connection> {
    let path = match cli_db {
        Some(path) => path.to_path_buf(),
        None => config.database_path(&config_dir()?),
    };
    db::init_database(&path)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    let user_id = cli.user.unwrap_or_else(|| config.study.user_id.clone());

    let db_path = cli.db.as_deref();

    match cli.command {
        Commands::NextDate { days } => {
            println!("{}", get_next_review_date(days).format("%Y-%m-%d %H:%M"));
        }
        Commands::Schedule {
            content_type,
            content_id,
        } => {
            let conn = open_database(db_path, &config)?;
            let item = db::schedule_item(&user_id, &content_id, content_type, Utc::now(), &conn)?;
            print_item(&item);
        }
        Commands::Due { limit } => {
            let conn = open_database(db_path, &config)?;
            let items = db::get_items_due_for_review(
                &user_id,
                Utc::now(),
                limit.or(config.study.session_limit),
                &conn,
            )?;
            if items.is_empty() {
                println!("Nothing is due for review.");
            }
            for item in &items {
                print_item(item);
            }
        }
        Commands::Review {
            content_type,
            content_id,
            quality,
        } => {
            let mut conn = open_database(db_path, &config)?;
            let item = db::submit_review(
                &user_id,
                &content_id,
                content_type,
                quality,
                &Local::now(),
                &mut conn,
            )?;
            print_item(&item);
        }
        Commands::Session => {
            let conn = Arc::new(Mutex::new(open_database(db_path, &config)?));
            let mut session = StudySession::start(&user_id, config.study.session_limit, conn)?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            let summary = app::run_session(&mut session, stdin.lock(), &mut stdout)?;
            println!(
                "{} review(s) over {} round(s)",
                summary.reviews, summary.rounds
            );
        }
        Commands::History {
            content_type,
            content_id,
        } => {
            let conn = open_database(db_path, &config)?;
            let history = db::get_review_history(&user_id, &content_id, content_type, &conn)?;
            if history.is_empty() {
                println!("No reviews recorded.");
            }
            for entry in &history {
                println!(
                    "{}  quality {}  next interval {}d",
                    format_local(entry.reviewed_at),
                    entry.quality_level,
                    entry.interval_days
                );
            }
        }
        Commands::Export { path } => {
            let conn = open_database(db_path, &config)?;
            let export = StudyExport::from_database(&user_id, &conn)?;
            export_items_to_path(&export, &path)?;
            println!("Exported {} item(s) to {}", export.items.len(), path.display());
        }
        Commands::Import { path } => {
            let conn = open_database(db_path, &config)?;
            let export = import_items(&path)?;
            let stored = store_imported_items(&export, &user_id, &conn)?;
            println!("Imported {stored} item(s) for '{user_id}'");
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Set { key, value } => {
                config.set(&key, &value)?;
                config.save()?;
                println!("{key} = {value}");
            }
        },
    }

    Ok(())
}

fn main() {
    init_tracing();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
