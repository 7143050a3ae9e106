use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Spaced-repetition review scheduling for quiz questions
#[derive(Parser, Debug, Clone)]
#[command(name = "quiz-review")]
#[command(about = "Schedule quiz question reviews with the SM-2 algorithm", long_about = None)]
#[command(version)]
pub struct Args {
    /// Use in-memory database for testing
    #[arg(long, global = true, help = "Use in-memory database for testing")]
    pub test: bool,

    /// Custom database file path
    #[arg(long, global = true, value_name = "PATH", help = "Use custom database file path")]
    pub db_path: Option<PathBuf>,

    /// Override current date for testing (YYYY-MM-DD format)
    #[arg(
        long,
        global = true,
        value_name = "DATE",
        help = "Override current date (YYYY-MM-DD format)"
    )]
    pub override_date: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a recall quality rating for a question
    Review {
        #[arg(long)]
        user: String,
        #[arg(long)]
        quiz: String,
        #[arg(long)]
        question: String,
        /// 0 (blackout) to 5 (perfect recall)
        #[arg(long, allow_negative_numbers = true)]
        quality: i64,
    },
    /// List every scheduled review of a user, soonest first
    Schedule {
        #[arg(long)]
        user: String,
    },
    /// List the reviews of a user that are due now
    Due {
        #[arg(long)]
        user: String,
    },
    /// Show what each quality rating would do to a stored question
    Preview {
        #[arg(long)]
        user: String,
        #[arg(long)]
        quiz: String,
        #[arg(long)]
        question: String,
    },
    /// Show what each quality rating would do to an ad-hoc state
    Simulate {
        /// Current number of successful repetitions
        repetitions: u32,
        /// Current interval in days
        interval: u32,
        /// Current ease factor (typically 1.3 - 2.6)
        ease_factor: f64,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the override_date argument if provided
    pub fn validate_override_date(&self) -> Result<Option<NaiveDate>, String> {
        match &self.override_date {
            Some(date_str) => NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    format!(
                        "Invalid date format for --override-date: '{}'. Expected YYYY-MM-DD",
                        date_str
                    )
                }),
            None => Ok(None),
        }
    }
}
