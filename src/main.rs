use chrono::{DateTime, Utc};
use env_logger::Env;
use quiz_review::cli::{Args, Command};
use quiz_review::database::Database;
use quiz_review::database_factory::{DatabaseConfig, DatabaseFactory};
use quiz_review::date_provider::DateProvider;
use quiz_review::report::{render_preview, render_record, render_schedule};
use quiz_review::review_service::ReviewService;
use quiz_review::spaced_repetition::{ReviewKey, ReviewRecord, ReviewScheduler};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse_args();
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let override_date = args.validate_override_date()?;
    let color = !args.no_color;

    let mut builder = DatabaseConfig::builder();
    if args.test {
        builder = builder.test_mode();
    }
    if let Some(path) = &args.db_path {
        builder = builder.db_path(path.to_string_lossy());
    }
    if let Some(date) = override_date {
        builder = builder.override_date(date);
    }
    let config = builder.build();

    match args.command {
        Command::Review {
            user,
            quiz,
            question,
            quality,
        } => {
            let (service, now) = open_service(config)?;
            let record = service.update_review_schedule(&user, &quiz, &question, quality)?;
            println!("{}", render_record(&record, now, color));
        }
        Command::Schedule { user } => {
            let (service, now) = open_service(config)?;
            let records = service.get_review_schedule_for_user(&user)?;
            println!("{}", render_schedule(&user, &records, now, color));
        }
        Command::Due { user } => {
            let (service, now) = open_service(config)?;
            let records = service.get_due_reviews(&user)?;
            if records.is_empty() {
                println!("Nothing due for {}.", user);
            } else {
                println!("{}", render_schedule(&user, &records, now, color));
            }
        }
        Command::Preview {
            user,
            quiz,
            question,
        } => {
            let (service, now) = open_service(config)?;
            let preview = service.preview_review(&user, &quiz, &question)?;
            println!("{}", render_preview(&preview, now, color));
        }
        Command::Simulate {
            repetitions,
            interval,
            ease_factor,
        } => {
            let now = config.date_provider().get_current_time();
            simulate(repetitions, interval, ease_factor, now, color)?;
        }
    }

    Ok(())
}

/// Opens the configured database and reads the clock once for rendering
fn open_service(
    config: DatabaseConfig,
) -> Result<(ReviewService<Database>, DateTime<Utc>), Box<dyn std::error::Error>> {
    let db = DatabaseFactory::create(config)?;
    let date_provider = db.date_provider();
    let now = date_provider.get_current_time();
    Ok((ReviewService::new(db, date_provider), now))
}

/// Previews every rating for an ad-hoc state without touching a database
fn simulate(
    repetitions: u32,
    interval: u32,
    ease_factor: f64,
    now: DateTime<Utc>,
    color: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = ReviewKey::new("simulation", "simulation", "item")?;
    let current = ReviewRecord {
        repetitions,
        interval_days: interval,
        ease_factor,
        ..ReviewRecord::initial(key.clone(), now)
    };

    println!(
        "SM-2 Scheduling Results for: reps={}, interval={}, ease={:.2}",
        repetitions, interval, ease_factor
    );
    let preview = ReviewScheduler::new().preview(&key, Some(&current), now);
    println!("{}", render_preview(&preview, now, color));
    Ok(())
}
