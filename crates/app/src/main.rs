use std::fmt;
use std::io::{self, Read};

use dokkai_core::model::{ReviewItem, ReviewItemId, ReviewQuality, TextEntryId};
use services::{AnalysisDepth, AppServices, Clock, SessionMode, split_sentences};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingInput { command: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidTextEntry { raw: String },
    InvalidDepth { raw: String },
    InvalidQuality { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingInput { command } => write!(f, "{command} is missing an argument"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTextEntry { raw } => write!(f, "invalid --text-entry value: {raw}"),
            ArgsError::InvalidDepth { raw } => write!(f, "invalid --depth value: {raw}"),
            ArgsError::InvalidQuality { raw } => write!(f, "invalid quality (1-4): {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  dokkai status  [--db <sqlite_url>] [--text-entry <id>]");
    eprintln!("  dokkai import  <file.json> [--db <sqlite_url>]");
    eprintln!("  dokkai export  [<file.json>] [--db <sqlite_url>]");
    eprintln!("  dokkai grade   <item-id> <1-4> [--db <sqlite_url>]");
    eprintln!(
        "  dokkai analyze <file|-> [--db <sqlite_url>] [--depth quick|detailed] [--add] [--text-entry <id>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dokkai.sqlite3");
    eprintln!("  --depth quick");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DOKKAI_DB_URL, DOKKAI_AI_API_KEY, DOKKAI_AI_MODEL, DOKKAI_AI_BASE_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Import,
    Export,
    Analyze,
    Grade,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "status" => Some(Self::Status),
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            "analyze" => Some(Self::Analyze),
            "grade" => Some(Self::Grade),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Import => "import",
            Self::Export => "export",
            Self::Analyze => "analyze",
            Self::Grade => "grade",
        }
    }
}

struct Args {
    db_url: String,
    text_entry: Option<TextEntryId>,
    input: Option<String>,
    depth: AnalysisDepth,
    add_to_deck: bool,
    quality: Option<ReviewQuality>,
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("DOKKAI_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://dokkai.sqlite3".into(), normalize_sqlite_url);
        let mut text_entry = None;
        let mut input = None;
        let mut depth = AnalysisDepth::Quick;
        let mut add_to_deck = false;
        let mut quality = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--text-entry" => {
                    let value = require_value(args, "--text-entry")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidTextEntry { raw: value });
                    }
                    text_entry = Some(TextEntryId::new(value.trim()));
                }
                "--depth" => {
                    let value = require_value(args, "--depth")?;
                    depth = AnalysisDepth::parse(&value)
                        .ok_or(ArgsError::InvalidDepth { raw: value })?;
                }
                "--add" => add_to_deck = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if input.is_none() && (arg == "-" || !arg.starts_with('-')) => {
                    input = Some(arg);
                }
                _ if command == Command::Grade && quality.is_none() => {
                    let parsed = arg
                        .parse::<u8>()
                        .ok()
                        .and_then(|value| ReviewQuality::from_u8(value).ok());
                    quality = Some(parsed.ok_or(ArgsError::InvalidQuality { raw: arg })?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let missing_quality = command == Command::Grade && quality.is_none();
        if missing_quality
            || (input.is_none() && matches!(command, Command::Import | Command::Analyze))
        {
            return Err(ArgsError::MissingInput {
                command: command.name(),
            });
        }

        Ok(Self {
            db_url,
            text_entry,
            input,
            depth,
            add_to_deck,
            quality,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(input)
}

async fn status(
    app: &AppServices,
    scope: Option<TextEntryId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = app.deck_service().list_items().await?.len();
    let session = app.session_loop().start_session(scope).await?;
    let view = session.view();
    let settings = session.settings();

    println!("items:     {total}");
    println!("new today: {}", view.new_count);
    println!("due now:   {}", view.due_count);
    println!(
        "chunks:    {} (size {})",
        session.learning_chunks().len(),
        settings.chunk_size()
    );
    let state = match view.mode {
        SessionMode::Empty => "nothing to study",
        SessionMode::Complete => "all caught up",
        _ => "ready",
    };
    println!("session:   {state}");
    Ok(())
}

async fn import(app: &AppServices, input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_input(input)?;
    let items: Vec<ReviewItem> = serde_json::from_str(&raw)?;
    let repo = &app.storage().review_items;
    for item in &items {
        repo.upsert_review_item(item).await?;
    }
    tracing::info!(count = items.len(), "imported review items");
    println!("imported {} items", items.len());
    Ok(())
}

async fn export(app: &AppServices, output: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let items = app.deck_service().list_items().await?;
    let json = serde_json::to_string_pretty(&items)?;
    match output {
        Some(path) if path != "-" => {
            std::fs::write(path, json)?;
            tracing::info!(count = items.len(), path, "exported review items");
        }
        _ => println!("{json}"),
    }
    Ok(())
}

async fn analyze(app: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input = args.input.as_deref().unwrap_or("-");
    let text = read_input(input)?;
    let analysis = app.analysis();
    let decks = app.deck_service();

    let mut results = Vec::new();
    let mut added = 0usize;
    for sentence in split_sentences(&text) {
        let result = analysis.analyze(&sentence, args.depth).await?;
        if args.add_to_deck {
            for segment in result.segments.iter().filter(|s| s.meaning.is_some()) {
                match decks.add_word(segment, args.text_entry.clone()).await {
                    Ok(_) => added += 1,
                    Err(err) => tracing::warn!(word = %segment.text, error = %err, "word skipped"),
                }
            }
            for point in &result.grammar_points {
                match decks.add_grammar(point, args.text_entry.clone()).await {
                    Ok(_) => added += 1,
                    Err(err) => {
                        tracing::warn!(pattern = %point.pattern, error = %err, "grammar skipped");
                    }
                }
            }
        }
        results.push(result);
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    if args.add_to_deck {
        eprintln!("deck: {added} items added or already present");
    }
    Ok(())
}

async fn grade(
    app: &AppServices,
    id: &str,
    quality: ReviewQuality,
) -> Result<(), Box<dyn std::error::Error>> {
    let review = app
        .review_service()
        .review_item_persisted_by_id(
            &ReviewItemId::new(id),
            quality,
            app.storage().review_items.as_ref(),
        )
        .await?;
    println!(
        "{id}: stage {} -> {}, next review {}",
        review.previous.srs_stage().value(),
        review.item.srs_stage().value(),
        review.item.next_review_date().to_rfc3339()
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;
    tracing::debug!(db = %parsed.db_url, command = cmd.name(), "storage ready");

    match cmd {
        Command::Status => status(&app, parsed.text_entry.clone()).await,
        Command::Import => import(&app, parsed.input.as_deref().unwrap_or("-")).await,
        Command::Export => export(&app, parsed.input.as_deref()).await,
        Command::Analyze => analyze(&app, &parsed).await,
        Command::Grade => match (parsed.input.as_deref(), parsed.quality) {
            (Some(id), Some(quality)) => grade(&app, id, quality).await,
            _ => Err(ArgsError::MissingInput { command: "grade" }.into()),
        },
    }
}

/// `RUST_LOG` directives when set and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(command: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_owned());
        Args::parse(command, &mut iter)
    }

    #[test]
    fn rust_log_overrides_the_default_level() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("  ".into())).to_string(), "info");
        assert_eq!(log_filter(Some("debug".into())).to_string(), "debug");
    }

    #[test]
    fn grade_takes_an_item_id_and_quality() {
        let args = parse(Command::Grade, &["item-1", "3", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.input.as_deref(), Some("item-1"));
        assert_eq!(args.quality, Some(ReviewQuality::Good));
        assert_eq!(args.db_url, "sqlite::memory:");

        assert!(matches!(
            parse(Command::Grade, &["item-1", "7"]),
            Err(ArgsError::InvalidQuality { .. })
        ));
        assert!(matches!(
            parse(Command::Grade, &["item-1"]),
            Err(ArgsError::MissingInput { command: "grade" })
        ));
    }

    #[test]
    fn second_positional_is_rejected_outside_grade() {
        assert!(matches!(
            parse(Command::Export, &["out.json", "extra"]),
            Err(ArgsError::UnknownArg(arg)) if arg == "extra"
        ));
    }
}
