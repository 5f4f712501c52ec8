use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use chrono::Utc;

use api::{ApiConfig, Backend, InMemoryBackend, ListQuery, Paginated};
use lms_core::model::{
    Course, CourseId, CourseLevel, CourseModule, Lesson, LessonId, LessonKind, ModuleId,
    QuestionDifficulty, QuestionKind, QuestionOption, Quiz, QuizId, QuizQuestion, QuizStatus,
    Transaction, TransactionId, TransactionKind, TransactionStatus, UserId,
};
use lms_core::Clock;
use services::{CertificateService, PlayerLoopService, PlayerSession, ReportsService, SyncOutcome};

//
// ─── ARGUMENTS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    MissingApiUrl,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::MissingApiUrl => {
                write!(f, "no backend configured: set LMS_API_URL / --api or pass --demo")
            }
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

fn parse_number(flag: &'static str, raw: String) -> Result<u64, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Enrollments,
    Certificates,
    Transactions,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "enrollments" => Some(Self::Enrollments),
            "certificates" => Some(Self::Certificates),
            "transactions" => Some(Self::Transactions),
            _ => None,
        }
    }
}

struct Args {
    demo: bool,
    api_url: Option<String>,
    api_token: Option<String>,
    course_id: CourseId,
    user_id: UserId,
    list: ListQuery,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            demo: false,
            api_url: std::env::var("LMS_API_URL").ok().filter(|v| !v.is_empty()),
            api_token: std::env::var("LMS_API_TOKEN").ok().filter(|v| !v.is_empty()),
            course_id: CourseId::new(1),
            user_id: std::env::var("LMS_USER_ID")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .map_or_else(|| UserId::new(1), UserId::new),
            list: ListQuery::new(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--demo" => parsed.demo = true,
                "--api" => parsed.api_url = Some(require_value(args, "--api")?),
                "--token" => parsed.api_token = Some(require_value(args, "--token")?),
                "--course-id" => {
                    let raw = require_value(args, "--course-id")?;
                    parsed.course_id = CourseId::new(parse_number("--course-id", raw)?);
                }
                "--user-id" => {
                    let raw = require_value(args, "--user-id")?;
                    parsed.user_id = UserId::new(parse_number("--user-id", raw)?);
                }
                "--page" => {
                    let raw = require_value(args, "--page")?;
                    parsed.list.page = Some(parse_number("--page", raw)? as u32);
                }
                "--limit" => {
                    let raw = require_value(args, "--limit")?;
                    parsed.list.limit = Some(parse_number("--limit", raw)? as u32);
                }
                "--q" => parsed.list.q = Some(require_value(args, "--q")?),
                "--status" => parsed.list.status = Some(require_value(args, "--status")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn backend(&self) -> Result<Backend, Box<dyn std::error::Error>> {
        if self.demo {
            return demo_backend();
        }
        match &self.api_url {
            Some(url) => {
                let mut config = ApiConfig::new(url.clone());
                if let Some(token) = &self.api_token {
                    config = config.with_bearer_token(token.clone());
                }
                Ok(Backend::rest(config))
            }
            None => Err(ArgsError::MissingApiUrl.into()),
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app play         [--course-id <id>] [--user-id <id>]");
    eprintln!("  app enrollments  [--page N] [--limit N] [--q S] [--status S]");
    eprintln!("  app certificates [--page N] [--limit N] [--q S] [--status S]");
    eprintln!("  app transactions [--page N] [--limit N] [--q S] [--status S]");
    eprintln!();
    eprintln!("Backend selection:");
    eprintln!("  --api <url>   REST backend (default: LMS_API_URL)");
    eprintln!("  --token <t>   bearer token (default: LMS_API_TOKEN)");
    eprintln!("  --demo        seeded in-memory backend, no network");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LMS_API_URL, LMS_API_TOKEN, LMS_USER_ID");
}

//
// ─── DEMO BACKEND ──────────────────────────────────────────────────────────────
//

/// Seeds a small course so the binary runs without a live API.
fn demo_backend() -> Result<Backend, Box<dyn std::error::Error>> {
    let store = InMemoryBackend::new();
    let now = Utc::now();

    let course = Course::new(
        CourseId::new(1),
        "Rust Fundamentals",
        Some("Ownership, borrowing, and the road to the borrow checker's heart.".into()),
        CourseLevel::Beginner,
        "en",
        49.0,
        240,
        true,
        Some("programming".into()),
        UserId::new(100),
        now,
    )?;
    store.seed_course(course)?;

    store.seed_module(CourseModule::new(
        ModuleId::new(1),
        CourseId::new(1),
        "Getting Started",
        0,
        now,
    )?)?;
    store.seed_module(CourseModule::new(
        ModuleId::new(2),
        CourseId::new(1),
        "Ownership",
        1,
        now,
    )?)?;

    let video = |id: u64, module: u64, title: &str, position: u32| {
        Lesson::new(
            LessonId::new(id),
            ModuleId::new(module),
            title,
            LessonKind::Video,
            position,
            420,
            position == 0,
            None,
            None,
            now,
        )
    };
    store.seed_lesson(video(1, 1, "Hello, Cargo", 0)?)?;
    store.seed_lesson(video(2, 1, "Variables and Types", 1)?)?;
    store.seed_lesson(video(3, 2, "Moves and Borrows", 0)?)?;

    store.seed_quiz(Quiz::new(
        QuizId::new(10),
        "Ownership Checkpoint",
        Some("One attempt per sitting.".into()),
        Some(10),
        Some(3),
        70,
        true,
        true,
        QuizStatus::Published,
        None,
        None,
    )?)?;
    store.seed_lesson(Lesson::new(
        LessonId::new(4),
        ModuleId::new(2),
        "Checkpoint",
        LessonKind::Quiz,
        1,
        0,
        false,
        None,
        Some(QuizId::new(10)),
        now,
    )?)?;
    store.seed_question(QuizQuestion::new(
        lms_core::model::QuestionId::new(1),
        QuizId::new(10),
        QuestionKind::SingleChoice,
        "Assigning a String to a second binding does what?",
        vec![
            QuestionOption::new("Moves it", true),
            QuestionOption::new("Copies it", false),
            QuestionOption::new("Borrows it", false),
        ],
        1,
        0,
        QuestionDifficulty::Easy,
    )?)?;

    let transaction = |id: u64, user: u64, amount: f64, status: TransactionStatus| Transaction {
        id: TransactionId::new(id),
        user_id: UserId::new(user),
        course_id: CourseId::new(1),
        kind: TransactionKind::Purchase,
        status,
        amount,
        currency: "USD".into(),
        fee: amount * 0.05,
        net: amount * 0.95,
        created_at: now,
    };
    store.seed_transaction(transaction(1, 7, 49.0, TransactionStatus::Paid))?;
    store.seed_transaction(transaction(2, 8, 49.0, TransactionStatus::Pending))?;

    Ok(Backend::from_memory(store))
}

//
// ─── PLAYER LOOP ───────────────────────────────────────────────────────────────
//

enum PlayerCommand {
    Next,
    Goto(usize),
    Done,
    Quiz,
    Status,
    Help,
    Quit,
    Unknown(String),
}

impl PlayerCommand {
    fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("next") | Some("n") => Self::Next,
            Some("goto") => match parts.next().and_then(|raw| raw.parse().ok()) {
                Some(index) => Self::Goto(index),
                None => Self::Unknown(line.to_owned()),
            },
            Some("done") | Some("d") => Self::Done,
            Some("quiz") => Self::Quiz,
            Some("status") | Some("s") => Self::Status,
            Some("help") | Some("?") => Self::Help,
            Some("quit") | Some("q") => Self::Quit,
            Some(_) => Self::Unknown(line.to_owned()),
            None => Self::Status,
        }
    }
}

fn print_player_help() {
    println!("commands:");
    println!("  next          go to the next lesson");
    println!("  goto <n>      jump to lesson n (0-based)");
    println!("  done          mark the current video as finished");
    println!("  quiz          check the current lesson's quiz window");
    println!("  status        show position and progress");
    println!("  quit          leave the player");
}

fn print_status(session: &PlayerSession) {
    let progress = session.progress();
    let lesson = session.current_lesson();
    println!(
        "[{}] {} / {} ({}/{} lessons, {}%)",
        session.current_index(),
        session.current_module().title(),
        lesson.title(),
        progress.completed,
        progress.total,
        progress.percent,
    );
}

fn report_sync(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Synced(enrollment) => {
            println!("  saved ({}%)", enrollment.progress());
        }
        SyncOutcome::AlreadyCompleted => {}
        SyncOutcome::Failed { attempts, error } => {
            println!("  warning: progress not saved after {attempts} attempts: {error}");
            println!("  (kept locally; it will be pushed on your next move)");
        }
    }
}

async fn play(backend: &Backend, user: UserId, course: CourseId) -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    let loop_svc = PlayerLoopService::new(
        clock,
        Arc::clone(&backend.catalog),
        Arc::clone(&backend.enrollments),
    );
    let certificates = CertificateService::new(Arc::clone(&backend.certificates));

    let mut session = loop_svc.start(user, course).await?;
    println!("{}", session.catalog().course().title());
    for (index, module) in session.catalog().modules().iter().enumerate() {
        println!("  module {}: {} ({} lessons)", index, module.module().title(), module.lessons().len());
    }
    print_status(&session);
    print_player_help();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match PlayerCommand::parse(line.trim()) {
            PlayerCommand::Next => match loop_svc.advance(&mut session).await {
                Some(outcome) => {
                    print_status(&session);
                    report_sync(&outcome);
                }
                None => println!("already on the last lesson"),
            },
            PlayerCommand::Goto(index) => match loop_svc.go_to_lesson(&mut session, index).await {
                Ok(outcome) => {
                    print_status(&session);
                    report_sync(&outcome);
                }
                Err(err) => println!("{err}"),
            },
            PlayerCommand::Done => {
                let outcome = loop_svc.note_video_ended(&mut session).await;
                report_sync(&outcome);
                if session.enrollment().is_completed() {
                    println!("course completed!");
                    match certificates.view(session.enrollment()).await {
                        Ok(certificate) => {
                            println!("certificate {}", certificate.certificate_number);
                        }
                        Err(err) => println!("certificate unavailable: {err}"),
                    }
                } else {
                    print_status(&session);
                }
            }
            PlayerCommand::Quiz => match session.current_quiz_eligibility(clock.now()) {
                None => println!("current lesson is not a quiz"),
                Some(eligibility) => println!("quiz is {eligibility:?}"),
            },
            PlayerCommand::Status => print_status(&session),
            PlayerCommand::Help => print_player_help(),
            PlayerCommand::Quit => break,
            PlayerCommand::Unknown(line) => {
                println!("unknown command: {line}");
                print_player_help();
            }
        }
    }

    Ok(())
}

//
// ─── REPORT TABLES ─────────────────────────────────────────────────────────────
//

fn print_page_footer<T>(page: &Paginated<T>) {
    println!(
        "page {}/{} ({} total)",
        page.page,
        page.total_pages().max(1),
        page.total
    );
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let backend = args.backend()?;
    let reports = ReportsService::new(
        Arc::clone(&backend.enrollments),
        Arc::clone(&backend.certificates),
        Arc::clone(&backend.transactions),
    );

    match cmd {
        Command::Play => play(&backend, args.user_id, args.course_id).await,
        Command::Enrollments => {
            let page = reports.enrollments(&args.list).await?;
            for e in &page.items {
                println!(
                    "{:>6}  user {:>6}  course {:>6}  {:?}  {:>3}%",
                    e.id(),
                    e.user_id(),
                    e.course_id(),
                    e.status(),
                    e.progress()
                );
            }
            print_page_footer(&page);
            Ok(())
        }
        Command::Certificates => {
            let page = reports.certificates(&args.list).await?;
            for c in &page.items {
                println!(
                    "{:>6}  user {:>6}  course {:>6}  {}  {:?}",
                    c.id, c.user_id, c.course_id, c.certificate_number, c.status
                );
            }
            print_page_footer(&page);
            Ok(())
        }
        Command::Transactions => {
            let page = reports.transactions(&args.list).await?;
            for t in &page.items {
                println!(
                    "{:>6}  user {:>6}  course {:>6}  {:?}/{:?}  {:>8.2} {}  net {:>8.2}",
                    t.id, t.user_id, t.course_id, t.kind, t.status, t.amount, t.currency, t.net
                );
            }
            print_page_footer(&page);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
