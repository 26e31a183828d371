use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use quizdr::app::{App, AppScreen};
use quizdr::catalog::CategorySelection;
use quizdr::catalog::source::{CachedSource, DirSource, EmbeddedSource, TopicSource};
use quizdr::config::Config;
use quizdr::event::{AppEvent, EventHandler};
use quizdr::identity::{LocalIdentity, Plan};
use quizdr::session::QuizMode;
use quizdr::session::quiz::{NavOutcome, SubmitOutcome, TickOutcome};
use quizdr::session::review::ReviewFilter;
use quizdr::session::timer::{TimerDirection, TimerNotice, Urgency};
use quizdr::store::json_store::JsonStore;

#[derive(Parser)]
#[command(name = "quizdr", version, about = "Exam practice with timed sessions and progress tracking")]
struct Cli {
    #[arg(short, long, help = "User id for history and saved sessions")]
    user: Option<String>,

    #[arg(short, long, help = "Plan (free, premium)")]
    plan: Option<String>,

    #[arg(long, help = "Read the catalog from this directory")]
    catalog_dir: Option<String>,

    #[arg(long, help = "Fetch the catalog from this base URL")]
    catalog_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List topics and whether they are unlocked
    Topics,
    /// Start a session
    Start {
        topic: String,
        #[arg(short, long, default_value = "practice", help = "practice, exam or review")]
        mode: String,
        #[arg(short, long, default_value = "all", help = "Subcategory id or \"all\"")]
        category: String,
    },
    /// Continue the saved session
    Resume,
    /// Show progress analytics
    Stats,
    /// Check every topic document in the catalog
    Validate {
        /// Treat duplicate question ids as errors
        #[arg(long)]
        strict_duplicates: bool,
    },
    /// Write the current configuration to the config file
    InitConfig,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();
    if let Some(user) = cli.user {
        config.user_id = user;
    }
    if let Some(plan) = cli.plan {
        if Plan::from_name(&plan).is_none() {
            bail!("unknown plan '{plan}'");
        }
        config.plan = plan;
    }
    if cli.catalog_dir.is_some() {
        config.catalog_dir = cli.catalog_dir;
    }
    if cli.catalog_url.is_some() {
        config.catalog_url = cli.catalog_url;
    }
    init_tracing(&config.log_level);

    if let Some(Command::InitConfig) = cli.command {
        config.save()?;
        println!("configuration written");
        return Ok(ExitCode::SUCCESS);
    }

    let source = build_source(&config)?;
    let store = JsonStore::new()
        .inspect_err(|e| tracing::warn!(error = %e, "data directory unavailable, progress will not be saved"))
        .ok();
    let identity = LocalIdentity::new(config.user_id.clone(), config.plan());
    let mut app = App::new(config, source, store, Box::new(identity))?;

    match cli.command {
        Some(Command::Topics) => print_topics(&app),
        Some(Command::Stats) => print_stats(&app),
        Some(Command::Validate { strict_duplicates }) => {
            return Ok(print_validation(&app, strict_duplicates));
        }
        Some(Command::Start {
            topic,
            mode,
            category,
        }) => {
            let mode = parse_mode(&mode)?;
            app.start(&topic, mode, CategorySelection::from(category))?;
            interactive(&mut app)?;
        }
        Some(Command::Resume) => {
            app.resume()
                .map_err(|e| anyhow::anyhow!("no session to resume ({e})"))?;
            interactive(&mut app)?;
        }
        None => {
            if app.resume().is_ok() {
                println!("{}", "Resuming your saved session.".bold());
                interactive(&mut app)?;
            } else {
                print_topics(&app);
                interactive(&mut app)?;
            }
        }
        Some(Command::InitConfig) => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}

fn build_source(config: &Config) -> Result<Box<dyn TopicSource>> {
    #[cfg(feature = "network")]
    {
        if let Some(url) = &config.catalog_url {
            let http = quizdr::catalog::source::HttpSource::new(url)?;
            return Ok(Box::new(CachedSource::new(http)));
        }
    }
    if let Some(dir) = &config.catalog_dir {
        return Ok(Box::new(CachedSource::new(DirSource::new(dir))));
    }
    Ok(Box::new(CachedSource::new(EmbeddedSource)))
}

fn parse_mode(name: &str) -> Result<QuizMode> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "practice" => QuizMode::Practice,
        "exam" => QuizMode::Exam,
        "review" | "study" => QuizMode::Review,
        other => bail!("unknown mode '{other}'"),
    })
}

fn print_topics(app: &App) {
    match app.current_user() {
        Some(user) => println!("{} ({}, {} plan)", "Topics".bold(), user.id, user.plan.as_str()),
        None => println!("{} (signed out)", "Topics".bold()),
    }
    for (topic, unlocked) in app.topics() {
        let line = format!("  {:<24} {}", topic.id, topic.name);
        if unlocked {
            println!("{line}");
        } else {
            println!("{} {}", line.dim(), "(locked)".dim());
        }
    }
    if app.entitlement().is_restricted() {
        println!("{}", "Premium unlocks every topic and the full question bank.".dim());
    }
}

fn print_stats(app: &App) {
    let report = app.progress_report();
    println!("{}", "Progress".bold());
    println!("  attempts       {}", report.total_attempts);
    println!("  average score  {:.0}%", report.average_score);
    println!("  streak         {} day(s), best {}", report.streak_days, report.best_streak);
    if let Some(weakest) = report.weakest {
        println!("  weakest        {} ({:.0}%)", weakest.topic_name, weakest.average);
    }
    if let Some(strongest) = report.strongest {
        println!("  strongest      {} ({:.0}%)", strongest.topic_name, strongest.average);
    }
    if let Some(recommended) = report.recommended {
        println!("  next up        {}", recommended.yellow());
    }
}

fn print_validation(app: &App, strict_duplicates: bool) -> ExitCode {
    let report = app.validate_catalog(strict_duplicates);
    for topic in &report.topics {
        println!(
            "  {:<24} {} subcategories, {} questions",
            topic.topic_id, topic.subcategories, topic.questions
        );
    }
    for warning in &report.warnings {
        println!("{} {warning}", "warning:".yellow());
    }
    for error in &report.errors {
        println!("{} {error}", "error:".red());
    }
    if report.is_ok() {
        println!("{}", "catalog ok".green());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn interactive(app: &mut App) -> Result<()> {
    let events = EventHandler::new();
    app.attach_ticker(events.sender());
    render(app);

    loop {
        match events.next()? {
            AppEvent::Tick(generation) => {
                let outcome = app.on_tick(generation);
                report_tick(app, &outcome);
            }
            AppEvent::Input(line) => {
                if !handle_line(app, line.trim()) {
                    app.suspend();
                    return Ok(());
                }
            }
            AppEvent::Eof => {
                app.suspend();
                return Ok(());
            }
        }
    }
}

/// Returns false to quit.
fn handle_line(app: &mut App, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return true;
    };
    let arg = words.next();

    match (app.screen, cmd) {
        (_, "q" | "quit") => return false,
        (_, "stats") => print_stats(app),
        (_, "logout") => {
            app.logout();
            print_topics(app);
        }
        (AppScreen::TopicSelect, "topics") => print_topics(app),
        (AppScreen::TopicSelect, "start") => {
            let Some(topic) = arg else {
                println!("usage: start <topic> [practice|exam|review] [category]");
                return true;
            };
            let mode = match parse_mode(words.next().unwrap_or("practice")) {
                Ok(mode) => mode,
                Err(e) => {
                    println!("{e}");
                    return true;
                }
            };
            let category = CategorySelection::from(words.next().unwrap_or("all").to_string());
            match app.start(topic, mode, category) {
                Ok(()) => render(app),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        (AppScreen::Quiz | AppScreen::Review, _) => handle_session_line(app, cmd, arg),
        (AppScreen::Results, "r" | "review") => {
            if app.enter_review() {
                render(app);
            }
        }
        (AppScreen::Results, "retake") => retake(app, arg),
        (AppScreen::Results, "b" | "back") => {
            app.go_to_topics();
            print_topics(app);
        }
        _ => println!("{}", "unknown command".dim()),
    }
    true
}

fn handle_session_line(app: &mut App, cmd: &str, arg: Option<&str>) {
    if let Ok(n) = cmd.parse::<usize>() {
        if n > 0 && app.select_option(n - 1) {
            render(app);
        } else {
            println!("{}", "cannot select that now".dim());
        }
        return;
    }
    let outcome = match cmd {
        "s" | "submit" => {
            match app.submit() {
                SubmitOutcome::Revealed { correct: true } => println!("{}", "Correct!".green().bold()),
                SubmitOutcome::Revealed { correct: false } => println!("{}", "Incorrect.".red().bold()),
                SubmitOutcome::Ignored => println!("{}", "pick an option first".dim()),
            }
            render(app);
            return;
        }
        "n" | "next" => app.next(),
        "p" | "prev" => app.previous(),
        "g" | "goto" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if n > 0 => app.jump_to(n - 1),
            _ => NavOutcome::Blocked,
        },
        "f" | "finish" => match app.finish() {
            Some(result) => NavOutcome::Finished(result),
            None => NavOutcome::Ignored,
        },
        "filter" => {
            let filter = arg.and_then(ReviewFilter::from_name).unwrap_or_default();
            if !app.apply_review_filter(filter) {
                println!("{}", "no questions match that filter".dim());
            }
            render(app);
            return;
        }
        "retake" => {
            retake(app, arg);
            return;
        }
        "b" | "back" => {
            app.go_to_topics();
            print_topics(app);
            return;
        }
        _ => {
            println!("{}", "unknown command".dim());
            return;
        }
    };
    match outcome {
        NavOutcome::Blocked => println!("{}", "answer this question first".dim()),
        NavOutcome::Ignored => {}
        _ => render(app),
    }
}

fn retake(app: &mut App, arg: Option<&str>) {
    if !matches!(app.screen, AppScreen::Results | AppScreen::Review) {
        println!("{}", "finish the attempt before retaking it".dim());
        return;
    }
    match arg.and_then(ReviewFilter::from_name) {
        Some(filter) => {
            if !app.retake_filtered(filter) {
                println!("{}", "no questions match that filter".dim());
                return;
            }
        }
        None => match app.retake() {
            Ok(true) => {}
            Ok(false) => {
                println!("{}", "finish the attempt before retaking it".dim());
                return;
            }
            Err(e) => {
                println!("{}", e.to_string().red());
                return;
            }
        },
    }
    render(app);
}

fn report_tick(app: &App, outcome: &TickOutcome) {
    for notice in &outcome.notices {
        match notice {
            TimerNotice::Warning { remaining } if *remaining <= 10 => {
                println!("{}", format!("{remaining}s left").red().bold())
            }
            TimerNotice::Warning { remaining } => {
                println!("{}", format!("{} remaining", clock(*remaining)).yellow())
            }
            TimerNotice::Pacing { overrun } if *overrun == 1 => {
                println!("{}", "You are past exam pace.".yellow())
            }
            _ => {}
        }
    }
    if outcome.finished.is_some() {
        println!("{}", "Time is up.".red().bold());
        render(app);
    }
}

fn clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn render(app: &App) {
    match app.screen {
        AppScreen::TopicSelect => println!("{}", "start <topic> [mode] [category], stats, q".dim()),
        AppScreen::Results => render_results(app),
        AppScreen::Quiz | AppScreen::Review => render_question(app),
    }
}

fn render_question(app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let question = session.current_question();
    let timer = session.timer();
    let time = match timer.urgency() {
        Urgency::Calm => clock(timer.value()).stylize(),
        Urgency::Low => clock(timer.value()).yellow(),
        Urgency::Critical => clock(timer.value()).red().bold(),
    };
    // Practice counts up; show the exam-equivalent pace alongside.
    let pace = match timer.direction() {
        Some(TimerDirection::Up) => format!(" / {}", clock(timer.budget())),
        _ => String::new(),
    };
    println!();
    println!(
        "{} {}  {}{}",
        format!("[{}/{}]", session.current_index() + 1, session.working_len()).bold(),
        session.mode().as_str(),
        time,
        pace.dim()
    );
    println!("{}", question.question);

    let chosen = session.current_answer();
    let reveal = session.reveals_answer();
    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i) { '>' } else { ' ' };
        let line = format!(" {marker} {}) {option}", i + 1);
        if reveal && i == question.correct {
            println!("{}", line.green());
        } else if reveal && chosen == Some(i) {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
    if reveal && let Some(explanation) = &question.explanation {
        println!("{}", explanation.clone().dim());
    }
}

fn render_results(app: &App) {
    let Some(result) = app.last_result.as_ref() else {
        return;
    };
    println!();
    println!(
        "{} {}/{} ({}%)",
        "Score".bold(),
        result.score,
        result.total,
        result.percentage()
    );
    println!(
        "  correct {}  wrong {}  unanswered {}",
        result.correct, result.wrong, result.unanswered
    );
    if let Some(rows) = app.mock_breakdown() {
        for row in rows {
            println!(
                "  {:<28} {}/{} ({:.0}%)",
                row.topic_name, row.correct, row.total, row.accuracy
            );
        }
    }
    if let Some(next) = app.progress_report().recommended {
        println!("  recommended next: {}", next.yellow());
    }
    println!("{}", "review, retake [incorrect|unanswered], back, q".dim());
}
