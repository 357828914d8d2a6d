//! PEAR - Entry Point
//!
//! Command-line front end for the progression engine. State lives under the
//! home directory (`--home` or `PEAR_HOME`).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use pear::clock::SystemClock;
use pear::config::EngineConfig;
use pear::data::{export_default_data, DataManager};
use pear::events::EventQueue;
use pear::progression::{LevelTable, Period, ProgressSession, ProgressSnapshot};
use pear::save::{default_home_dir, FileStore};

const BAR_WIDTH: usize = 20;

#[derive(Parser)]
#[command(name = "pear", version, about = "Track XP, levels and daily quests")]
struct Cli {
    /// Directory holding storage, data files and config.ron
    #[arg(long, env = "PEAR_HOME", global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show level, XP and quest progress
    Status,
    /// Award XP
    Add {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// Deduct XP
    Subtract {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
        #[arg(long, default_value = "manual")]
        source: String,
    },
    /// Reset all XP progress
    Reset,
    /// Zero the weekly or monthly XP counter
    ResetPeriod {
        #[arg(value_enum)]
        period: PeriodArg,
    },
    /// Acknowledge a pending level-up
    Dismiss,
    /// List today's quests
    Quests,
    /// Complete a daily quest
    Complete { id: String },
    /// Start a new daily quest window now
    ResetQuests,
    /// Record today's login for streak tracking
    Login,
    /// List all levels
    Levels,
    /// Write the default levels, quests and badges to the data directory
    ExportData,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Weekly,
    Monthly,
}

impl PeriodArg {
    fn label(self) -> &'static str {
        match self {
            PeriodArg::Weekly => "Weekly",
            PeriodArg::Monthly => "Monthly",
        }
    }
}

impl From<PeriodArg> for Period {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Weekly => Period::Weekly,
            PeriodArg::Monthly => Period::Monthly,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let home = cli.home.unwrap_or_else(default_home_dir);
    fs::create_dir_all(&home).with_context(|| format!("creating {}", home.display()))?;

    init_logging(&home);
    log::info!("Starting PEAR v{}", env!("CARGO_PKG_VERSION"));

    let config = EngineConfig::load(&home);
    let data_dir = home.join("data");
    let data = DataManager::load_from_dir(&data_dir);
    let events = EventQueue::new();
    let open = || {
        ProgressSession::open(
            Arc::new(FileStore::new(home.join("storage"))),
            Arc::new(SystemClock),
            &data,
            &config,
            Box::new(events.clone()),
        )
    };

    match cli.command {
        Command::Status => print_status(&open().snapshot()),
        Command::Add { amount, source } => match open().add_xp(amount, &source) {
            Some(outcome) => println!("Total XP: {}", outcome.total_xp),
            None => println!("Nothing awarded: amount must be positive"),
        },
        Command::Subtract { amount, source } => match open().subtract_xp(amount, &source) {
            Some(total) => println!("Total XP: {}", total),
            None => println!("Nothing deducted: amount must be positive"),
        },
        Command::Reset => {
            open().reset_xp();
            println!("XP progress reset");
        }
        Command::ResetPeriod { period } => {
            open().reset_period(period.into());
            println!("{} XP counter reset", period.label());
        }
        Command::Dismiss => match open().dismiss_level_up() {
            Some(level) => println!("Dismissed level-up to {} ({})", level.level, level.title),
            None => println!("No pending level-up"),
        },
        Command::Quests => {
            let mut session = open();
            let snapshot = session.snapshot();
            println!(
                "Daily quest XP: {}/{} ({} remaining)",
                snapshot.quest_xp_today, snapshot.daily_cap, snapshot.quest_xp_remaining
            );
            for quest in session.quests() {
                let mark = if quest.completed { "x" } else { " " };
                println!(
                    "[{}] {:<16} {:>4} XP  {:<10} {}",
                    mark,
                    quest.id,
                    quest.xp_value,
                    quest.category.name(),
                    quest.title
                );
            }
        }
        Command::Complete { id } => {
            let granted = open().complete_quest(&id);
            if granted == 0 {
                println!("No XP granted for {}: unknown, already done, or no XP remaining today", id);
            }
        }
        Command::ResetQuests => {
            open().reset_quests();
            println!("Daily quests reset");
        }
        Command::Login => println!("Login streak: {} days", open().record_login()),
        Command::Levels => print_levels(&data.levels, open().ledger().total_xp()),
        Command::ExportData => {
            export_default_data(&data_dir)?;
            println!("Default data written to {}", data_dir.display());
        }
    }

    for event in events.drain() {
        println!("{}", event.message());
    }

    log::info!("PEAR shut down cleanly");
    Ok(())
}

/// Log to a file in the home directory so stdout stays readable
fn init_logging(home: &Path) {
    let builder = || env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    match OpenOptions::new().create(true).append(true).open(home.join("pear.log")) {
        Ok(file) => {
            builder().target(env_logger::Target::Pipe(Box::new(file))).init();
        }
        Err(e) => {
            builder().init();
            log::warn!("Could not open log file: {}", e);
        }
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn print_status(snapshot: &ProgressSnapshot) {
    let progress = &snapshot.progress;
    println!("Level {} - {}", progress.current.level, progress.current.title);
    println!("{}", progress.current.description);
    println!("XP: {}  {} {}%", progress.total_xp, progress_bar(progress.percent), progress.percent);
    match &progress.next {
        Some(next) => println!("Next: level {} ({}) in {} XP", next.level, next.title, progress.xp_to_next),
        None => println!("Max level reached"),
    }
    println!("This week: {} XP  This month: {} XP", snapshot.weekly_xp, snapshot.monthly_xp);
    println!(
        "Daily quests: {}/{} XP ({} remaining)",
        snapshot.quest_xp_today, snapshot.daily_cap, snapshot.quest_xp_remaining
    );
    println!("Login streak: {} days", snapshot.streak_days);
    if !snapshot.badges.is_empty() {
        println!("Badges: {}", snapshot.badges.join(", "));
    }
    if let Some(level) = &snapshot.pending_level_up {
        println!("LEVEL UP! You reached level {}: {}", level.level, level.title);
    }
}

fn print_levels(levels: &LevelTable, total_xp: u32) {
    let current = levels.resolve_level(total_xp).level;
    for level in levels.levels() {
        let marker = if level.level == current { ">" } else { " " };
        println!("{} {:>2} {:>6} XP  {}", marker, level.level, level.xp_threshold, level.title);
    }
}
