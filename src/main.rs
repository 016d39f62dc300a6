//! # Habitust
//!
//! A terminal habit tracker written in Rust. Habits recur daily, monthly (on a day of the
//! month) or yearly (on a month and day); Habitust records each day you complete them and
//! derives streaks, upcoming dates, monthly statistics and streak achievements.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! habitust
//! # or explicitly
//! habitust ui
//! ```
//!
//! *   `Space`: Mark the selected habit done (or undo it)
//! *   `←`/`→`: Previous/next day, or month in the month view
//! *   `v`: Cycle Today, Habits and Month views
//! *   `a`: Add a habit, `p`: Pause/resume, `d`: Delete
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # Daily habit at 07:30
//! habitust add "Stretch" --time 07:30
//!
//! # Monthly on the 1st, yearly on June 6
//! habitust add "Pay rent" --frequency monthly --day 1
//! habitust add "Anniversary" --frequency yearly --month 6 --day 6
//!
//! # Complete a habit (ids accept any unique prefix)
//! habitust done 3f2a
//!
//! # What is due today, and this month's calendar
//! habitust today
//! habitust month --year 2024 --month 2 --json
//! ```
//!
//! ## Data Storage
//!
//! Habits are saved in your local data directory:
//! *   Linux: `~/.local/share/habitust/habits.json`
//! *   macOS: `~/Library/Application Support/habitust/habits.json`
//! *   Windows: `%APPDATA%\habitust\habits.json`
//!
//! You can override this by setting the `HABITUST_DB` environment variable.
//! Logs go to stderr; set `RUST_LOG` or pass `--verbose` to see them.

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use habitust::commands::*;
use habitust::models::Frequency;
use habitust::storage::JsonStore;
use habitust::tui::run_tui;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "habitust")]
#[command(about = "Terminal habit tracker with streaks", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new habit
    Add {
        /// Habit title (quoted if it has spaces)
        title: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Scheduled time of day, HH:MM (default 09:00)
        #[arg(short, long)]
        time: Option<String>,
        /// Recurrence (daily, monthly, yearly)
        #[arg(short, long, default_value = "daily")]
        frequency: Frequency,
        /// Day of the month (monthly and yearly habits)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=31))]
        day: Option<u32>,
        /// Month of the year (yearly habits)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// List habits
    List {
        /// Include paused habits
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a habit
    Edit {
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New description (empty to clear)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New time of day, HH:MM
        #[arg(short, long)]
        time: Option<String>,
        /// New recurrence
        #[arg(short, long)]
        frequency: Option<Frequency>,
        /// New day of the month
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=31))]
        day: Option<u32>,
        /// New month of the year
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Remove a habit and its history
    Remove {
        id: String,
    },
    /// Pause a habit without losing its history
    Pause {
        id: String,
    },
    /// Resume a paused habit
    Resume {
        id: String,
    },
    /// Mark a habit as done
    Done {
        id: String,
        /// Date in YYYY-MM-DD (default today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Undo a completion
    Undo {
        id: String,
        /// Date in YYYY-MM-DD (default today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show habits due on a date
    Today {
        /// Date in YYYY-MM-DD (default today)
        #[arg(short, long)]
        date: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show monthly statistics
    Month {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// List earned streak achievements
    Achievements {
        /// Only this habit
        id: Option<String>,
    },
    /// Reset the database (delete all habits and history)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);
    if !matches!(command, Commands::Ui) {
        init_logging(cli.verbose);
    }

    let mut store = JsonStore::open_default();
    match command {
        Commands::Add { title, description, time, frequency, day, month } => {
            match build_input(title, description, time, frequency, day, month) {
                Ok(input) => cmd_add(&mut store, input, false),
                Err(e) => eprintln!("{}", e),
            }
        }
        Commands::List { all } => cmd_list(&store, all),
        Commands::Edit { id, title, description, time, frequency, day, month } => {
            let edit = TaskEdit { title, description, time, frequency, day, month };
            cmd_edit(&mut store, &id, edit, false)
        }
        Commands::Remove { id } => cmd_remove(&mut store, &id, false),
        Commands::Pause { id } => cmd_set_active(&mut store, &id, false, false),
        Commands::Resume { id } => cmd_set_active(&mut store, &id, true, false),
        Commands::Done { id, date } => cmd_done(&mut store, &id, date, false),
        Commands::Undo { id, date } => cmd_undo(&mut store, &id, date, false),
        Commands::Today { date, json } => cmd_today(&store, date, json),
        Commands::Month { year, month, json } => cmd_month(&store, year, month, json),
        Commands::Achievements { id } => cmd_achievements(&store, id),
        Commands::Reset { force } => cmd_reset(&store, force),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "habitust", &mut io::stdout());
        }
        Commands::Ui => {
            if let Err(e) = run_tui(store) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
