//! # choreboard
//!
//! Household chores in the terminal. Every chore repeats after a number of
//! days; choreboard projects the coming occurrences onto a calendar, lets the
//! household claim and complete them, and shows how close each chore is to
//! being due.
//!
//! ## Usage
//!
//! ```bash
//! # A chore done today that comes back every 3 days
//! choreboard add "Clean toilets" --every 3
//!
//! # A weekly chore whose first occurrence is on a given day, claimed by me
//! choreboard add "Take out recycling" --every 7 --due 2025-03-14 --assign
//!
//! # Chores sorted by urgency, with timer bars
//! choreboard list
//!
//! # Upcoming occurrences, then claim and complete one
//! choreboard upcoming --days 7
//! choreboard assign 01JNX4Q2ZK8MW7QD@2025-03-14
//! choreboard complete 01JNX4Q2ZK8MW7QD@2025-03-14
//!
//! # Act as another household member
//! choreboard --as user_2 assign 01JNX4Q2ZK8MW7QD@2025-03-21
//! ```
//!
//! Running without a subcommand opens the interactive UI.
//!
//! ## Data Storage
//!
//! `tasks.json`, `events.json` and `users.json` live in the local data
//! directory (`~/.local/share/choreboard` on Linux), or in
//! `CHOREBOARD_DATA_DIR` when set. `CHOREBOARD_HORIZON_DAYS` changes how far
//! ahead occurrences are projected (60 days by default).

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::EnvFilter;

use choreboard::commands::*;
use choreboard::config::Config;
use choreboard::tui::run_tui;

#[derive(Parser)]
#[command(name = "choreboard")]
#[command(about = "Recurring household chores on a shared calendar", long_about = None)]
struct Cli {
    /// Household member to act as
    #[arg(long = "as", global = true, env = "CHOREBOARD_USER")]
    user: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a recurring chore
    Add {
        /// Chore name (quoted if it has spaces)
        name: String,
        /// Repeat every N days
        #[arg(short, long, default_value_t = 3)]
        every: i64,
        /// Date of the first occurrence (YYYY-MM-DD); defaults to N days from now
        #[arg(short, long)]
        due: Option<String>,
        /// Assign the first occurrence to yourself
        #[arg(short, long)]
        assign: bool,
    },
    /// List chores sorted by urgency
    List,
    /// Edit a chore
    Edit {
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New interval in days
        #[arg(short, long)]
        every: Option<i64>,
    },
    /// Remove a chore
    Remove {
        id: String,
    },
    /// Mark a chore done now
    Done {
        id: String,
    },
    /// Show projected occurrences
    Upcoming {
        /// Only the next N days
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Show the month (or week) calendar
    Calendar {
        /// Show a single week
        #[arg(short, long)]
        week: bool,
        /// Any day in the month or week to show (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Claim an occurrence
    Assign {
        occurrence: String,
    },
    /// Release a claimed occurrence
    Unassign {
        occurrence: String,
    },
    /// Complete an occurrence
    Complete {
        occurrence: String,
    },
    /// Chore statistics
    Report,
    /// Manage household members
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Recompute all occurrences from the chores
    Regenerate,
    /// Reset the database (delete all chores and occurrences)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum UserCommands {
    /// List household members
    List,
    /// Rename a household member
    Rename {
        id: String,
        name: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    if !matches!(cli.command, Some(Commands::Ui) | None) {
        init_logging();
    }

    let config = Config::from_env();
    let user = cli.user.unwrap_or(config.user);

    match cli.command {
        Some(Commands::Add { name, every, due, assign }) => cmd_add(name, every, due, assign, &user, false),
        Some(Commands::List) => cmd_list(),
        Some(Commands::Edit { id, name, every }) => cmd_edit(id, name, every, false),
        Some(Commands::Remove { id }) => cmd_remove(id, false),
        Some(Commands::Done { id }) => cmd_done(id, &user, false),
        Some(Commands::Upcoming { days }) => cmd_upcoming(days),
        Some(Commands::Calendar { week, date }) => cmd_calendar(week, date),
        Some(Commands::Assign { occurrence }) => cmd_assign(occurrence, &user, false),
        Some(Commands::Unassign { occurrence }) => cmd_unassign(occurrence, false),
        Some(Commands::Complete { occurrence }) => cmd_complete(occurrence, &user, false),
        Some(Commands::Report) => cmd_report(),
        Some(Commands::User { command }) => match command {
            UserCommands::List => cmd_user_list(),
            UserCommands::Rename { id, name } => cmd_user_rename(id, name, false),
        },
        Some(Commands::Regenerate) => cmd_regenerate(false),
        Some(Commands::Reset { force }) => cmd_reset(force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "choreboard", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(&user) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
