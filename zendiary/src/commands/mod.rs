//! Command-line commands
//!
//! One submodule per area:
//! - `account`: login, logout and the current user
//! - `entries`: writing, listing, favoriting and deleting entries
//! - `reminders`: reminder CRUD
//! - `settings`: analysis backend configuration
//! - `sync`: simulated cloud sync
//! - `watch`: the reminder scheduler in the foreground

pub mod account;
pub mod entries;
pub mod reminders;
pub mod settings;
pub mod sync;
pub mod watch;

use crate::app::AppState;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a session for an email address
    Login { email: String },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Write a new entry or edit an existing one
    Write(entries::WriteCmd),
    /// List entries grouped by month
    List(entries::ListCmd),
    /// Toggle an entry's favorite flag
    Favorite { id: String },
    /// Delete an entry
    Delete { id: String },
    #[command(subcommand)]
    Reminder(reminders::Cmd),
    /// Configure the analysis backend
    Analysis(settings::AnalysisCmd),
    /// Back up entries to the cloud drive
    Sync(sync::Cmd),
    /// Run the reminder scheduler until interrupted
    Watch,
}

impl Command {
    pub async fn run(self, app: &AppState) -> Result<()> {
        match self {
            Self::Login { email } => account::login(app, &email).await,
            Self::Logout => account::logout(app).await,
            Self::Whoami => account::whoami(app).await,
            Self::Write(cmd) => cmd.run(app).await,
            Self::List(cmd) => cmd.run(app).await,
            Self::Favorite { id } => entries::favorite(app, &id).await,
            Self::Delete { id } => entries::delete(app, &id).await,
            Self::Reminder(cmd) => cmd.run(app).await,
            Self::Analysis(cmd) => cmd.run(app).await,
            Self::Sync(cmd) => cmd.run(app).await,
            Self::Watch => watch::run(app).await,
        }
    }
}
