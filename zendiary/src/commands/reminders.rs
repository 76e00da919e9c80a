//! Reminder commands

use crate::app::AppState;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Add a daily reminder
    Add {
        title: String,
        /// HH:MM, 24-hour
        time: String,
    },
    /// List reminders
    List,
    /// Switch a reminder on or off
    Toggle { id: String },
    /// Remove a reminder
    Remove { id: String },
}

impl Cmd {
    pub async fn run(self, app: &AppState) -> Result<()> {
        let mut session = app.open_session().await?;

        match self {
            Self::Add { title, time } => {
                let reminder = session.add_reminder(&title, &time).await?;
                println!("Added reminder {} at {}", reminder.id, reminder.time);
            }
            Self::List => {
                if session.reminders().is_empty() {
                    println!("No reminders");
                }
                for reminder in session.reminders() {
                    println!(
                        "{} {} {} {}",
                        reminder.id,
                        reminder.time,
                        if reminder.active { "on " } else { "off" },
                        reminder.title
                    );
                }
            }
            Self::Toggle { id } => {
                let active = session.toggle_reminder(&id).await?;
                println!("Reminder {} is {}", id, if active { "on" } else { "off" });
            }
            Self::Remove { id } => {
                session.delete_reminder(&id).await?;
                println!("Removed reminder {}", id);
            }
        }

        Ok(())
    }
}
