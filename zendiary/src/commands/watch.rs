//! Foreground reminder scheduler
//!
//! Reads the stored reminder list on every tick, so reminders added or
//! switched off from another shell take effect without a restart.

use crate::app::AppState;
use crate::config::REMINDER_TICK;
use crate::services::{LogSink, NudgeBanner, ReminderScheduler, SystemClock};
use anyhow::Result;

pub async fn run(app: &AppState) -> Result<()> {
    let settings = app.settings.load().await?;

    let active = app
        .store
        .load_reminders()
        .await?
        .iter()
        .filter(|r| r.active)
        .count();
    println!("Watching {} active reminders, Ctrl-C to stop", active);

    let banner = NudgeBanner::new(LogSink, settings.nudges);
    let scheduler =
        ReminderScheduler::start(app.store.clone(), banner, SystemClock, REMINDER_TICK);

    tokio::signal::ctrl_c().await?;
    scheduler.stop();

    Ok(())
}
