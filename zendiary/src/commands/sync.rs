//! Sync command

use crate::app::AppState;
use crate::services::{DriveSyncSimulator, Resolution, SyncOutcome, SyncService, SyncStatus};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct Cmd {
    /// Stop at a version conflict
    #[arg(long)]
    conflict: bool,

    /// Side to keep when a conflict comes up: local or cloud
    #[arg(long)]
    keep: Option<Resolution>,
}

impl Cmd {
    pub async fn run(self, app: &AppState) -> Result<()> {
        let settings = app.settings.load().await?;
        let simulator = DriveSyncSimulator::new(app.store.clone(), settings.sync);

        let pending = match simulator.sync(print_status, self.conflict).await? {
            SyncOutcome::Synchronized(status) => {
                print_last_sync(&status);
                return Ok(());
            }
            SyncOutcome::Conflict(pending) => pending,
        };

        let details = &pending.details;
        println!("  file:  {}", details.file_name);
        println!("  local: {}", details.local_date);
        println!("  cloud: {}", details.cloud_date);

        let Some(resolution) = self.keep else {
            println!("Re-run with --keep local or --keep cloud to finish the sync");
            return Ok(());
        };

        let status = simulator.resolve(pending, resolution, print_status).await?;
        print_last_sync(&status);
        Ok(())
    }
}

fn print_status(status: &SyncStatus) {
    println!("[{:>3.0}%] {}", status.progress, status.status);
}

fn print_last_sync(status: &SyncStatus) {
    if let Some(last_sync) = &status.last_sync {
        println!("Last sync: {}", last_sync);
    }
}
