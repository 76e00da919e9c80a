//! Settings commands

use crate::app::AppState;
use crate::services::settings::AnalysisSettings;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct AnalysisCmd {
    /// Endpoint accepting `{"content": ...}`; omit to show the current setting
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer key sent with each request
    #[arg(long, env = "ZENDIARY_ANALYSIS_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Turn analysis off
    #[arg(long, conflicts_with = "endpoint")]
    disable: bool,
}

impl AnalysisCmd {
    pub async fn run(self, app: &AppState) -> Result<()> {
        if self.disable {
            app.settings
                .update_analysis(AnalysisSettings::default())
                .await?;
            println!("Analysis disabled");
            return Ok(());
        }

        let Some(endpoint) = self.endpoint else {
            let settings = app.settings.load().await?;
            match settings.analysis.endpoint {
                Some(endpoint) => println!(
                    "Analysis endpoint: {} (timeout {}s)",
                    endpoint, settings.analysis.timeout_secs
                ),
                None => println!("Analysis disabled"),
            }
            return Ok(());
        };

        app.settings
            .update_analysis(AnalysisSettings {
                endpoint: Some(endpoint.clone()),
                api_key: self.api_key,
                timeout_secs: self.timeout_secs,
            })
            .await?;

        println!("Analysis endpoint set to {}", endpoint);
        Ok(())
    }
}
