//! `kube-autoupdate schedule` command.

use autoupdate_core::config::UpdaterConfig;
use autoupdate_core::error::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Minutes to wait after each sweep
    #[arg(long, env = "SCHEDULE_DELAY_MINUTES")]
    pub interval_minutes: Option<u64>,

    /// Minutes to wait before the first sweep (defaults to the interval; 0 starts immediately)
    #[arg(long, env = "SCHEDULE_INITIAL_DELAY_MINUTES")]
    pub initial_delay_minutes: Option<u64>,
}

impl ScheduleArgs {
    pub(super) fn apply(&self, config: &mut UpdaterConfig) {
        if let Some(interval) = self.interval_minutes {
            config.schedule.interval_minutes = interval;
        }
        if let Some(delay) = self.initial_delay_minutes {
            config.schedule.initial_delay_minutes = Some(delay);
        }
    }
}

pub async fn execute(config: UpdaterConfig) -> Result<()> {
    let reconciler = super::build_reconciler(&config).await?;

    tracing::info!(
        interval_minutes = config.schedule.interval_minutes,
        dry_run = config.dry_run,
        "Starting scheduled updates"
    );
    reconciler
        .run_scheduled(config.schedule.initial_delay(), config.schedule.interval())
        .await;

    Ok(())
}
