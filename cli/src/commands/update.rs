//! `kube-autoupdate update` command.

use autoupdate_core::config::UpdaterConfig;
use autoupdate_core::error::Result;

pub async fn execute(config: UpdaterConfig) -> Result<()> {
    let reconciler = super::build_reconciler(&config).await?;

    let report = reconciler.sweep().await;
    if report.failed > 0 || report.list_failures > 0 {
        tracing::warn!(
            failed = report.failed,
            list_failures = report.list_failures,
            "Some workloads could not be updated"
        );
    }

    Ok(())
}
