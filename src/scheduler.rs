use std::time::Duration;

use anyhow::anyhow;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::services::uploads::ExportStore;

/// Periodically delete workbooks nobody downloaded in time
pub async fn schedule_export_purge(
    store: ExportStore,
    retention: Duration,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|err| anyhow!("Could not create the scheduler: {:?}", err))?;

    let job = Job::new_async(schedule, move |_, _| {
        let store = store.clone();
        Box::pin(async move {
            info!("Scheduled export purge in progress");
            match store.purge_exports_older_than(retention).await {
                Ok(removed) => info!("Scheduled export purge done, {} removed", removed),
                Err(err) => error!("Scheduled export purge failed: {}", err),
            }
        })
    })
    .map_err(|err| anyhow!("Invalid purge schedule {:?}: {:?}", schedule, err))?;

    scheduler
        .add(job)
        .await
        .map_err(|err| anyhow!("Could not schedule the export purge: {:?}", err))?;
    scheduler
        .start()
        .await
        .map_err(|err| anyhow!("Could not start the scheduler: {:?}", err))?;

    Ok(scheduler)
}
