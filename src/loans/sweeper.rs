//! Overdue-loan sweep
//!
//! A scheduled job that defaults active loans past their due date. Runs
//! hourly; each sweep is a single conditional UPDATE so overlapping runs
//! are harmless.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::LoanService;

/// Hourly, on the hour
const SWEEP_SCHEDULE: &str = "0 0 * * * *";

/// Register the overdue sweep on a scheduler and start it
pub async fn start_overdue_sweeper(loan_service: Arc<LoanService>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .context("Failed to create job scheduler")?;

    let job = Job::new_async(SWEEP_SCHEDULE, move |_uuid, _lock| {
        let loan_service = loan_service.clone();
        Box::pin(async move {
            match loan_service.sweep_overdue(Utc::now()).await {
                Ok(defaulted) if !defaulted.is_empty() => {
                    tracing::info!(count = defaulted.len(), "Overdue loans defaulted");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Overdue loan sweep failed");
                }
            }
        })
    })
    .context("Failed to build overdue sweep job")?;

    scheduler
        .add(job)
        .await
        .context("Failed to schedule overdue sweep")?;
    scheduler
        .start()
        .await
        .context("Failed to start job scheduler")?;

    tracing::info!(schedule = SWEEP_SCHEDULE, "Overdue loan sweeper started");

    Ok(scheduler)
}
