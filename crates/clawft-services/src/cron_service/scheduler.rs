//! In-memory cron scheduler.
//!
//! Maintains a map of [`CronJob`] entries and determines which are due
//! to fire based on their `next_run_at_ms` timestamp.
//!
//! Uses the canonical [`CronJob`] type from [`clawft_types::cron`].

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use cron::Schedule;

use crate::error::{Result, ServiceError};

// Re-export the canonical CronJob from clawft-types.
pub use clawft_types::cron::{
    CronJob, CronJobState, CronPayload, CronSchedule, CronStore, JobStatus, PayloadKind,
    ScheduleKind,
};

/// In-memory scheduler holding all jobs.
pub struct CronScheduler {
    jobs: HashMap<String, CronJob>,
}

impl CronScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
        }
    }

    /// Add a job to the scheduler.
    ///
    /// Validates the cron expression (if the schedule kind is `Cron`)
    /// and rejects duplicate names.
    pub fn add_job(&mut self, job: CronJob) -> Result<()> {
        // Validate the cron expression if present.
        if job.schedule.kind == ScheduleKind::Cron
            && let Some(ref expr) = job.schedule.expr
        {
            Schedule::from_str(expr)
                .map_err(|e| ServiceError::InvalidCronExpression(e.to_string()))?;
        }

        // Check for duplicate names.
        if self
            .jobs
            .values()
            .any(|j| j.name == job.name && j.id != job.id)
        {
            return Err(ServiceError::DuplicateJobName(job.name.clone()));
        }

        self.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Remove a job by ID.
    pub fn remove_job(&mut self, job_id: &str) -> Result<()> {
        self.jobs
            .remove(job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
        Ok(())
    }

    /// Return all enabled jobs whose `next_run_at_ms` is at or before now.
    pub fn get_due_jobs(&self) -> Vec<CronJob> {
        let now_ms = Utc::now().timestamp_millis();
        self.jobs
            .values()
            .filter(|j| j.enabled && j.state.next_run_at_ms.is_some_and(|nr| nr <= now_ms))
            .cloned()
            .collect()
    }

    /// List all jobs.
    pub fn list_jobs(&self) -> Vec<CronJob> {
        self.jobs.values().cloned().collect()
    }

    /// Get a reference to a job by ID.
    pub fn get_job(&self, job_id: &str) -> Option<&CronJob> {
        self.jobs.get(job_id)
    }

    /// Get a mutable reference to a job by ID.
    pub fn get_job_mut(&mut self, job_id: &str) -> Option<&mut CronJob> {
        self.jobs.get_mut(job_id)
    }

    /// Record that a job has run and compute the next run time.
    pub fn update_job_run(&mut self, job_id: &str, run_time: DateTime<Utc>) -> Result<()> {
        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;

        job.state.last_run_at_ms = Some(run_time.timestamp_millis());
        job.state.last_status = Some(JobStatus::Ok);
        job.updated_at_ms = run_time.timestamp_millis();

        // Compute next run from the cron schedule expression.
        if job.schedule.kind == ScheduleKind::Cron
            && let Some(ref expr) = job.schedule.expr
            && let Ok(schedule) = Schedule::from_str(expr)
        {
            job.state.next_run_at_ms =
                schedule.after(&run_time).next().map(|dt| dt.timestamp_millis());
        }

        Ok(())
    }
}

impl Default for CronScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the next run time for a cron expression after a given time.
///
/// Returns `None` if the schedule has no further occurrences.
pub fn compute_next_run(
    schedule_expr: &str,
    after: &DateTime<Utc>,
) -> Result<Option<i64>> {
    let schedule = Schedule::from_str(schedule_expr)
        .map_err(|e| ServiceError::InvalidCronExpression(e.to_string()))?;
    Ok(schedule.after(after).next().map(|dt| dt.timestamp_millis()))
}

/// Convert a millisecond timestamp to a `DateTime<Utc>`, if valid.
pub fn ms_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}
