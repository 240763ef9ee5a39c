//! Cron-driven maintenance jobs, dispatched from the binary's CLI.

use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use crate::shared::schema::{event_reminders, tasks};
use crate::shared::utils::DbPool;
use crate::tasks::TaskStage;

/// Flags every unfinished task whose due date has passed.
pub fn mark_overdue_tasks(pool: &DbPool) -> Result<usize> {
    let mut conn = pool.get()?;
    let today = Utc::now().date_naive();

    let updated = diesel::update(
        tasks::table
            .filter(tasks::stage.ne(TaskStage::Done.as_str()))
            .filter(tasks::is_overdue.eq(false))
            .filter(tasks::due_date.lt(today)),
    )
    .set(tasks::is_overdue.eq(true))
    .execute(&mut conn)?;

    info!("Marked {} task(s) as overdue", updated);
    Ok(updated)
}

/// Marks every due, unsent reminder as sent. Delivery itself is out of
/// process; this records the hand-off time.
pub fn send_due_reminders(pool: &DbPool) -> Result<usize> {
    let mut conn = pool.get()?;
    let now = Utc::now();

    let updated = diesel::update(
        event_reminders::table
            .filter(event_reminders::is_sent.eq(false))
            .filter(event_reminders::reminder_time.le(now)),
    )
    .set((
        event_reminders::is_sent.eq(true),
        event_reminders::sent_at.eq(Some(now)),
    ))
    .execute(&mut conn)?;

    info!("Sent {} reminder(s)", updated);
    Ok(updated)
}
