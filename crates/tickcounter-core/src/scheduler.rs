//! Cooperative repeating-task scheduler.
//!
//! Everything runs on one thread. The host loop asks [`Scheduler::due`] which
//! tasks should run now, runs them to completion, then sleeps (or waits on
//! input) until [`Scheduler::next_deadline`]. Tasks are not ordered relative
//! to each other beyond their deadlines.

use std::time::{Duration, Instant};

use tracing::trace;

/// Handle to a scheduled repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Task {
    handle: TaskHandle,
    period: Duration,
    next_due: Instant,
}

/// A set of repeating tasks keyed by [`TaskHandle`].
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task that first fires at `now` and then every `period`.
    pub fn schedule_repeating(&mut self, period: Duration, now: Instant) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        // A zero period would make `due` spin forever.
        let period = period.max(Duration::from_millis(1));
        self.tasks.push(Task {
            handle,
            period,
            next_due: now,
        });
        trace!(task = handle.0, period_ms = period.as_millis() as u64, "task scheduled");
        handle
    }

    /// Cancel a task. Cancelling twice, or cancelling an unknown handle, is a no-op.
    pub fn cancel(&mut self, handle: TaskHandle) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        if self.tasks.len() != before {
            trace!(task = handle.0, "task cancelled");
        }
    }

    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Earliest deadline among active tasks.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Time left until the earliest deadline, zero if already overdue.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Collect the tasks whose deadline has passed and re-arm them.
    ///
    /// Each task is reported at most once per call, in deadline order. Periods
    /// missed while the host was busy are skipped rather than replayed in a
    /// burst.
    pub fn due(&mut self, now: Instant) -> Vec<TaskHandle> {
        let mut fired: Vec<(Instant, TaskHandle)> = Vec::new();
        for task in &mut self.tasks {
            if task.next_due > now {
                continue;
            }
            fired.push((task.next_due, task.handle));
            task.next_due = next_after(task.next_due, task.period, now);
        }
        fired.sort_by_key(|(due, _)| *due);
        fired.into_iter().map(|(_, handle)| handle).collect()
    }
}

/// First deadline on the `due + k * period` grid that lies after `now`.
fn next_after(due: Instant, period: Duration, now: Instant) -> Instant {
    let next = due + period;
    if next > now {
        return next;
    }
    // Remainder stays below one period, so it always fits back in a Duration.
    let behind = now.duration_since(due).as_nanos();
    let into_period = behind % period.as_nanos();
    match u64::try_from(into_period) {
        Ok(nanos) => now + (period - Duration::from_nanos(nanos)),
        Err(_) => now + period,
    }
}
