use std::time::{Duration, Instant};

/// Deferred work the run controller hands to its host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// One timed step belonging to the run with this id
    Cycle { run: u64 },
    /// Repaint the surface from the current simulation state
    Render,
}

/// Fire-and-forget scheduling primitives provided by the host
pub trait Scheduler {
    /// Run `job` once `delay` has passed
    fn run_after(&mut self, delay: Duration, job: Job);
    /// Run `job` before the next frame is presented
    fn before_paint(&mut self, job: Job);
}

/// Wall-clock source for elapsed-time reporting
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Host-driven job queue.
///
/// The host advances time with [`TaskQueue::advance_to`], runs the jobs returned by
/// [`TaskQueue::drain_due`], and runs [`TaskQueue::take_paint_jobs`] right before
/// presenting a frame. Nothing here blocks or spawns threads.
pub struct TaskQueue {
    now: Instant,
    timers: Vec<(Instant, u64, Job)>,
    paint: Vec<Job>,
    seq: u64,
}

impl TaskQueue {
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            timers: Vec::new(),
            paint: Vec::new(),
            seq: 0,
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Move the queue's notion of time forward (never backwards)
    pub fn advance_to(&mut self, now: Instant) {
        self.now = self.now.max(now);
    }

    /// Earliest pending deadline
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.iter().map(|(due, _, _)| *due).min()
    }

    /// Time left until the earliest deadline, zero if one is already due
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due().map(|due| due.saturating_duration_since(now))
    }

    /// Remove and return every timer due at the current time, oldest deadline first
    pub fn drain_due(&mut self) -> Vec<Job> {
        let now = self.now;
        let mut due: Vec<(Instant, u64, Job)> = Vec::new();
        self.timers.retain(|entry| {
            if entry.0 <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter().map(|(_, _, job)| job).collect()
    }

    /// Paint requests made since the last frame; repeated requests are coalesced
    pub fn take_paint_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.paint)
    }

    #[cfg(test)]
    pub fn has_paint_jobs(&self) -> bool {
        !self.paint.is_empty()
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.paint.is_empty()
    }
}

impl Scheduler for TaskQueue {
    fn run_after(&mut self, delay: Duration, job: Job) {
        self.seq += 1;
        self.timers.push((self.now + delay, self.seq, job));
    }

    fn before_paint(&mut self, job: Job) {
        if !self.paint.contains(&job) {
            self.paint.push(job);
        }
    }
}
