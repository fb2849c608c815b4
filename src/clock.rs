//! Fixed-step simulation clock and a small poll-based scheduler.

use std::collections::HashSet;

use crate::consts::{MAX_CATCH_UP_STEPS, TIME_STEP};

/// Accumulates wall-clock time and drains it in fixed simulation steps.
///
/// Catch-up is capped: past the cap, excess simulated time is discarded,
/// so extreme lag shows up as slowdown rather than a runaway loop.
#[derive(Debug, Default)]
pub struct SimClock {
    accumulator: f32,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed in elapsed wall-clock seconds; returns how many fixed steps
    /// to simulate now.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed;
        let mut steps = (self.accumulator / TIME_STEP) as u32;
        self.accumulator -= steps as f32 * TIME_STEP;
        if steps > MAX_CATCH_UP_STEPS {
            log::debug!(
                "discarding {} catch-up steps",
                steps - MAX_CATCH_UP_STEPS
            );
            steps = MAX_CATCH_UP_STEPS;
        }
        steps
    }
}

/// Handle to a scheduled wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

enum Wait<Ctx> {
    Timer(f32),
    Until(Box<dyn FnMut(&Ctx) -> bool>),
}

/// Poll-based waiting for sequencing above the simulation (cutscenes,
/// notifications). Not a coroutine runtime: every pending wait is polled
/// once per frame, and completion is observed through [`Scheduler::is_done`].
pub struct Scheduler<Ctx> {
    pending: Vec<(TaskId, Wait<Ctx>)>,
    done: HashSet<TaskId>,
    next_id: u64,
}

impl<Ctx> Default for Scheduler<Ctx> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            done: HashSet::new(),
            next_id: 0,
        }
    }
}

impl<Ctx> Scheduler<Ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, wait: Wait<Ctx>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, wait));
        id
    }

    /// Complete after `secs` of simulated time.
    pub fn wait_secs(&mut self, secs: f32) -> TaskId {
        self.push(Wait::Timer(secs))
    }

    /// Complete once the predicate holds; evaluated once per poll.
    pub fn wait_until(&mut self, pred: impl FnMut(&Ctx) -> bool + 'static) -> TaskId {
        self.push(Wait::Until(Box::new(pred)))
    }

    /// Advance timers and evaluate predicates once.
    pub fn poll(&mut self, ctx: &Ctx, dt: f32) {
        let mut finished = Vec::new();
        self.pending.retain_mut(|(id, wait)| {
            let done = match wait {
                Wait::Timer(left) => {
                    *left -= dt;
                    *left <= 0.0
                }
                Wait::Until(pred) => pred(ctx),
            };
            if done {
                finished.push(*id);
            }
            !done
        });
        self.done.extend(finished);
    }

    pub fn is_done(&self, id: TaskId) -> bool {
        self.done.contains(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_emits_whole_steps() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(TIME_STEP * 0.5), 0);
        // The half step is still banked.
        assert_eq!(clock.advance(TIME_STEP * 0.6), 1);
        assert_eq!(clock.advance(TIME_STEP * 3.0), 3);
    }

    #[test]
    fn test_clock_caps_catch_up_and_discards_excess() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(TIME_STEP * 100.0), MAX_CATCH_UP_STEPS);
        // The excess was dropped, not banked for later.
        assert_eq!(clock.advance(0.0), 0);
    }

    #[test]
    fn test_timer_task_completes_after_duration() {
        let mut sched: Scheduler<()> = Scheduler::new();
        let id = sched.wait_secs(0.05);
        for _ in 0..2 {
            sched.poll(&(), TIME_STEP);
            assert!(!sched.is_done(id));
        }
        sched.poll(&(), TIME_STEP);
        assert!(sched.is_done(id));
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn test_predicate_task_polls_against_context() {
        let mut sched: Scheduler<i32> = Scheduler::new();
        let id = sched.wait_until(|&n| n >= 3);
        sched.poll(&0, TIME_STEP);
        sched.poll(&2, TIME_STEP);
        assert!(!sched.is_done(id));
        sched.poll(&3, TIME_STEP);
        assert!(sched.is_done(id));
    }
}
