//! Round-robin task runner

use heapless::Vec;

use cadence_hal::Clock;

use super::task::Task;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Default task capacity
pub const DEFAULT_MAX_TASKS: usize = 16;

/// Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum SchedulerError {
    /// Task list is at capacity
    Full,
}

/// Cooperative round-robin scheduler
///
/// Owns the clock and an append-only list of borrowed tasks. Registration
/// takes the task by exclusive borrow, so the same task cannot be listed
/// twice and nothing else can touch it while the scheduler lives. There
/// is no deregistration and no priority; every task runs once per pass,
/// in registration order.
pub struct Scheduler<'a, C: Clock, const N: usize = DEFAULT_MAX_TASKS> {
    clock: C,
    tasks: Vec<&'a mut dyn Task, N>,
    passes: u64,
}

impl<'a, C: Clock, const N: usize> Scheduler<'a, C, N> {
    /// Create an empty scheduler
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            passes: 0,
        }
    }

    /// Append a task; returns its position in the pass order
    pub fn register(&mut self, task: &'a mut dyn Task) -> Result<usize, SchedulerError> {
        let index = self.tasks.len();
        self.tasks.push(task).map_err(|_| SchedulerError::Full)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("scheduler: registered task {}", index);

        Ok(index)
    }

    /// Run one pass over every task
    ///
    /// The clock is sampled right before each task so late tasks in a long
    /// pass see an up-to-date time.
    pub fn run_once(&mut self) {
        for task in self.tasks.iter_mut() {
            let now = self.clock.now_us();
            task.work(now);
        }
        self.passes = self.passes.wrapping_add(1);
    }

    /// Run passes forever
    pub fn run_forever(&mut self) -> ! {
        #[cfg(feature = "defmt")]
        defmt::info!("scheduler: running {} tasks", self.tasks.len());

        loop {
            self.run_once();
        }
    }

    /// Completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// No task registered yet
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Access the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{FnTask, Periodic};
    use cadence_hal_sim::SimClock;
    use std::cell::RefCell;

    /// Task that appends its id to a shared log
    struct Recorder<'l> {
        id: u8,
        log: &'l RefCell<std::vec::Vec<(u8, u64)>>,
    }

    impl Task for Recorder<'_> {
        fn work(&mut self, now_us: u64) {
            self.log.borrow_mut().push((self.id, now_us));
        }
    }

    /// Task that counts its due steps
    struct Counter {
        periodic: Periodic,
        count: u32,
        steps_at: std::vec::Vec<u64>,
    }

    impl Counter {
        fn new(interval_us: u64) -> Self {
            Self {
                periodic: Periodic::new(interval_us, 0),
                count: 0,
                steps_at: std::vec::Vec::new(),
            }
        }
    }

    impl Task for Counter {
        fn work(&mut self, now_us: u64) {
            if self.periodic.poll(now_us) {
                self.count += 1;
                self.steps_at.push(now_us);
            }
        }
    }

    #[test]
    fn test_every_task_once_per_pass_in_order() {
        let clock = SimClock::new();
        let log = RefCell::new(std::vec::Vec::new());
        let mut a = Recorder { id: 0, log: &log };
        let mut b = Recorder { id: 1, log: &log };
        let mut c = Recorder { id: 2, log: &log };

        let mut scheduler: Scheduler<'_, _> = Scheduler::new(clock.clone());
        assert_eq!(scheduler.register(&mut a), Ok(0));
        assert_eq!(scheduler.register(&mut b), Ok(1));
        assert_eq!(scheduler.register(&mut c), Ok(2));

        for _ in 0..3 {
            scheduler.run_once();
            clock.advance(5);
        }
        assert_eq!(scheduler.passes(), 3);
        drop(scheduler);

        let ids: std::vec::Vec<u8> = log.borrow().iter().map(|&(id, _)| id).collect();
        assert_eq!(ids, [0, 1, 2, 0, 1, 2, 0, 1, 2]);
        assert_eq!(log.borrow()[3], (0, 5));
    }

    #[test]
    fn test_task_not_due_has_no_effect() {
        let clock = SimClock::new();
        let mut counter = Counter::new(1000);

        let mut scheduler: Scheduler<'_, _> = Scheduler::new(clock.clone());
        scheduler.register(&mut counter).unwrap();
        for now in (0..1000).step_by(100) {
            clock.set(now);
            scheduler.run_once();
        }
        drop(scheduler);

        assert_eq!(counter.count, 0);
        assert_eq!(counter.periodic.next_us(), 1000);
    }

    #[test]
    fn test_register_reports_full() {
        let clock = SimClock::new();
        let mut a = FnTask(|_: u64| {});
        let mut b = FnTask(|_: u64| {});
        let mut c = FnTask(|_: u64| {});

        let mut scheduler: Scheduler<'_, _, 2> = Scheduler::new(clock);
        assert!(scheduler.is_empty());
        scheduler.register(&mut a).unwrap();
        scheduler.register(&mut b).unwrap();
        assert_eq!(scheduler.register(&mut c), Err(SchedulerError::Full));
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn test_two_periodic_tasks_over_one_second() {
        let clock = SimClock::new();
        let mut a = Counter::new(100_000);
        let mut b = Counter::new(230_000);

        let mut scheduler: Scheduler<'_, _> = Scheduler::new(clock.clone());
        scheduler.register(&mut a).unwrap();
        scheduler.register(&mut b).unwrap();
        for now in (0..=1_000_000).step_by(10_000) {
            clock.set(now);
            scheduler.run_once();
        }
        drop(scheduler);

        assert_eq!(a.count, 10);
        assert_eq!(b.count, 4);
        assert_eq!(b.steps_at, [230_000, 460_000, 690_000, 920_000]);
    }

    #[test]
    fn test_slow_task_does_not_shift_deadlines() {
        let clock = SimClock::new();
        let mut counter = Counter::new(100);
        let slow_clock = clock.clone();
        // burns 30 µs on every visit
        let mut slow = FnTask(move |_: u64| slow_clock.advance(30));

        let mut scheduler: Scheduler<'_, _> = Scheduler::new(clock.clone());
        scheduler.register(&mut slow).unwrap();
        scheduler.register(&mut counter).unwrap();
        while clock.now() < 1_000 {
            scheduler.run_once();
        }
        drop(scheduler);

        for (n, &at) in counter.steps_at.iter().enumerate() {
            let deadline = 100 * (n as u64 + 1);
            assert!(at >= deadline && at < deadline + 30);
        }
        assert_eq!(counter.count, 10);
    }
}
