//! Task trait

/// One unit of background work
///
/// `work` is called once per scheduler pass with the time sampled right
/// before the call. It must return without blocking: check a deadline,
/// do one bounded step if it is due, otherwise return immediately with
/// no side effects.
pub trait Task {
    /// Run one step if due
    fn work(&mut self, now_us: u64);
}

impl<T: Task + ?Sized> Task for &mut T {
    fn work(&mut self, now_us: u64) {
        (**self).work(now_us)
    }
}

/// Task made from a closure
///
/// Handy for glue code and for instrumenting the scheduler in tests.
pub struct FnTask<F>(pub F);

impl<F: FnMut(u64)> Task for FnTask<F> {
    fn work(&mut self, now_us: u64) {
        (self.0)(now_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_task_receives_time() {
        let mut seen = 0u64;
        {
            let mut task = FnTask(|now: u64| seen = now);
            task.work(42);
        }
        assert_eq!(seen, 42);
    }
}
