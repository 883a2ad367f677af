//! CPU clocks

use nix::time::{clock_gettime, ClockId};
use std::time::Duration;

/// CPU time consumed by the whole process since startup
pub fn process_cpu_time() -> nix::Result<Duration> {
    clock_gettime(ClockId::CLOCK_PROCESS_CPUTIME_ID).map(Duration::from)
}

/// CPU time consumed by the calling thread since it started
pub fn thread_cpu_time() -> nix::Result<Duration> {
    clock_gettime(ClockId::CLOCK_THREAD_CPUTIME_ID).map(Duration::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_clock_advances_while_spinning() {
        let start = thread_cpu_time().unwrap();
        let mut x = 0u64;
        while thread_cpu_time().unwrap() - start < Duration::from_millis(5) {
            x = x.wrapping_add(1);
        }
        assert!(x > 0);
        assert!(process_cpu_time().unwrap() >= Duration::from_millis(5));
    }
}
