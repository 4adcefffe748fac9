use std::time::{Duration, Instant};

/// Start/stop wall-clock timer
#[derive(Debug, Clone, Default)]
pub struct StopWatch {
    started: Option<Instant>,
    elapsed: Duration,
}

impl StopWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Adds the time since the last `start` to the total
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total measured time in nanoseconds
    pub fn elapsed_ns(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e9
    }
}

/// `amount / elapsed_ns`, or zero when nothing was measured
pub fn per_ns(amount: f64, elapsed_ns: f64) -> f64 {
    if elapsed_ns > 0.0 {
        amount / elapsed_ns
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_without_start_keeps_zero() {
        let mut watch = StopWatch::new();
        watch.stop();
        assert_eq!(watch.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_accumulates_intervals() {
        let mut watch = StopWatch::new();
        watch.start();
        std::thread::sleep(Duration::from_millis(2));
        watch.stop();
        let first = watch.elapsed();
        watch.start();
        std::thread::sleep(Duration::from_millis(2));
        watch.stop();
        assert!(watch.elapsed() > first);
        assert!(watch.elapsed_ns() >= 4e6);
    }

    #[test]
    fn test_per_ns_guards_zero() {
        assert_eq!(per_ns(10.0, 0.0), 0.0);
        assert_eq!(per_ns(10.0, 2.0), 5.0);
    }
}
