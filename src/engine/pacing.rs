use std::time::Duration;

/// Per-cycle time budget matching the hardware sample clock.
///
/// One cycle covers `samples * packets` samples, so at `frequency_hz` it
/// should take `1000 / frequency_hz * samples * packets` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacer {
    budget: Option<Duration>,
}

impl Pacer {
    pub fn new(frequency_hz: f64, samples: usize, packets: usize) -> Self {
        let budget = if frequency_hz > 0.0 && frequency_hz.is_finite() {
            let nanos = samples as f64 * packets as f64 * 1e9 / frequency_hz;
            Some(Duration::from_nanos(nanos.round() as u64))
        } else {
            None
        };
        Self { budget }
    }

    /// Target duration of one cycle, `None` when pacing is disabled
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Time left to wait after a cycle that took `elapsed`.
    ///
    /// Overrunning cycles get no wait; the loop never catches up.
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.budget
            .and_then(|budget| budget.checked_sub(elapsed))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Whether a cycle that took `elapsed` exceeded the budget
    pub fn is_overrun(&self, elapsed: Duration) -> bool {
        self.budget.is_some_and(|budget| elapsed > budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_budget() {
        // 12 samples at 30 kHz
        let pacer = Pacer::new(30000.0, 12, 1);
        assert_eq!(pacer.budget(), Some(Duration::from_micros(400)));
    }

    #[test]
    fn test_budget_scales_with_batch() {
        let pacer = Pacer::new(1000.0, 2, 5);
        assert_eq!(pacer.budget(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_non_positive_frequency_disables_pacing() {
        assert_eq!(Pacer::new(0.0, 12, 1).budget(), None);
        assert_eq!(Pacer::new(-5.0, 12, 1).budget(), None);
        assert_eq!(Pacer::new(0.0, 12, 1).remaining(Duration::ZERO), None);
    }

    #[test]
    fn test_remaining_subtracts_elapsed() {
        let pacer = Pacer::new(1000.0, 10, 1);
        assert_eq!(
            pacer.remaining(Duration::from_millis(4)),
            Some(Duration::from_millis(6))
        );
    }

    #[test]
    fn test_overrun_gets_no_wait() {
        let pacer = Pacer::new(1000.0, 10, 1);

        assert_eq!(pacer.remaining(Duration::from_millis(10)), None);
        assert_eq!(pacer.remaining(Duration::from_millis(25)), None);
        assert!(pacer.is_overrun(Duration::from_millis(25)));
        assert!(!pacer.is_overrun(Duration::from_millis(3)));
    }
}
