use std::time::Duration;

/// Linear poll-delay ramp bounded by a ceiling.
///
/// The first wait starts at `base` and grows by `step` per completed attempt
/// until `cap`, so a slow task is not hammered early and the worst-case
/// inter-poll latency stays bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSettings {
    pub base: Duration,
    pub step: Duration,
    pub cap: Duration,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            step: Duration::from_millis(250),
            cap: Duration::from_millis(5000),
        }
    }
}

/// Delay before the poll following `attempt` completed attempts.
pub fn poll_delay(settings: &BackoffSettings, attempt: u32) -> Duration {
    (settings.base + settings.step * attempt).min(settings.cap)
}

#[cfg(test)]
mod tests {
    use super::{poll_delay, BackoffSettings};
    use std::time::Duration;

    #[test]
    fn ramp_starts_at_base() {
        let settings = BackoffSettings::default();
        assert_eq!(poll_delay(&settings, 0), Duration::from_millis(1000));
        assert_eq!(poll_delay(&settings, 1), Duration::from_millis(1250));
        assert_eq!(poll_delay(&settings, 4), Duration::from_millis(2000));
    }

    #[test]
    fn ramp_is_capped() {
        let settings = BackoffSettings::default();
        // 1000 + 16 * 250 = 5000 is the first capped attempt.
        assert_eq!(poll_delay(&settings, 16), Duration::from_millis(5000));
        assert_eq!(poll_delay(&settings, 17), Duration::from_millis(5000));
        assert_eq!(poll_delay(&settings, 1000), Duration::from_millis(5000));
    }

    #[test]
    fn ramp_is_monotonically_non_decreasing() {
        let settings = BackoffSettings::default();
        let mut previous = Duration::ZERO;
        for attempt in 0..100 {
            let delay = poll_delay(&settings, attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}
