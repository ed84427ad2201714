//! Silence-based end-of-utterance detection
//!
//! Some recognizers keep an utterance open long after the speaker stopped.
//! `SilenceDetector` watches the microphone level and the interim text: once
//! text is pending and the level has stayed below the threshold for the hold
//! time, the text is released exactly once.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SilenceDetector {
    threshold_db: f32,
    hold: Duration,
    pending: String,
    quiet_since: Option<Instant>,
}

impl SilenceDetector {
    pub fn new(threshold_db: f32, hold: Duration) -> Self {
        Self {
            threshold_db,
            hold,
            pending: String::new(),
            quiet_since: None,
        }
    }

    /// Latest interim text; replaces what came before
    pub fn observe_text(&mut self, text: &str, now: Instant) {
        self.pending.clear();
        self.pending.push_str(text.trim());
        // new words restart the hold
        if self.quiet_since.is_some() {
            self.quiet_since = Some(now);
        }
    }

    /// Feed one level measurement; returns the text if this closes the utterance
    pub fn observe_level(&mut self, level_db: f32, now: Instant) -> Option<String> {
        if level_db >= self.threshold_db {
            self.quiet_since = None;
            return None;
        }
        self.quiet_since.get_or_insert(now);
        self.poll(now)
    }

    /// Check the hold timer without a new measurement
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let quiet_since = self.quiet_since?;
        if now.saturating_duration_since(quiet_since) < self.hold {
            return None;
        }
        self.quiet_since = None;
        Some(std::mem::take(&mut self.pending))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Forget pending text, e.g. after a final result or a state change
    pub fn clear(&mut self) {
        self.pending.clear();
        self.quiet_since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(1500);

    fn detector() -> SilenceDetector {
        SilenceDetector::new(-50.0, HOLD)
    }

    #[test]
    fn test_submits_once_after_hold() {
        let mut d = detector();
        let t0 = Instant::now();

        assert!(d.observe_level(-20.0, t0).is_none());
        d.observe_text("how much does", t0);
        d.observe_text("how much does a kitchen cost", t0 + Duration::from_millis(200));

        assert!(d.observe_level(-70.0, t0 + Duration::from_millis(300)).is_none());
        assert!(d.poll(t0 + Duration::from_millis(1700)).is_none());

        let submitted = d.poll(t0 + Duration::from_millis(1800));
        assert_eq!(submitted.as_deref(), Some("how much does a kitchen cost"));

        // no duplicate submissions
        assert!(d.poll(t0 + Duration::from_secs(5)).is_none());
        assert!(d.observe_level(-80.0, t0 + Duration::from_secs(6)).is_none());
        assert!(!d.has_pending());
    }

    #[test]
    fn test_silence_without_text_submits_nothing() {
        let mut d = detector();
        let t0 = Instant::now();
        d.observe_level(-90.0, t0);
        assert!(d.poll(t0 + Duration::from_secs(10)).is_none());

        d.observe_text("   ", t0);
        assert!(d.poll(t0 + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_noise_resets_the_hold() {
        let mut d = detector();
        let t0 = Instant::now();
        d.observe_text("hello", t0);
        d.observe_level(-70.0, t0);
        d.observe_level(-30.0, t0 + Duration::from_millis(1000));
        d.observe_level(-70.0, t0 + Duration::from_millis(1100));

        assert!(d.poll(t0 + Duration::from_millis(2000)).is_none());
        assert_eq!(
            d.poll(t0 + Duration::from_millis(2600)).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_new_text_restarts_the_hold() {
        let mut d = detector();
        let t0 = Instant::now();
        d.observe_level(-70.0, t0);
        d.observe_text("hello", t0 + Duration::from_millis(1000));
        assert!(d.poll(t0 + Duration::from_millis(1600)).is_none());
        assert!(d.poll(t0 + Duration::from_millis(2500)).is_some());
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut d = detector();
        let t0 = Instant::now();
        d.observe_text("hello", t0);
        d.observe_level(-70.0, t0);
        d.clear();
        assert!(d.poll(t0 + Duration::from_secs(3)).is_none());
    }
}
