/*!
Anomaly scoring.

Each session carries an [`AnomalyScore`] that suspicious events push up and
that halves every `half_life` when nothing happens. Decay is evaluated
lazily from the elapsed time whenever the score is read or updated, so
there is no background timer to drive. Crossing the threshold is the
caller's cue to revoke; the detector itself only does arithmetic.
*/

use crate::core::config::{AnomalyConfig, duration_ms};
use crate::core::fingerprint::{DriftScore, TrustLevel};

/// Something suspicious about a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnomalyEvent {
    /// Replayed or stale (epoch, sequence)
    ReplayRejected,
    /// Epoch outside the skew tolerance
    EpochOutOfRange,
    /// Digest did not verify
    DigestMismatch,
    /// Accepted signal skipped `gap` sequence numbers
    SequenceGap { gap: u64 },
    /// Observed fingerprint differs from the bound one
    FingerprintDrift(DriftScore),
    /// Signal timestamp this far from the server clock
    TimingOutlier { skew_ms: u64 },
    /// This many accepted signals within one epoch
    BurstRate { count: u32 },
    /// Time since the previous accepted signal, against one epoch
    ArrivalCadence { interval_ms: u64, expected_ms: u64 },
}

impl AnomalyEvent {
    /// Stable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            AnomalyEvent::ReplayRejected => "replay_rejected",
            AnomalyEvent::EpochOutOfRange => "epoch_out_of_range",
            AnomalyEvent::DigestMismatch => "digest_mismatch",
            AnomalyEvent::SequenceGap { .. } => "sequence_gap",
            AnomalyEvent::FingerprintDrift(_) => "fingerprint_drift",
            AnomalyEvent::TimingOutlier { .. } => "timing_outlier",
            AnomalyEvent::BurstRate { .. } => "burst_rate",
            AnomalyEvent::ArrivalCadence { .. } => "arrival_cadence",
        }
    }
}

/// Decaying risk value. Always in `[0, ceiling]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    value: f64,
    updated_at_ms: u64,
}

impl AnomalyScore {
    /// A zero score as of `now_ms`
    pub fn new(now_ms: u64) -> Self {
        Self {
            value: 0.0,
            updated_at_ms: now_ms,
        }
    }

    /// Value decayed to `now_ms`. A clock that went backwards decays nothing.
    pub fn value_at(&self, now_ms: u64, half_life_ms: u64) -> f64 {
        if self.value == 0.0 || half_life_ms == 0 {
            return self.value;
        }
        let elapsed = now_ms.saturating_sub(self.updated_at_ms) as f64;
        self.value * (-elapsed / half_life_ms as f64).exp2()
    }

    fn add(&mut self, amount: f64, now_ms: u64, half_life_ms: u64, ceiling: f64) -> f64 {
        let decayed = self.value_at(now_ms, half_life_ms);
        self.value = (decayed + amount).clamp(0.0, ceiling);
        self.updated_at_ms = self.updated_at_ms.max(now_ms);
        self.value
    }
}

/// Turns events into score increments and threshold decisions
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    half_life_ms: u64,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self {
            half_life_ms: duration_ms(config.half_life),
            config,
        }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Increment for `event`; zero when the event is within tolerance
    pub fn weight(&self, event: &AnomalyEvent) -> f64 {
        let weights = &self.config.weights;
        match *event {
            AnomalyEvent::ReplayRejected => weights.replay_rejected,
            AnomalyEvent::EpochOutOfRange => weights.epoch_out_of_range,
            AnomalyEvent::DigestMismatch => weights.digest_mismatch,
            AnomalyEvent::SequenceGap { gap } if gap > self.config.gap_threshold => {
                weights.sequence_gap
            }
            AnomalyEvent::FingerprintDrift(drift) if drift.exceeds(self.config.drift_tolerance) => {
                weights.fingerprint_drift * drift.value()
            }
            AnomalyEvent::TimingOutlier { skew_ms }
                if skew_ms > duration_ms(self.config.timing_tolerance) =>
            {
                weights.timing_outlier
            }
            AnomalyEvent::BurstRate { count } if count > self.config.burst_limit => {
                weights.burst_rate
            }
            AnomalyEvent::ArrivalCadence {
                interval_ms,
                expected_ms,
            } if interval_ms
                > expected_ms.saturating_mul(u64::from(self.config.cadence_tolerance)) =>
            {
                weights.arrival_cadence
            }
            _ => 0.0,
        }
    }

    /// Whether `event` would move the score at all
    pub fn is_significant(&self, event: &AnomalyEvent) -> bool {
        self.weight(event) > 0.0
    }

    /// Apply `event` at `now_ms` and return the updated score
    pub fn score(&self, score: &mut AnomalyScore, event: AnomalyEvent, now_ms: u64) -> f64 {
        let weight = self.weight(&event);
        if weight == 0.0 {
            return score.value_at(now_ms, self.half_life_ms);
        }
        score.add(weight, now_ms, self.half_life_ms, self.config.ceiling)
    }

    /// Current value of `score`
    pub fn current(&self, score: &AnomalyScore, now_ms: u64) -> f64 {
        score.value_at(now_ms, self.half_life_ms)
    }

    /// Revocation threshold for a session of the given trust
    pub fn threshold_for(&self, trust: TrustLevel) -> f64 {
        match trust {
            TrustLevel::Full => self.config.threshold,
            TrustLevel::Degraded => self.config.threshold * self.config.degraded_threshold_factor,
        }
    }

    /// Whether `value` has crossed the threshold
    pub fn is_breached(&self, value: f64, trust: TrustLevel) -> bool {
        value >= self.threshold_for(trust)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(AnomalyConfig::default())
    }

    #[test]
    fn test_score_accumulates_and_breaches() {
        let detector = detector();
        let mut score = AnomalyScore::new(0);
        for i in 1..=4 {
            let value = detector.score(&mut score, AnomalyEvent::ReplayRejected, 0);
            assert_eq!(value, i as f64);
            assert!(!detector.is_breached(value, TrustLevel::Full));
        }
        let value = detector.score(&mut score, AnomalyEvent::DigestMismatch, 0);
        assert!(detector.is_breached(value, TrustLevel::Full));
    }

    #[test]
    fn test_decay_halves_per_half_life() {
        let detector = detector();
        let mut score = AnomalyScore::new(0);
        detector.score(&mut score, AnomalyEvent::ReplayRejected, 0);
        detector.score(&mut score, AnomalyEvent::ReplayRejected, 0);
        detector.score(&mut score, AnomalyEvent::ReplayRejected, 0);
        detector.score(&mut score, AnomalyEvent::ReplayRejected, 0);

        let half_life = 300_000;
        assert!((detector.current(&score, half_life) - 2.0).abs() < 1e-9);
        assert!((detector.current(&score, 2 * half_life) - 1.0).abs() < 1e-9);
        // reading does not change the stored value
        assert!((detector.current(&score, 0) - 4.0).abs() < 1e-9);
        // clock going backwards does not decay or panic
        let mut later = AnomalyScore::new(1_000);
        detector.score(&mut later, AnomalyEvent::ReplayRejected, 1_000);
        assert_eq!(detector.current(&later, 0), 1.0);
    }

    #[test]
    fn test_thresholded_events() {
        let detector = detector();
        assert_eq!(detector.weight(&AnomalyEvent::SequenceGap { gap: 32 }), 0.0);
        assert!(detector.is_significant(&AnomalyEvent::SequenceGap { gap: 33 }));

        assert_eq!(
            detector.weight(&AnomalyEvent::FingerprintDrift(DriftScore::new(0.05))),
            0.0
        );
        let weight = detector.weight(&AnomalyEvent::FingerprintDrift(DriftScore::new(0.5)));
        assert!((weight - 2.0).abs() < 1e-9);

        assert_eq!(detector.weight(&AnomalyEvent::TimingOutlier { skew_ms: 15_000 }), 0.0);
        assert!(detector.is_significant(&AnomalyEvent::TimingOutlier { skew_ms: 15_001 }));

        assert_eq!(detector.weight(&AnomalyEvent::BurstRate { count: 256 }), 0.0);
        assert!(detector.is_significant(&AnomalyEvent::BurstRate { count: 257 }));

        let cadence = |interval_ms| AnomalyEvent::ArrivalCadence {
            interval_ms,
            expected_ms: 5_000,
        };
        assert_eq!(detector.weight(&cadence(0)), 0.0);
        assert_eq!(detector.weight(&cadence(64 * 5_000)), 0.0);
        assert_eq!(detector.weight(&cadence(64 * 5_000 + 1)), 0.5);
    }

    #[test]
    fn test_insignificant_event_leaves_score() {
        let detector = detector();
        let mut score = AnomalyScore::new(0);
        let value = detector.score(&mut score, AnomalyEvent::SequenceGap { gap: 1 }, 10);
        assert_eq!(value, 0.0);
        assert_eq!(score, AnomalyScore::new(0));
    }

    #[test]
    fn test_ceiling_and_degraded_threshold() {
        let detector = AnomalyDetector::new(AnomalyConfig {
            ceiling: 6.0,
            half_life: Duration::from_secs(60),
            ..AnomalyConfig::default()
        });
        let mut score = AnomalyScore::new(0);
        for _ in 0..20 {
            detector.score(&mut score, AnomalyEvent::EpochOutOfRange, 0);
        }
        assert_eq!(detector.current(&score, 0), 6.0);

        assert_eq!(detector.threshold_for(TrustLevel::Full), 5.0);
        assert_eq!(detector.threshold_for(TrustLevel::Degraded), 2.5);
        assert!(detector.is_breached(3.0, TrustLevel::Degraded));
        assert!(!detector.is_breached(3.0, TrustLevel::Full));
    }
}
