use abcview_flatten::{FlattenError, FlattenReport};
use std::mem::Discriminant;

/// Loop end used when the archive has no animated objects.
pub const STATIC_LOOP_END: f64 = 3.0;

/// Playback clock that wraps back to `loop_start` once it passes
/// `loop_end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playback {
    pub time: f64,
    pub speed: f64,
    pub loop_start: f64,
    pub loop_end: f64,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            time: 0.0,
            speed: 1.1,
            loop_start: 0.0,
            loop_end: STATIC_LOOP_END,
        }
    }
}

impl Playback {
    pub fn new(speed: f64, loop_start: f64, loop_end: f64) -> Self {
        Self {
            time: loop_start,
            speed,
            loop_start,
            loop_end,
        }
    }

    /// Returns the time to draw this frame, then moves the clock on by
    /// `speed × dt`.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let current = self.time;
        self.time += self.speed * dt;
        if self.time > self.loop_end {
            self.time = self.loop_start;
        }
        current
    }
}

type Signature = Vec<(String, Discriminant<FlattenError>)>;

/// Logs flatten conditions only when the set of (node, kind) pairs changes
/// from one frame to the next.
#[derive(Debug, Default)]
pub struct ConditionLog {
    last: Signature,
}

impl ConditionLog {
    /// Returns true when the report differs from the previous one and was
    /// logged.
    pub fn observe(&mut self, report: &FlattenReport) -> bool {
        let signature: Signature = report
            .conditions
            .iter()
            .map(|c| (c.node().to_string(), std::mem::discriminant(c)))
            .collect();
        if signature == self.last {
            return false;
        }

        if report.conditions.is_empty() {
            log::info!("frame flattened cleanly again");
        } else {
            log::warn!(
                "{} flatten condition(s) this frame",
                report.conditions.len()
            );
            for condition in &report.conditions {
                log::warn!("  {condition}");
            }
        }
        self.last = signature;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abcview_scene::SampleError;

    #[test]
    fn advance_returns_time_before_stepping() {
        let mut p = Playback::new(2.0, 0.0, 10.0);
        assert_eq!(p.advance(0.5), 0.0);
        assert_eq!(p.advance(0.5), 1.0);
        assert_eq!(p.time, 2.0);
    }

    #[test]
    fn wraps_to_loop_start_past_end() {
        let mut p = Playback::new(1.0, 0.5, 1.0);
        p.advance(0.25);
        assert_eq!(p.time, 0.75);
        p.advance(0.5);
        assert_eq!(p.time, 0.5);
    }

    #[test]
    fn reaching_loop_end_exactly_does_not_wrap() {
        let mut p = Playback::new(1.0, 0.0, 1.0);
        p.advance(1.0);
        assert_eq!(p.time, 1.0);
    }

    fn unavailable(node: &str, time: f64) -> FlattenError {
        FlattenError::SampleUnavailable {
            node: node.to_string(),
            time,
            source: SampleError::NoSamples {
                object: node.to_string(),
            },
        }
    }

    #[test]
    fn condition_log_ignores_repeats_with_new_times() {
        let mut log = ConditionLog::default();
        let mut report = FlattenReport::default();
        assert!(!log.observe(&report));

        report.conditions.push(unavailable("a", 0.0));
        assert!(log.observe(&report));

        report.conditions[0] = unavailable("a", 0.5);
        assert!(!log.observe(&report));

        report.conditions.clear();
        assert!(log.observe(&report));
    }
}
