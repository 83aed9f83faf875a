use serde::{Deserialize, Serialize};

/// Tolerance used when comparing a requested time against sample times.
const TIME_EPSILON: f64 = 1e-9;

/// Maps sample indices to times.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TimeSampling {
    /// Sample `i` lives at time `i`.
    #[default]
    Identity,
    Uniform {
        start: f64,
        time_per_cycle: f64,
    },
    /// `times` lists the sample times within one cycle; the pattern repeats
    /// every `time_per_cycle`.
    Cyclic {
        time_per_cycle: f64,
        times: Vec<f64>,
    },
    Acyclic {
        times: Vec<f64>,
    },
}

impl TimeSampling {
    pub fn validate(&self) -> Result<(), &'static str> {
        match self {
            TimeSampling::Identity => Ok(()),
            TimeSampling::Uniform { time_per_cycle, .. } => {
                if *time_per_cycle > 0.0 {
                    Ok(())
                } else {
                    Err("uniform time_per_cycle must be positive")
                }
            }
            TimeSampling::Cyclic {
                time_per_cycle,
                times,
            } => {
                if *time_per_cycle <= 0.0 {
                    return Err("cyclic time_per_cycle must be positive");
                }
                if times.is_empty() {
                    return Err("cyclic sampling needs at least one time");
                }
                if !is_increasing(times) {
                    return Err("cyclic times must be strictly increasing");
                }
                if times[times.len() - 1] - times[0] >= *time_per_cycle {
                    return Err("cyclic times must fit within one cycle");
                }
                Ok(())
            }
            TimeSampling::Acyclic { times } => {
                if is_increasing(times) {
                    Ok(())
                } else {
                    Err("acyclic times must be strictly increasing")
                }
            }
        }
    }

    pub fn sample_time(&self, index: usize) -> f64 {
        match self {
            TimeSampling::Identity => index as f64,
            TimeSampling::Uniform {
                start,
                time_per_cycle,
            } => start + index as f64 * time_per_cycle,
            TimeSampling::Cyclic {
                time_per_cycle,
                times,
            } => {
                if times.is_empty() {
                    return 0.0;
                }
                let cycle = index / times.len();
                times[index % times.len()] + cycle as f64 * time_per_cycle
            }
            // Explicit lists hold the last time for any index past the end.
            TimeSampling::Acyclic { times } => times
                .get(index)
                .or_else(|| times.last())
                .copied()
                .unwrap_or(0.0),
        }
    }

    /// Last sample at or before `time`, clamped to the first sample.
    pub fn floor_index(&self, time: f64, num_samples: usize) -> Option<usize> {
        if num_samples == 0 {
            return None;
        }
        let (mut lo, mut hi) = (0, num_samples);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.sample_time(mid) <= time + TIME_EPSILON {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Some(lo.saturating_sub(1))
    }

    /// First sample at or after `time`, clamped to the last sample.
    pub fn ceil_index(&self, time: f64, num_samples: usize) -> Option<usize> {
        if num_samples == 0 {
            return None;
        }
        let (mut lo, mut hi) = (0, num_samples);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.sample_time(mid) < time - TIME_EPSILON {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Some(lo.min(num_samples - 1))
    }

    /// Closest sample to `time`; an exact tie goes to the earlier sample.
    pub fn near_index(&self, time: f64, num_samples: usize) -> Option<usize> {
        let floor = self.floor_index(time, num_samples)?;
        let ceil = self.ceil_index(time, num_samples)?;
        if floor == ceil {
            return Some(floor);
        }
        let to_floor = (time - self.sample_time(floor)).abs();
        let to_ceil = (self.sample_time(ceil) - time).abs();
        if to_floor <= to_ceil {
            Some(floor)
        } else {
            Some(ceil)
        }
    }

    pub fn time_range(&self, num_samples: usize) -> Option<(f64, f64)> {
        if num_samples == 0 {
            return None;
        }
        Some((self.sample_time(0), self.sample_time(num_samples - 1)))
    }
}

fn is_increasing(times: &[f64]) -> bool {
    times.windows(2).all(|w| w[0] < w[1])
}
