use serde::{Deserialize, Serialize};

use crate::error::UsageError;

pub const DEFAULT_INPUT_TOKENS: u64 = 1_000;
pub const DEFAULT_OUTPUT_TOKENS: u64 = 500;
pub const DEFAULT_CALLS: u64 = 1;
pub const DEFAULT_HOURS: f64 = 1.0;
pub const DEFAULT_CALLS_PER_MINUTE: u64 = 10;
pub const DEFAULT_DURATION_MINUTES: f64 = 60.0;

/// How many calls the workload makes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallVolume {
    /// A fixed number of calls spread over `hours`.
    Total { calls: u64, hours: f64 },
    /// A steady call rate sustained for `duration_minutes`.
    Rate {
        calls_per_minute: u64,
        duration_minutes: f64,
    },
}

/// Caller-supplied workload description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageProfile {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub volume: CallVolume,
}

impl Default for UsageProfile {
    fn default() -> Self {
        Self {
            input_tokens: DEFAULT_INPUT_TOKENS,
            output_tokens: DEFAULT_OUTPUT_TOKENS,
            volume: CallVolume::Total {
                calls: DEFAULT_CALLS,
                hours: DEFAULT_HOURS,
            },
        }
    }
}

/// A usage profile reduced to the quantities the engine prices against.
///
/// Only obtainable through [`UsageProfile::resolve`], so `calls`,
/// `hours` and `duration_minutes` are finite and positive. `calls` may be
/// fractional in the rate form (10 calls/min for 0.25 min is 2.5 calls).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub calls: f64,
    pub hours: f64,
    pub duration_minutes: f64,
    pub calls_per_minute: Option<u64>,
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl UsageProfile {
    pub fn resolve(&self) -> Result<EffectiveUsage, UsageError> {
        let (calls, hours, duration_minutes, calls_per_minute) = match self.volume {
            CallVolume::Total { calls, hours } => {
                if !positive(hours) {
                    return Err(UsageError::InvalidHours(hours));
                }
                if calls == 0 {
                    return Err(UsageError::NoCalls);
                }
                (calls as f64, hours, hours * 60.0, None)
            }
            CallVolume::Rate {
                calls_per_minute,
                duration_minutes,
            } => {
                if !positive(duration_minutes) {
                    return Err(UsageError::InvalidDuration(duration_minutes));
                }
                let calls = calls_per_minute as f64 * duration_minutes;
                if !positive(calls) {
                    return Err(UsageError::NoCalls);
                }
                (
                    calls,
                    duration_minutes / 60.0,
                    duration_minutes,
                    Some(calls_per_minute),
                )
            }
        };

        Ok(EffectiveUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            calls,
            hours,
            duration_minutes,
            calls_per_minute,
        })
    }
}

impl EffectiveUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Input-equivalent token load per minute, with output tokens weighted
    /// by `output_ratio`.
    pub fn tokens_per_minute(&self, output_ratio: f64) -> f64 {
        let per_call = self.input_tokens as f64 + self.output_tokens as f64 * output_ratio;
        match self.calls_per_minute {
            Some(rate) => rate as f64 * per_call,
            None => self.calls * per_call / self.duration_minutes,
        }
    }
}
