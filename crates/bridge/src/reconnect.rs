//! When, and how often, the bridge re-opens a dropped editor link.

use std::time::Duration;

use gb_domain::config::{ReconnectConfig, ReconnectMode};

/// What the connection manager does after the link drops unexpectedly.
#[derive(Debug, Clone, Default)]
pub enum ReconnectPolicy {
    /// Stay disconnected until the next call needs the link.
    #[default]
    Passive,
    /// Retry in the background using the given back-off.
    Active(ReconnectBackoff),
}

impl ReconnectPolicy {
    pub fn from_config(cfg: &ReconnectConfig) -> Self {
        match cfg.mode {
            ReconnectMode::Passive => Self::Passive,
            ReconnectMode::Active => Self::Active(ReconnectBackoff::from_config(cfg)),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Shape of the delay curve between background reconnect attempts.
///
/// The nominal delay starts at `initial_delay`, is multiplied by
/// `multiplier` after every failure and never exceeds `max_delay`. Each
/// concrete wait is shortened by a random share of up to `jitter` of the
/// nominal delay, so bridges that lost the same editor do not knock on it
/// in lockstep.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Fraction in `[0, 1]`.
    pub jitter: f64,
    /// Consecutive failures tolerated before the loop stops; `0` is unlimited.
    pub max_attempts: u32,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.2,
            max_attempts: 0,
        }
    }
}

impl ReconnectBackoff {
    pub fn from_config(cfg: &ReconnectConfig) -> Self {
        let multiplier = if cfg.backoff_factor.is_finite() && cfg.backoff_factor >= 1.0 {
            cfg.backoff_factor
        } else {
            1.0
        };
        Self {
            initial_delay: Duration::from_millis(cfg.initial_delay_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms.max(cfg.initial_delay_ms)),
            multiplier,
            max_attempts: cfg.max_attempts,
            ..Default::default()
        }
    }

    /// Fresh schedule with its own random jitter stream.
    pub fn schedule(&self) -> BackoffSchedule {
        let (seed, _) = uuid::Uuid::new_v4().as_u64_pair();
        self.schedule_seeded(seed)
    }

    /// Schedule whose jitter is fully determined by `seed`.
    pub fn schedule_seeded(&self, seed: u64) -> BackoffSchedule {
        BackoffSchedule {
            backoff: self.clone(),
            seed,
            failures: 0,
        }
    }

    /// Un-jittered delay after `failures` consecutive failures.
    fn nominal(&self, failures: u32) -> Duration {
        let grown = self.initial_delay.as_secs_f64()
            * self.multiplier.powi(failures.min(i32::MAX as u32) as i32);
        let capped = grown.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Running state of one reconnect loop.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    backoff: ReconnectBackoff,
    seed: u64,
    failures: u32,
}

impl BackoffSchedule {
    /// Wait before the next attempt, or `None` once the attempt limit is hit.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let limit = self.backoff.max_attempts;
        if limit > 0 && self.failures >= limit {
            return None;
        }
        let nominal = self.backoff.nominal(self.failures);
        let spread = self.backoff.jitter.clamp(0.0, 1.0) * unit_interval(self.seed, self.failures);
        Some(nominal.mul_f64(1.0 - spread))
    }

    /// Count a failed attempt.
    pub fn failed(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    /// The link came back; start over from `initial_delay`.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// splitmix64 of `seed` and `step`, mapped onto `[0, 1)`.
fn unit_interval(seed: u64, step: u32) -> f64 {
    let mut z = seed.wrapping_add(u64::from(step).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}
