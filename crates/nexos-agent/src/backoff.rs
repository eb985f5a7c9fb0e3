// SPDX-FileCopyrightText: 2026 Nexos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconnect delay computation.

use std::time::Duration;

use nexos_config::model::ReconnectConfig;
use rand::Rng;

/// Delay table, ceiling, jitter and flap rules for reconnects.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    delays: Vec<Duration>,
    ceiling: Duration,
    jitter: Duration,
    flap_window: Duration,
    flap_delay: Duration,
}

impl BackoffPolicy {
    /// Builds a policy. The table is made non-decreasing and clamped to the ceiling.
    pub fn new(
        delays: Vec<Duration>,
        ceiling: Duration,
        jitter: Duration,
        flap_window: Duration,
        flap_delay: Duration,
    ) -> Self {
        let mut running = Duration::ZERO;
        let delays = delays
            .into_iter()
            .map(|d| {
                running = running.max(d).min(ceiling);
                running
            })
            .collect();
        Self {
            delays,
            ceiling,
            jitter,
            flap_window,
            flap_delay,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            config
                .delays_secs
                .iter()
                .copied()
                .map(Duration::from_secs)
                .collect(),
            Duration::from_secs(config.max_delay_secs),
            Duration::from_millis(config.jitter_ms),
            Duration::from_secs(config.flap_window_secs),
            Duration::from_secs(config.flap_delay_secs),
        )
    }

    /// Delay before the `attempt`-th reconnect (1-based), without jitter.
    ///
    /// Past the end of the table the ceiling is used.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        self.delays.get(index).copied().unwrap_or(self.ceiling)
    }

    /// Whether a close `since_open` after the last open counts as a flap.
    pub fn is_flap(&self, since_open: Option<Duration>) -> bool {
        since_open.is_some_and(|elapsed| elapsed < self.flap_window)
    }

    /// `base` plus uniform jitter in `[0, jitter]`.
    pub fn with_jitter(&self, base: Duration, rng: &mut impl Rng) -> Duration {
        let jitter_ms = self.jitter_ms();
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rng.gen_range(0..=jitter_ms))
    }

    /// Flap delay with symmetric jitter, never below zero.
    pub fn flap_delay(&self, rng: &mut impl Rng) -> Duration {
        let jitter_ms = self.jitter_ms();
        if jitter_ms == 0 {
            return self.flap_delay;
        }
        let offset = rng.gen_range(0..=jitter_ms * 2);
        (self.flap_delay + Duration::from_millis(offset))
            .saturating_sub(Duration::from_millis(jitter_ms))
    }

    fn jitter_ms(&self) -> u64 {
        u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&ReconnectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[test]
    fn default_table() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u64> = (1..=7).map(|n| policy.base_delay(n).as_secs()).collect();
        assert_eq!(delays, vec![3, 5, 8, 13, 21, 30, 30]);
    }

    #[test]
    fn table_is_normalized() {
        let policy = BackoffPolicy::new(
            secs(&[5, 2, 40, 10]),
            Duration::from_secs(30),
            Duration::ZERO,
            Duration::from_secs(10),
            Duration::from_secs(45),
        );
        let delays: Vec<u64> = (1..=4).map(|n| policy.base_delay(n).as_secs()).collect();
        assert_eq!(delays, vec![5, 5, 30, 30]);
    }

    #[test]
    fn attempt_zero_uses_first_entry() {
        assert_eq!(BackoffPolicy::default().base_delay(0), Duration::from_secs(3));
    }

    #[test]
    fn flap_window_is_exclusive() {
        let policy = BackoffPolicy::default();
        assert!(policy.is_flap(Some(Duration::from_millis(9_999))));
        assert!(!policy.is_flap(Some(Duration::from_secs(10))));
        assert!(!policy.is_flap(None));
    }

    #[test]
    fn jitter_stays_in_range() {
        let policy = BackoffPolicy::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let delay = policy.with_jitter(Duration::from_secs(3), &mut rng);
            assert!(delay >= Duration::from_secs(3));
            assert!(delay <= Duration::from_millis(4_000));

            let flap = policy.flap_delay(&mut rng);
            assert!(flap >= Duration::from_secs(44));
            assert!(flap <= Duration::from_secs(46));
        }
    }

    proptest! {
        #[test]
        fn base_delays_are_monotonic_and_bounded(
            table in proptest::collection::vec(0u64..120, 1..8),
            ceiling in 1u64..120,
        ) {
            let policy = BackoffPolicy::new(
                secs(&table),
                Duration::from_secs(ceiling),
                Duration::ZERO,
                Duration::from_secs(10),
                Duration::from_secs(45),
            );
            let mut previous = Duration::ZERO;
            for attempt in 1..=(table.len() as u32 + 3) {
                let delay = policy.base_delay(attempt);
                prop_assert!(delay >= previous);
                prop_assert!(delay <= Duration::from_secs(ceiling));
                previous = delay;
            }
        }
    }
}
