//! The stochastic on/off power process.
//!
//! Conceptually this loops forever between an `Exp(1/on_mean)` ON interval
//! and an `Exp(1/off_mean)` OFF interval, firing one-shot `lost`/`restored`
//! events that are re-armed on every cycle so a subscriber can never observe
//! a stale firing. Rather than spawning a concurrent coroutine to do that
//! (this crate has no generic task executor — see [`crate::clock`]), the
//! renewal process is precomputed lazily as an edge schedule: `is_powered`
//! and `next_restored_after` are pure functions of simulated time, which
//! gives the same "await restored blocks until the *next* OFF→ON edge"
//! contract without needing a coroutine to be alive to emit it.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

/// ON/OFF renewal process driving power availability.
///
/// Edges alternate starting with an ON→OFF transition (the source starts
/// powered). `edges[i]` is a lost edge when `i` is even, a restored edge
/// when `i` is odd.
pub struct PowerModel {
    on_mean: f64,
    off_mean: f64,
    edges: Vec<f64>,
}

impl PowerModel {
    pub fn new(on_mean: f64, off_mean: f64) -> Self {
        Self { on_mean, off_mean, edges: Vec::new() }
    }

    /// Extend the precomputed edge schedule, drawing fresh exponential
    /// durations from `rng`, until it covers time `t`.
    fn extend_to(&mut self, t: f64, rng: &mut StdRng) {
        let on = Exp::new(1.0 / self.on_mean).expect("on_mean must be positive");
        let off = Exp::new(1.0 / self.off_mean).expect("off_mean must be positive");
        let mut last = self.edges.last().copied().unwrap_or(0.0);
        while last <= t {
            let dist = if self.edges.len() % 2 == 0 { &on } else { &off };
            last += dist.sample(rng);
            self.edges.push(last);
        }
    }

    /// Whether power is available at simulated time `t`.
    pub fn is_powered(&mut self, t: f64, rng: &mut StdRng) -> bool {
        self.extend_to(t, rng);
        let crossed = self.edges.iter().take_while(|&&edge| edge <= t).count();
        crossed % 2 == 0
    }

    /// The next OFF→ON edge strictly after `t`. Blocks past the current
    /// edge even if already powered, so a subscriber can never be handed a
    /// stale restore.
    pub fn next_restored_after(&mut self, t: f64, rng: &mut StdRng) -> f64 {
        loop {
            self.extend_to(t, rng);
            for (i, &edge) in self.edges.iter().enumerate() {
                if edge > t && i % 2 == 1 {
                    return edge;
                }
            }
            // Not enough edges yet; force one more cycle.
            self.extend_to(self.edges.last().copied().unwrap_or(t) + 1.0, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn starts_powered() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut power = PowerModel::new(9999.0, 1.0);
        assert!(power.is_powered(0.0, &mut rng));
    }

    #[test]
    fn restored_is_strictly_after_lost() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut power = PowerModel::new(30.0, 20.0);
        let restored_at = power.next_restored_after(0.0, &mut rng);
        assert!(restored_at > 0.0);
        // The edge just before a restore must be a lost edge, not ON.
        assert!(!power.is_powered(restored_at - 1e-9, &mut rng));
        assert!(power.is_powered(restored_at, &mut rng));
    }

    #[test]
    fn already_powered_subscriber_waits_for_next_edge() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut power = PowerModel::new(1.0, 1.0);
        // Force at least one full cycle so we're past edges[0..1].
        let _ = power.is_powered(5.0, &mut rng);
        assert!(power.is_powered(5.0, &mut rng));
        let restored = power.next_restored_after(5.0, &mut rng);
        assert!(restored > 5.0);
    }
}
