//! Simulation configuration, built from CLI flags only — no env vars, no
//! config files. Just a plain struct the binary fills in.

/// Parameters for one `run` of the intermittent-NTT simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Simulated duration, in the same units as [`crate::clock::SimClock`].
    pub duration: f64,
    /// Mean ON interval for [`crate::power::PowerModel`].
    pub on_avg: f64,
    /// Mean OFF interval for [`crate::power::PowerModel`].
    pub off_avg: f64,
    /// Seed for the run's `StdRng`, for reproducibility.
    pub seed: u64,
    /// Per-layer compute budget (overrides [`crate::scheduler::COMPUTE_COST`]
    /// for a run, so demos/tests can dial the simulation's pacing).
    pub compute_cost: f64,
    /// Per-layer checkpoint budget.
    pub checkpoint_cost: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            on_avg: 120.0,
            off_avg: 40.0,
            seed: 0,
            compute_cost: crate::scheduler::COMPUTE_COST,
            checkpoint_cost: crate::scheduler::CHECKPOINT_COST,
        }
    }
}
