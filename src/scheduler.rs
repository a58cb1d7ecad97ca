//! The atomic-tessera NTT driver.
//!
//! The per-layer loop is expressed as an explicit resumption-token state
//! machine: a `Phase` enum plus a step function that advances one phase per
//! call, the same shape a hardware NTT core's stage-by-stage FSM takes.
//! Each [`Phase`] boundary is a suspension point, and the struct's fields
//! are exactly the state that must survive a crash for the invariant to
//! hold: if `STATE_ADDR = k+1` then `DATA_BASE+k` holds the correct
//! post-layer-k buffer.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::clock::SimClock;
use crate::error::{Result, TesseraError};
use crate::nvm::Nvm;
use crate::power::PowerModel;
use crate::ring::{bit_reverse_permute, Poly, PolynomialRing};

/// Base address for per-layer data checkpoints: `DATA_BASE + k` holds the
/// working buffer snapshot after layer `k` completes.
pub const DATA_BASE: i64 = 0;

/// Sentinel address for the progress counter. Distinct from every
/// `DATA_BASE + k` for `k` in `[0, L)` since it is negative.
pub const STATE_ADDR: i64 = -1;

/// Per-layer compute budget: models the wake-up/boot cost before a butterfly.
pub const COMPUTE_COST: f64 = 10.0;

/// Per-layer checkpoint budget: models NVM write latency.
pub const CHECKPOINT_COST: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PowerGate,
    ComputeWait,
    Butterfly,
    CheckpointWait,
    WriteData,
    WriteState,
    Done,
}

/// Drives one forward NTT to completion as a sequence of atomic tesserae.
pub struct IntermittentScheduler {
    ring: PolynomialRing,
    l: usize,
    k: usize,
    working: Poly,
    phase: Phase,
    completed_layers: u64,
    power_failures: u64,
    restores: u64,
    compute_cost: f64,
    checkpoint_cost: f64,
}

impl IntermittentScheduler {
    /// Startup/recovery protocol: read the progress counter out of NVM and
    /// either resume from its checkpointed buffer or seed a fresh run.
    /// `poly` is the caller's input; used only when NVM holds no prior
    /// progress.
    pub fn new(
        ring: PolynomialRing,
        nvm: &Nvm,
        poly: Option<Poly>,
        rng: &mut StdRng,
    ) -> Result<Self> {
        Self::with_costs(ring, nvm, poly, rng, COMPUTE_COST, CHECKPOINT_COST)
    }

    /// Like [`Self::new`], but with the per-layer compute/checkpoint costs
    /// overridden (see [`crate::config::SimConfig`]).
    pub fn with_costs(
        ring: PolynomialRing,
        nvm: &Nvm,
        poly: Option<Poly>,
        rng: &mut StdRng,
        compute_cost: f64,
        checkpoint_cost: f64,
    ) -> Result<Self> {
        let l = ring.n().trailing_zeros() as usize;

        let current_step = match nvm.read(STATE_ADDR) {
            Some(v) => v[0] as usize,
            None => 0,
        };

        let mut restores = 0u64;
        let working = if current_step > 0 {
            let addr = DATA_BASE + current_step as i64 - 1;
            match nvm.read(addr) {
                Some(buf) => {
                    restores += 1;
                    info!(step = current_step, "restored working buffer from checkpoint");
                    buf
                }
                None => {
                    warn!(step = current_step, addr, "corrupt checkpoint on startup");
                    return Err(TesseraError::CorruptCheckpoint { step: current_step, addr });
                }
            }
        } else {
            let seed = poly.unwrap_or_else(|| random_poly(&ring, rng));
            let mut buf = ring.reduce(&seed);
            bit_reverse_permute(&mut buf);
            buf
        };

        let phase = if current_step >= l { Phase::Done } else { Phase::PowerGate };

        Ok(Self {
            ring,
            l,
            k: current_step,
            working,
            phase,
            completed_layers: 0,
            power_failures: 0,
            restores,
            compute_cost,
            checkpoint_cost,
        })
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    pub fn completed_layers(&self) -> u64 {
        self.completed_layers
    }

    pub fn power_failures(&self) -> u64 {
        self.power_failures
    }

    pub fn restores(&self) -> u64 {
        self.restores
    }

    pub fn current_step(&self) -> usize {
        self.k
    }

    /// The completed working buffer, once [`Self::is_done`].
    pub fn result(&self) -> &Poly {
        &self.working
    }

    /// Drive the scheduler until it finishes or `deadline` (simulated time)
    /// is reached. Returns `true` iff all `L` layers completed. If the
    /// deadline is hit, the scheduler's durable state (phase, `k`, working
    /// buffer, NVM) is left coherent and a later call with a larger
    /// deadline resumes exactly where this one stopped.
    pub fn run_until(
        &mut self,
        nvm: &mut Nvm,
        power: &mut PowerModel,
        clock: &mut SimClock,
        rng: &mut StdRng,
        deadline: f64,
    ) -> bool {
        loop {
            if self.phase == Phase::Done {
                return true;
            }
            if clock.now() >= deadline {
                return false;
            }

            match self.phase {
                Phase::PowerGate => self.power_gate(nvm, power, clock, rng),
                Phase::ComputeWait => {
                    clock.advance(self.compute_cost);
                    self.phase = Phase::Butterfly;
                }
                Phase::Butterfly => {
                    apply_layer(&mut self.working, self.k, &self.ring);
                    self.phase = Phase::CheckpointWait;
                }
                Phase::CheckpointWait => {
                    clock.advance(self.checkpoint_cost);
                    self.phase = Phase::WriteData;
                }
                Phase::WriteData => {
                    nvm.write(DATA_BASE + self.k as i64, &self.working, clock.now());
                    self.phase = Phase::WriteState;
                }
                Phase::WriteState => {
                    nvm.write(STATE_ADDR, &[(self.k + 1) as i64], clock.now());
                    self.k += 1;
                    self.completed_layers += 1;
                    debug!(layer = self.k, "layer checkpointed");
                    self.phase = if self.k == self.l { Phase::Done } else { Phase::PowerGate };
                }
                Phase::Done => unreachable!(),
            }
        }
    }

    fn power_gate(&mut self, nvm: &mut Nvm, power: &mut PowerModel, clock: &mut SimClock, rng: &mut StdRng) {
        if power.is_powered(clock.now(), rng) {
            self.phase = Phase::ComputeWait;
            return;
        }

        self.power_failures += 1;
        info!(at = clock.now(), "power lost, waiting for restore");
        let restored_at = power.next_restored_after(clock.now(), rng);
        clock.jump_to(restored_at);

        if self.k > 0 {
            let addr = DATA_BASE + self.k as i64 - 1;
            match nvm.read(addr) {
                Some(buf) => {
                    self.working = buf;
                    self.restores += 1;
                    info!(layer = self.k, "reloaded working buffer after restore");
                }
                None => {
                    // The counter having advanced to self.k implies this
                    // checkpoint must exist; its absence is fatal. There is
                    // no return path for an error here without abandoning
                    // the resumption protocol, so the invariant violation
                    // aborts the task outright.
                    panic!("corrupt checkpoint: STATE_ADDR={} but DATA_BASE+{} is absent", self.k, addr);
                }
            }
        }
        self.phase = Phase::ComputeWait;
    }
}

/// One in-place Cooley-Tukey butterfly stage for layer `k` (length =
/// `2^(k+1)`), exactly as in [`crate::ring::PolynomialRing::ntt`] but
/// applied to a single stage instead of the whole transform.
fn apply_layer(a: &mut [i64], k: usize, ring: &PolynomialRing) {
    let q = ring.q();
    let n = ring.n();
    let length = 1usize << (k + 1);
    let half = length / 2;
    let w_len = ring.omega_pow_for_layer(k);

    let mut start = 0;
    while start < n {
        let mut wj = 1i64;
        for j in 0..half {
            let u = a[start + j];
            let v = (a[start + j + half] * wj).rem_euclid(q);
            a[start + j] = (u + v).rem_euclid(q);
            a[start + j + half] = (u - v).rem_euclid(q);
            wj = (wj * w_len).rem_euclid(q);
        }
        start += length;
    }
}

fn random_poly(ring: &PolynomialRing, rng: &mut StdRng) -> Poly {
    (0..ring.n()).map(|_| rng.gen_range(0..ring.q())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fresh(seed: u64) -> (PolynomialRing, Nvm, PowerModel, SimClock, StdRng) {
        (
            PolynomialRing::default_params(),
            Nvm::new(),
            PowerModel::new(9999.0, 1.0),
            SimClock::new(),
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn uninterrupted_run_completes_all_layers() {
        let (ring, mut nvm, mut power, mut clock, mut rng) = fresh(7);
        let mut sched = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap();
        let done = sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 5000.0);
        assert!(done);
        assert_eq!(sched.completed_layers(), 8);
        assert_eq!(nvm.leakage_trace().len(), 16);
        let last = nvm.read(DATA_BASE + 7).expect("final layer checkpoint");
        assert_eq!(last.len(), 256);
    }

    #[test]
    fn state_addr_reaches_l_on_completion() {
        let (ring, mut nvm, mut power, mut clock, mut rng) = fresh(11);
        let mut sched = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap();
        assert!(sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 5000.0));
        assert_eq!(nvm.read(STATE_ADDR), Some(vec![8]));
    }

    #[test]
    fn hostile_schedule_still_completes_and_stays_in_range() {
        let ring = PolynomialRing::default_params();
        let mut nvm = Nvm::new();
        let mut power = PowerModel::new(30.0, 20.0);
        let mut clock = SimClock::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut sched = IntermittentScheduler::new(ring.clone(), &nvm, None, &mut rng).unwrap();

        let done = sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 50_000.0);
        assert!(done);
        assert_eq!(sched.completed_layers(), 8);
        let last = nvm.read(DATA_BASE + 7).unwrap();
        assert!(last.iter().all(|&c| (0..ring.q()).contains(&c)));
        assert!(sched.restores() <= sched.power_failures() + 1);
    }

    #[test]
    fn restore_from_prepopulated_checkpoint() {
        let ring = PolynomialRing::default_params();
        let mut nvm = Nvm::new();
        let mut rng = StdRng::seed_from_u64(4);

        let fake: Poly = (0..ring.n()).map(|_| rng.gen_range(0..ring.q())).collect();
        nvm.write(DATA_BASE + 3, &fake, 0.0);
        nvm.write(STATE_ADDR, &[4], 0.0);

        let mut power = PowerModel::new(9999.0, 1.0);
        let mut clock = SimClock::new();
        let mut sched = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap();

        assert_eq!(sched.current_step(), 4);
        assert!(sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 5000.0));
        assert!(sched.restores() >= 1);
        assert_eq!(sched.completed_layers(), 4);
    }

    #[test]
    fn corrupt_checkpoint_is_fatal_on_startup() {
        let ring = PolynomialRing::default_params();
        let mut nvm = Nvm::new();
        let mut rng = StdRng::seed_from_u64(6);
        // STATE_ADDR says step 4 but DATA_BASE+3 was never written.
        nvm.write(STATE_ADDR, &[4], 0.0);
        let err = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap_err();
        assert!(matches!(err, TesseraError::CorruptCheckpoint { step: 4, .. }));
    }

    #[test]
    fn can_be_cancelled_and_resumed_via_run_until() {
        let (ring, mut nvm, mut power, mut clock, mut rng) = fresh(9);
        let mut sched = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap();

        // A short deadline should abandon the task before it finishes, but
        // leave it in a state a later call can resume from.
        let done = sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 12.0);
        assert!(!done);
        assert!(sched.completed_layers() < 8);

        let done = sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 10_000.0);
        assert!(done);
        assert_eq!(sched.completed_layers(), 8);
    }

    #[test]
    fn real_restart_resumes_from_nvm() {
        // Simulate an actual process kill: run partway, drop the scheduler,
        // then reconstruct one from scratch reading only the NVM.
        let ring = PolynomialRing::default_params();
        let mut nvm = Nvm::new();
        let mut power = PowerModel::new(9999.0, 1.0);
        let mut clock = SimClock::new();
        let mut rng = StdRng::seed_from_u64(13);

        {
            let mut sched = IntermittentScheduler::new(ring.clone(), &nvm, None, &mut rng).unwrap();
            sched.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 20.0);
            assert!(!sched.is_done());
        }

        let mut sched2 = IntermittentScheduler::new(ring, &nvm, None, &mut rng).unwrap();
        assert!(sched2.current_step() > 0);
        assert!(sched2.run_until(&mut nvm, &mut power, &mut clock, &mut rng, 100_000.0));
        assert_eq!(nvm.read(STATE_ADDR), Some(vec![8]));
    }
}
