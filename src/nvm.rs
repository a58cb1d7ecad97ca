//! Non-volatile memory — address-to-blob persistence plus the
//! Hamming-weight side-channel leakage trace.
//!
//! Coefficients are treated as fixed-width words, the same convention
//! Kyber/Dilithium implementations use for packed coefficients; here the
//! word width is a parameter of the leakage model, not of any crypto.

use std::collections::HashMap;

/// One leakage sample: simulated time of the write, Hamming weight of the
/// written blob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeakageSample {
    pub time: f64,
    pub value: u64,
}

/// One-line statistical summary of the leakage trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NvmStats {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

impl std::fmt::Display for NvmStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} writes, leakage min={} max={} mean={:.1}",
            self.count, self.min, self.max, self.mean
        )
    }
}

/// Sparse address -> polynomial-blob store with an append-only leakage log.
#[derive(Debug, Default)]
pub struct Nvm {
    storage: HashMap<i64, Vec<i64>>,
    leakage: Vec<LeakageSample>,
}

impl Nvm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an owned copy of `blob` at `addr`, overwriting any prior entry,
    /// and append a leakage sample in arrival order.
    pub fn write(&mut self, addr: i64, blob: &[i64], time: f64) {
        let value = hamming_weight(blob);
        self.storage.insert(addr, blob.to_vec());
        self.leakage.push(LeakageSample { time, value });
    }

    /// Returns an owned copy of the last-written blob at `addr`, or `None`.
    /// Mutating the result never aliases internal storage.
    pub fn read(&self, addr: i64) -> Option<Vec<i64>> {
        self.storage.get(&addr).cloned()
    }

    pub fn leakage_trace(&self) -> &[LeakageSample] {
        &self.leakage
    }

    pub fn leakage_times(&self) -> Vec<f64> {
        self.leakage.iter().map(|s| s.time).collect()
    }

    pub fn leakage_values(&self) -> Vec<u64> {
        self.leakage.iter().map(|s| s.value).collect()
    }

    pub fn stats(&self) -> Option<NvmStats> {
        if self.leakage.is_empty() {
            return None;
        }
        let values = self.leakage_values();
        let min = *values.iter().min().unwrap();
        let max = *values.iter().max().unwrap();
        let mean = values.iter().sum::<u64>() as f64 / values.len() as f64;
        Some(NvmStats { count: values.len(), min, max, mean })
    }
}

/// Treat each coefficient as an unsigned 16-bit word; sum of set bits.
pub fn hamming_weight(blob: &[i64]) -> u64 {
    blob.iter().map(|&c| (c as u16).count_ones() as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_last_write() {
        let mut nvm = Nvm::new();
        nvm.write(0, &[1, 2, 3], 0.0);
        nvm.write(0, &[4, 5, 6], 1.0);
        assert_eq!(nvm.read(0), Some(vec![4, 5, 6]));
        assert_eq!(nvm.read(1), None);
    }

    #[test]
    fn read_is_isolated_from_caller_mutation() {
        let mut nvm = Nvm::new();
        nvm.write(0, &[1, 2, 3], 0.0);
        let mut got = nvm.read(0).unwrap();
        got[0] = 999;
        assert_eq!(nvm.read(0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn hamming_weight_zero_blob() {
        assert_eq!(hamming_weight(&[0, 0, 0]), 0);
    }

    #[test]
    fn hamming_weight_all_ones_words() {
        // 0xFFFF has all 16 bits set.
        assert_eq!(hamming_weight(&[0xFFFF; 4]), 16 * 4);
    }

    #[test]
    fn zero_blob_leaks_value_zero_at_current_time() {
        let mut nvm = Nvm::new();
        nvm.write(7, &[0, 0, 0, 0], 12.5);
        let trace = nvm.leakage_trace();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0], LeakageSample { time: 12.5, value: 0 });
    }

    #[test]
    fn leakage_appended_in_arrival_order() {
        let mut nvm = Nvm::new();
        nvm.write(0, &[1], 0.0);
        nvm.write(1, &[3], 1.0);
        nvm.write(0, &[7], 2.0);
        let times = nvm.leakage_times();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn stats_none_when_empty() {
        assert_eq!(Nvm::new().stats(), None);
    }
}
