//! Arithmetic in Z_q\[X\]/(X^n+1) — forward/inverse NTT, point-wise and
//! full polynomial multiply.
//!
//! The butterfly structure and numeric discipline (wide intermediate
//! products, single conditional-add normalisation) follow the Montgomery/
//! Barrett reduction style used for Kyber's NTT arithmetic, adapted from
//! bit-accurate hardware integer types to plain `i64` arithmetic — this is
//! a software simulation, not an FPGA core, so there is no benefit to
//! tracking bit widths by hand.

use crate::error::{Result, TesseraError};

/// A length-`n` polynomial over Z_q, coefficients always kept in `[0, q)`.
pub type Poly = Vec<i64>;

/// Ring Z_q\[X\]/(X^n+1) together with its precomputed NTT roots.
#[derive(Debug, Clone)]
pub struct PolynomialRing {
    n: usize,
    q: i64,
    omega: i64,
    omega_inv: i64,
    n_inv: i64,
}

impl PolynomialRing {
    /// Default Kyber-like parameters: n=256, q=3329, omega=3061.
    pub fn default_params() -> Self {
        Self::new(256, 3329).expect("default ring parameters are valid")
    }

    /// Construct a ring for the given transform length and modulus,
    /// discovering a primitive `n`-th root of unity by trial search.
    ///
    /// Fails if `n` is not a power of two or if `n` does not divide `q-1`
    /// (no primitive `n`-th root can exist mod `q`).
    pub fn new(n: usize, q: i64) -> Result<Self> {
        if n == 0 || !n.is_power_of_two() {
            return Err(TesseraError::InvalidParameters {
                n,
                q,
                reason: "n is not a power of two",
            });
        }
        if (q - 1) % (n as i64) != 0 {
            return Err(TesseraError::InvalidParameters {
                n,
                q,
                reason: "n does not divide q-1; no primitive n-th root exists",
            });
        }

        let omega = find_primitive_root(n, q).ok_or(TesseraError::InvalidParameters {
            n,
            q,
            reason: "no primitive n-th root of unity found",
        })?;
        let omega_inv = mod_pow(omega, q - 2, q);
        let n_inv = mod_pow(n as i64, q - 2, q);

        Ok(Self { n, q, omega, omega_inv, n_inv })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn q(&self) -> i64 {
        self.q
    }

    fn check_shape(&self, p: &[i64]) -> Result<()> {
        if p.len() != self.n {
            return Err(TesseraError::ShapeMismatch { expected: self.n, actual: p.len() });
        }
        Ok(())
    }

    /// Reduce every coefficient into `[0, q)`.
    pub fn reduce(&self, p: &[i64]) -> Poly {
        p.iter().map(|&c| c.rem_euclid(self.q)).collect()
    }

    pub fn add(&self, a: &[i64], b: &[i64]) -> Result<Poly> {
        self.check_shape(a)?;
        self.check_shape(b)?;
        Ok(a.iter().zip(b).map(|(&x, &y)| (x + y).rem_euclid(self.q)).collect())
    }

    pub fn sub(&self, a: &[i64], b: &[i64]) -> Result<Poly> {
        self.check_shape(a)?;
        self.check_shape(b)?;
        Ok(a.iter().zip(b).map(|(&x, &y)| (x - y).rem_euclid(self.q)).collect())
    }

    /// Element-wise product mod q, in the NTT (point-value) domain.
    pub fn point_mul(&self, a: &[i64], b: &[i64]) -> Result<Poly> {
        self.check_shape(a)?;
        self.check_shape(b)?;
        Ok(a.iter().zip(b).map(|(&x, &y)| (x * y).rem_euclid(self.q)).collect())
    }

    /// Forward NTT: Cooley-Tukey, decimation-in-time, in place.
    pub fn ntt(&self, p: &[i64]) -> Result<Poly> {
        self.check_shape(p)?;
        let mut a = self.reduce(p);
        bit_reverse_permute(&mut a);

        let mut length = 2usize;
        while length <= self.n {
            let half = length / 2;
            let w_len = mod_pow(self.omega, (self.n / length) as i64, self.q);
            let mut start = 0;
            while start < self.n {
                let mut wj = 1i64;
                for j in 0..half {
                    let u = a[start + j];
                    let v = (a[start + j + half] * wj).rem_euclid(self.q);
                    a[start + j] = (u + v).rem_euclid(self.q);
                    a[start + j + half] = (u - v).rem_euclid(self.q);
                    wj = (wj * w_len).rem_euclid(self.q);
                }
                start += length;
            }
            length <<= 1;
        }
        Ok(a)
    }

    /// Inverse NTT: Gentleman-Sande, decimation-in-frequency.
    pub fn inv_ntt(&self, p: &[i64]) -> Result<Poly> {
        self.check_shape(p)?;
        let mut a = self.reduce(p);

        let mut length = self.n;
        while length >= 2 {
            let half = length / 2;
            let w_len = mod_pow(self.omega_inv, (self.n / length) as i64, self.q);
            let mut start = 0;
            while start < self.n {
                let mut wj = 1i64;
                for j in 0..half {
                    let u = a[start + j];
                    let v = a[start + j + half];
                    a[start + j] = (u + v).rem_euclid(self.q);
                    a[start + j + half] = ((u - v).rem_euclid(self.q) * wj).rem_euclid(self.q);
                    wj = (wj * w_len).rem_euclid(self.q);
                }
                start += length;
            }
            length >>= 1;
        }

        bit_reverse_permute(&mut a);
        for c in a.iter_mut() {
            *c = (*c * self.n_inv).rem_euclid(self.q);
        }
        Ok(a)
    }

    /// Full polynomial multiply via the NTT: `inv_ntt(point_mul(ntt a, ntt b))`.
    pub fn poly_mul(&self, a: &[i64], b: &[i64]) -> Result<Poly> {
        let ta = self.ntt(a)?;
        let tb = self.ntt(b)?;
        let prod = self.point_mul(&ta, &tb)?;
        self.inv_ntt(&prod)
    }

    /// `inv_ntt(ntt(p)) == p mod q`.
    pub fn verify_round_trip(&self, p: &[i64]) -> Result<bool> {
        let rec = self.inv_ntt(&self.ntt(p)?)?;
        Ok(rec == self.reduce(p))
    }

    /// Apply the bit-reversal permutation used as the NTT's index
    /// reordering step, without running the transform.
    pub fn bit_reverse(&self, p: &[i64]) -> Result<Poly> {
        self.check_shape(p)?;
        let mut a = p.to_vec();
        bit_reverse_permute(&mut a);
        Ok(a)
    }

    /// The twiddle factor `omega^(n/length)` for the Cooley-Tukey stage
    /// whose butterfly span is `length = 2^(k+1)` (layer `k`, 0-indexed).
    /// Exposed so a caller can apply one NTT stage at a time (see
    /// [`crate::scheduler`]) instead of the whole transform in [`Self::ntt`].
    pub fn omega_pow_for_layer(&self, k: usize) -> i64 {
        let length = 1usize << (k + 1);
        mod_pow(self.omega, (self.n / length) as i64, self.q)
    }
}

/// Bit-reverse `a` in place, treating indices as `log2(a.len())`-bit numbers.
/// An involution: applying it twice is the identity.
pub fn bit_reverse_permute<T>(a: &mut [T]) {
    let n = a.len();
    if n <= 1 {
        return;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let r = reverse_bits(i, bits);
        if i < r {
            a.swap(i, r);
        }
    }
}

fn reverse_bits(val: usize, bits: u32) -> usize {
    if bits == 0 {
        return val;
    }
    val.reverse_bits() >> (usize::BITS - bits)
}

fn mod_pow(mut base: i64, mut exp: i64, modulus: i64) -> i64 {
    if modulus == 1 {
        return 0;
    }
    let mut result = 1i64;
    base = base.rem_euclid(modulus);
    while exp > 0 {
        if exp & 1 == 1 {
            result = (result * base).rem_euclid(modulus);
        }
        exp >>= 1;
        base = (base * base).rem_euclid(modulus);
    }
    result
}

/// Find the smallest g >= 2 such that omega = g^((q-1)/n) mod q has order
/// exactly n, i.e. omega^(n/2) != 1.
fn find_primitive_root(n: usize, q: i64) -> Option<i64> {
    let exp = (q - 1) / n as i64;
    let mut g = 2i64;
    while g < q {
        let omega = mod_pow(g, exp, q);
        if omega != 0 && mod_pow(omega, (n / 2) as i64, q) != 1 {
            return Some(omega);
        }
        g += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ring() -> PolynomialRing {
        PolynomialRing::default_params()
    }

    #[test]
    fn default_omega_is_3061() {
        // for the default parameters (n=256, q=3329) omega = 3061.
        assert_eq!(ring().omega, 3061);
    }

    #[test]
    fn bit_reverse_of_0_to_7() {
        let mut v: Vec<i64> = (0..8).collect();
        bit_reverse_permute(&mut v);
        assert_eq!(v, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn bit_reverse_is_involution() {
        let mut v: Vec<i64> = (0..256).collect();
        let orig = v.clone();
        bit_reverse_permute(&mut v);
        bit_reverse_permute(&mut v);
        assert_eq!(v, orig);
    }

    #[test]
    fn round_trip_seeded_trials() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let r = ring();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let p: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
            assert!(r.verify_round_trip(&p).unwrap());
        }
    }

    #[test]
    fn point_mul_commutes() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let r = ring();
        let mut rng = StdRng::seed_from_u64(1);
        let a: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
        let b: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
        assert_eq!(r.point_mul(&a, &b).unwrap(), r.point_mul(&b, &a).unwrap());
    }

    #[test]
    fn poly_mul_commutes_and_associates() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let r = ring();
        let mut rng = StdRng::seed_from_u64(2);
        let a: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
        let b: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
        let c: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();

        assert_eq!(r.poly_mul(&a, &b).unwrap(), r.poly_mul(&b, &a).unwrap());

        let ab = r.poly_mul(&a, &b).unwrap();
        let abc_left = r.poly_mul(&ab, &c).unwrap();
        let bc = r.poly_mul(&b, &c).unwrap();
        let abc_right = r.poly_mul(&a, &bc).unwrap();
        assert_eq!(abc_left, abc_right);
    }

    #[test]
    fn poly_mul_identity() {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let r = ring();
        let mut one = vec![0i64; r.n()];
        one[0] = 1;
        let mut rng = StdRng::seed_from_u64(3);
        let a: Vec<i64> = (0..r.n()).map(|_| rng.gen_range(0..r.q())).collect();
        assert_eq!(r.poly_mul(&a, &one).unwrap(), r.reduce(&a));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let r = ring();
        let short = vec![0i64; r.n() - 1];
        assert!(matches!(r.ntt(&short), Err(TesseraError::ShapeMismatch { .. })));
    }

    #[test]
    fn bad_parameters_are_rejected() {
        assert!(PolynomialRing::new(3, 97).is_err()); // not a power of two
        assert!(PolynomialRing::new(4, 10).is_err()); // 4 does not divide 9
    }

    proptest! {
        #[test]
        fn round_trip_property(coeffs in proptest::collection::vec(0i64..3329, 256)) {
            let r = ring();
            prop_assert!(r.verify_round_trip(&coeffs).unwrap());
        }
    }
}
