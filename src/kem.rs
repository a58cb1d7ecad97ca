//! Toy LWE-style key encapsulation ("Baby-Kyber"), scoped as a single-poly
//! analogue of a real Kyber IND-CPA core: one ring element instead of a
//! module-LWE matrix, and no constant-time discipline. This is
//! demonstration plumbing for the NTT/NVM simulation, not a security
//! primitive.

use rand::rngs::StdRng;
use rand::Rng;

use crate::ring::{Poly, PolynomialRing};
use crate::shake::sha3_256;

/// Public key: the seed polynomial `a` and `b = a*s + e`, both encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub a: Vec<u8>,
    pub b: Vec<u8>,
}

/// Secret key: the encoded LWE secret `s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    pub s: Vec<u8>,
}

/// Ciphertext: the encoded `(u, v)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    pub u: Vec<u8>,
    pub v: Vec<u8>,
}

/// A 32-byte shared secret, derived from the encapsulated message by SHA3-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedSecret(pub [u8; 32]);

impl SharedSecret {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

pub struct LatticeKem {
    ring: PolynomialRing,
}

impl LatticeKem {
    pub fn new(ring: PolynomialRing) -> Self {
        Self { ring }
    }

    /// `pk = (a, b = a*s + e)`, `sk = s`, with `a`, `s`, `e` all freshly
    /// sampled. `a` travels in the public key instead of being derived from
    /// a shared seed/XOF, since there is only one ring element here.
    pub fn keygen(&self, rng: &mut StdRng) -> (PublicKey, SecretKey) {
        let a = self.uniform_poly(rng);
        let s = self.small_noise(rng);
        let e = self.small_noise(rng);
        let b = self.ring.add(&self.ring.poly_mul(&a, &s).unwrap(), &e).unwrap();

        let pk = PublicKey { a: encode_poly(&a), b: encode_poly(&b) };
        let sk = SecretKey { s: encode_poly(&s) };
        (pk, sk)
    }

    /// Samples a random 32-byte message `m`, encrypts it under `pk`, and
    /// derives the shared secret as `SHA3-256(m)`.
    pub fn encaps(&self, pk: &PublicKey, rng: &mut StdRng) -> (Ciphertext, SharedSecret) {
        let a = decode_poly(&pk.a, &self.ring);
        let b = decode_poly(&pk.b, &self.ring);

        let r = self.small_noise(rng);
        let e1 = self.small_noise(rng);
        let e2 = self.small_noise(rng);

        let mut m = [0u8; 32];
        rng.fill(&mut m);
        let encoded_m = encode_message(&m, &self.ring);

        let u = self.ring.add(&self.ring.poly_mul(&a, &r).unwrap(), &e1).unwrap();
        let v = self
            .ring
            .add(&self.ring.add(&self.ring.poly_mul(&b, &r).unwrap(), &e2).unwrap(), &encoded_m)
            .unwrap();

        let ct = Ciphertext { u: encode_poly(&u), v: encode_poly(&v) };
        (ct, SharedSecret(sha3_256(&m)))
    }

    /// Recovers the message from `ct` under `sk` and re-derives the shared
    /// secret. Matches the encapsulated value as long as the accumulated
    /// LWE noise term stays closer to its rounding target than to the
    /// opposite one, which holds overwhelmingly often at these noise sizes.
    pub fn decaps(&self, sk: &SecretKey, ct: &Ciphertext) -> SharedSecret {
        let s = decode_poly(&sk.s, &self.ring);
        let u = decode_poly(&ct.u, &self.ring);
        let v = decode_poly(&ct.v, &self.ring);

        let noisy = self.ring.sub(&v, &self.ring.poly_mul(&u, &s).unwrap()).unwrap();
        let m = decode_message(&noisy, &self.ring);
        SharedSecret(sha3_256(&m))
    }

    fn uniform_poly(&self, rng: &mut StdRng) -> Poly {
        (0..self.ring.n()).map(|_| rng.gen_range(0..self.ring.q())).collect()
    }

    /// Small centered noise, each coefficient in `{-2, ..., 2}` mod `q`,
    /// standing in for Kyber's centered-binomial error distribution.
    fn small_noise(&self, rng: &mut StdRng) -> Poly {
        (0..self.ring.n())
            .map(|_| (rng.gen_range(0..5) as i64 - 2).rem_euclid(self.ring.q()))
            .collect()
    }
}

fn encode_poly(p: &[i64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(p.len() * 2);
    for &c in p {
        out.extend_from_slice(&(c as u16).to_le_bytes());
    }
    out
}

fn decode_poly(bytes: &[u8], ring: &PolynomialRing) -> Poly {
    let p: Poly = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]) as i64).collect();
    ring.reduce(&p)
}

/// One message bit per coefficient: `0 -> 0`, `1 -> q/2`, the standard
/// Kyber message-encoding convention scaled down to a single polynomial of
/// `n` bits.
fn encode_message(m: &[u8; 32], ring: &PolynomialRing) -> Poly {
    let half = ring.q() / 2;
    (0..ring.n())
        .map(|i| {
            let byte = m[i / 8];
            let bit = (byte >> (i % 8)) & 1;
            if bit == 1 {
                half
            } else {
                0
            }
        })
        .collect()
}

fn decode_message(p: &[i64], ring: &PolynomialRing) -> [u8; 32] {
    let q = ring.q();
    let half = q / 2;
    let mut m = [0u8; 32];
    for (i, &c) in p.iter().enumerate() {
        let dist_to_zero = c.min(q - c);
        let dist_to_half = (c - half).abs();
        if dist_to_half < dist_to_zero {
            m[i / 8] |= 1 << (i % 8);
        }
    }
    m
}
