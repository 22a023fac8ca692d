// src/rng.rs
//! Splittable Random Keys
//!
//! # Design Philosophy
//!
//! The solvers in this crate consume randomness through explicit, immutable
//! keys rather than a shared generator:
//! 1. **Reproducibility**: Same key → same draws, bit for bit
//! 2. **Parallel safety**: Independent sample paths derive independent keys
//!    with no shared mutable state
//! 3. **No reuse**: Every consumer derives a fresh child key; a key is never
//!    read twice, so two callers holding the same key see the same path
//!
//! # Key Derivation
//!
//! Child keys are derived with a splitmix64-style mix:
//! ```text
//! z = state + GOLDEN_GAMMA * (index + 1)
//! z = (z ⊕ (z >> 30)) * 0xbf58476d1ce4e5b9
//! z = (z ⊕ (z >> 27)) * 0x94d049bb133111eb
//! child = z ⊕ (z >> 31)
//! ```
//!
//! The mix is a bijection on u64 for each fixed index, so distinct indices
//! give statistically independent child streams.
//!
//! # Sampling
//!
//! Draws go through a `StdRng` seeded from the key. A key advertises exactly
//! how much randomness a call consumes: `normal_draws(n)` is always `n`
//! standard-normal samples from a generator seeded once from the key state.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;

fn mix(z: u64) -> u64 {
    let mut z = z;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// Immutable splittable random key
///
/// The only way to obtain new randomness is to derive child keys; the parent
/// is unchanged. Copyable by design: passing a key never transfers ownership
/// of a stream, because there is no stream, only the derivation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitKey {
    state: u64,
}

impl SplitKey {
    pub fn new(seed: u64) -> Self {
        Self { state: mix(seed) }
    }

    /// Derive the `index`-th child key
    pub fn child(&self, index: u64) -> SplitKey {
        SplitKey {
            state: mix(self.state.wrapping_add(GOLDEN_GAMMA.wrapping_mul(index.wrapping_add(1)))),
        }
    }

    /// Derive `n` independent child keys
    pub fn split(&self, n: usize) -> Vec<SplitKey> {
        (0..n as u64).map(|i| self.child(i)).collect()
    }

    /// Derive a pair of independent child keys
    ///
    /// Used by the stepping loop to separate path sampling from the inner
    /// solver, mirroring `split(2)` without the allocation.
    pub fn pair(&self) -> (SplitKey, SplitKey) {
        (self.child(0), self.child(1))
    }

    /// Seed a standard generator from this key
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.state)
    }

    /// Exactly `n` standard-normal draws
    pub fn normal_draws(&self, n: usize) -> DVector<f64> {
        let mut rng = self.rng();
        DVector::from_fn(n, |_, _| get_normal_draw(&mut rng))
    }

    /// Exactly `rows * cols` standard-normal draws, row-major
    pub fn normal_matrix(&self, rows: usize, cols: usize) -> DMatrix<f64> {
        let mut rng = self.rng();
        DMatrix::from_fn(rows, cols, |_, _| get_normal_draw(&mut rng))
    }
}

pub fn get_normal_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}
