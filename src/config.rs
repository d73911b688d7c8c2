//! # Generator Configuration
//!
//! Flags, the plain-data [`GeneratorConfig`], and the pluggable
//! [`RandomSource`] integer sampler.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::charset::CharRange;
use crate::error::{RandexpError, Result};

/// Substituted for the upper bound of `*`, `+` and `{n,}`, relative to the minimum.
pub const DEFAULT_REPEAT_CAP: usize = 100;

/// Pattern flags that affect generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags {
    pub case_insensitive: bool,
    /// Carried along; anchors are never interpreted.
    pub multiline: bool,
}

impl Flags {
    /// Parses a JavaScript-style flag string such as `"im"`.
    ///
    /// `g`, `s`, `u` and `y` are accepted and ignored.
    pub fn parse(flags: &str) -> Result<Self> {
        let mut parsed = Self::default();
        for c in flags.chars() {
            match c {
                'i' => parsed.case_insensitive = true,
                'm' => parsed.multiline = true,
                'g' | 's' | 'u' | 'y' => {}
                _ => return Err(RandexpError::InvalidFlag(c)),
            }
        }
        Ok(parsed)
    }

    /// Flags set in either `self` or `other`.
    pub fn union(
        self,
        other: Flags,
    ) -> Flags {
        Flags {
            case_insensitive: self.case_insensitive || other.case_insensitive,
            multiline: self.multiline || other.multiline,
        }
    }
}

/// Read-only settings shared by every generation from one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Added to the minimum to bound unbounded repetitions.
    pub repeat_cap: usize,

    /// Outer bound for every character class.
    pub default_alphabet: CharRange,

    pub case_insensitive: bool,

    pub multiline: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            repeat_cap: DEFAULT_REPEAT_CAP,
            default_alphabet: CharRange::printable(),
            case_insensitive: false,
            multiline: false,
        }
    }
}

impl GeneratorConfig {
    pub fn from_flags(flags: Flags) -> Self {
        Self::default().with_flags(flags)
    }

    pub fn flags(&self) -> Flags {
        Flags {
            case_insensitive: self.case_insensitive,
            multiline: self.multiline,
        }
    }

    pub fn with_flags(
        mut self,
        flags: Flags,
    ) -> Self {
        self.case_insensitive = flags.case_insensitive;
        self.multiline = flags.multiline;
        self
    }

    /// Sets the cap used in place of an unbounded repetition maximum.
    pub fn with_repeat_cap(
        mut self,
        repeat_cap: usize,
    ) -> Self {
        self.repeat_cap = repeat_cap;
        self
    }

    /// Sets the alphabet classes are drawn from.
    ///
    /// Widening it (for instance to `0..=0xFFFF`) lets negated classes and `.`
    /// produce non-ASCII output.
    pub fn with_default_alphabet(
        mut self,
        alphabet: CharRange,
    ) -> Self {
        self.default_alphabet = alphabet;
        self
    }

    pub fn with_case_insensitive(
        mut self,
        case_insensitive: bool,
    ) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }
}

/// A source of uniformly distributed integers.
pub trait RandomSource: Send {
    /// Returns an integer in `lo..=hi`. Callers guarantee `lo <= hi`.
    fn rand_int(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize;
}

impl<F> RandomSource for F
where
    F: FnMut(usize, usize) -> usize + Send,
{
    fn rand_int(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize {
        self(lo, hi)
    }
}

/// Draws from the thread-local generator of the `rand` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn rand_int(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize {
        rand::rng().random_range(lo..=hi)
    }
}

/// A reproducible generator seeded from a `u64`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn rand_int(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize {
        self.rng.random_range(lo..=hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let flags = Flags::parse("gim").unwrap();
        assert!(flags.case_insensitive);
        assert!(flags.multiline);

        assert_eq!(Flags::parse("").unwrap(), Flags::default());
        assert_eq!(Flags::parse("iq"), Err(RandexpError::InvalidFlag('q')));
    }

    #[test]
    fn config_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.repeat_cap, 100);
        assert_eq!(config.default_alphabet.len(), 95);
        assert!(!config.case_insensitive);

        let config = GeneratorConfig::from_flags(Flags::parse("i").unwrap()).with_repeat_cap(3);
        assert!(config.case_insensitive);
        assert_eq!(config.repeat_cap, 3);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(7);
        let mut b = SeededRandom::new(7);
        let xs: Vec<usize> = (0..16).map(|_| a.rand_int(0, 1000)).collect();
        let ys: Vec<usize> = (0..16).map(|_| b.rand_int(0, 1000)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&x| x <= 1000));
    }

    #[test]
    fn closures_are_random_sources() {
        let mut lowest = |lo: usize, _hi: usize| lo;
        assert_eq!(lowest.rand_int(3, 9), 3);
        assert_eq!(ThreadRandom.rand_int(4, 4), 4);
    }
}
