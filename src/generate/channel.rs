//! # Decision Channels
//!
//! Every structural choice the evaluator faces (which alternation branch,
//! which class member, how many repetitions, which letter case) is resolved
//! by a [`DecisionChannel`]. The three channels differ only in where the
//! answer comes from:
//!
//! * [`RandomChannel`] draws from a [`RandomSource`].
//! * [`MatchChannel`] reads the answer off a target string when it can and
//!   falls back to randomness when it cannot.
//! * [`ReplayChannel`] pops answers from a previously recorded log.
//!
//! Whatever the source, each resolved value is appended to the channel's
//! output [`DecisionLog`].

use crate::charset::CharRange;
use crate::config::RandomSource;
use crate::error::{RandexpError, Result};
use crate::generate::decisions::DecisionLog;

/// A class member picked by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassChoice {
    pub value: char,
    /// True when the value was read from the target rather than chosen freely.
    pub from_target: bool,
}

/// Resolves choice points and records every resolution.
pub trait DecisionChannel {
    /// True when choices are steered toward a target string.
    fn is_steered(&self) -> bool {
        false
    }

    /// Picks an index in `0..domain_size`.
    fn choose_index(
        &mut self,
        domain_size: usize,
    ) -> Result<usize>;

    /// Picks an alternation branch, given how much of the target each branch consumed.
    fn choose_branch(
        &mut self,
        consumed: &[usize],
    ) -> Result<usize> {
        self.choose_index(consumed.len())
    }

    /// Picks a member of a non-empty `range`; `next` is the target's next char, if any.
    fn choose_value_from_range(
        &mut self,
        range: &CharRange,
        next: Option<char>,
    ) -> Result<ClassChoice>;

    /// Samples a repetition count in `min..=max`.
    fn choose_repeat_count(
        &mut self,
        min: usize,
        max: usize,
    ) -> Result<usize>;

    /// How many iterations to produce when no target steers the repetition.
    fn choose_realized_count(
        &mut self,
        sampled: usize,
        _max: usize,
    ) -> Result<usize> {
        self.decisions_mut().push(sampled);
        Ok(sampled)
    }

    /// Whether a case-foldable literal is emitted in its other case.
    ///
    /// `forced` carries the answer when the target already decided it.
    fn choose_case(
        &mut self,
        forced: Option<bool>,
    ) -> Result<bool>;

    fn decisions_mut(&mut self) -> &mut DecisionLog;

    fn into_decisions(self) -> DecisionLog
    where
        Self: Sized;
}

fn nth_char(
    range: &CharRange,
    k: usize,
) -> char {
    range
        .index(k)
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Draws every choice uniformly from a [`RandomSource`].
pub struct RandomChannel<'r> {
    rng: &'r mut dyn RandomSource,
    decisions: DecisionLog,
}

impl<'r> RandomChannel<'r> {
    pub fn new(rng: &'r mut dyn RandomSource) -> Self {
        Self {
            rng,
            decisions: DecisionLog::new(),
        }
    }

    fn draw(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize {
        let value = self.rng.rand_int(lo, hi);
        self.decisions.push(value);
        value
    }
}

impl DecisionChannel for RandomChannel<'_> {
    fn choose_index(
        &mut self,
        domain_size: usize,
    ) -> Result<usize> {
        debug_assert!(domain_size > 0);
        Ok(self.draw(0, domain_size.saturating_sub(1)))
    }

    fn choose_value_from_range(
        &mut self,
        range: &CharRange,
        _next: Option<char>,
    ) -> Result<ClassChoice> {
        let k = self.draw(0, range.len().saturating_sub(1));
        Ok(ClassChoice {
            value: nth_char(range, k),
            from_target: false,
        })
    }

    fn choose_repeat_count(
        &mut self,
        min: usize,
        max: usize,
    ) -> Result<usize> {
        Ok(self.draw(min, max))
    }

    fn choose_case(
        &mut self,
        _forced: Option<bool>,
    ) -> Result<bool> {
        Ok(self.draw(0, 1) == 1)
    }

    fn decisions_mut(&mut self) -> &mut DecisionLog {
        &mut self.decisions
    }

    fn into_decisions(self) -> DecisionLog {
        self.decisions
    }
}

/// Prefers choices that reproduce a target string.
///
/// The heuristic is greedy: a branch or class member is accepted as soon as
/// it consumes target text, and anything the target cannot decide is drawn at
/// random.
pub struct MatchChannel<'r> {
    fallback: RandomChannel<'r>,
}

impl<'r> MatchChannel<'r> {
    pub fn new(rng: &'r mut dyn RandomSource) -> Self {
        Self {
            fallback: RandomChannel::new(rng),
        }
    }
}

impl DecisionChannel for MatchChannel<'_> {
    fn is_steered(&self) -> bool {
        true
    }

    fn choose_index(
        &mut self,
        domain_size: usize,
    ) -> Result<usize> {
        self.fallback.choose_index(domain_size)
    }

    fn choose_branch(
        &mut self,
        consumed: &[usize],
    ) -> Result<usize> {
        // First branch with the highest score wins ties.
        let mut best = 0;
        for (i, &score) in consumed.iter().enumerate() {
            if score > consumed[best] {
                best = i;
            }
        }
        if consumed.get(best).copied().unwrap_or(0) == 0 {
            tracing::trace!(branches = consumed.len(), "no branch consumes the target");
            return self.fallback.choose_index(consumed.len());
        }
        tracing::trace!(?consumed, best, "steered alternation");
        self.fallback.decisions.push(best);
        Ok(best)
    }

    fn choose_value_from_range(
        &mut self,
        range: &CharRange,
        next: Option<char>,
    ) -> Result<ClassChoice> {
        if let Some(next) = next {
            if let Some(k) = range.rank(next as u32) {
                self.fallback.decisions.push(k);
                return Ok(ClassChoice {
                    value: next,
                    from_target: true,
                });
            }
            tracing::trace!(?next, "target char outside class");
        }
        self.fallback.choose_value_from_range(range, None)
    }

    fn choose_repeat_count(
        &mut self,
        min: usize,
        max: usize,
    ) -> Result<usize> {
        self.fallback.choose_repeat_count(min, max)
    }

    fn choose_case(
        &mut self,
        forced: Option<bool>,
    ) -> Result<bool> {
        match forced {
            Some(flipped) => {
                self.fallback.decisions.push(usize::from(flipped));
                Ok(flipped)
            }
            None => self.fallback.choose_case(None),
        }
    }

    fn decisions_mut(&mut self) -> &mut DecisionLog {
        self.fallback.decisions_mut()
    }

    fn into_decisions(self) -> DecisionLog {
        self.fallback.into_decisions()
    }
}

/// Replays a recorded log, ignoring targets and randomness.
pub struct ReplayChannel<'l> {
    replay: &'l [usize],
    cursor: usize,
    decisions: DecisionLog,
}

impl<'l> ReplayChannel<'l> {
    pub fn new(replay: &'l [usize]) -> Self {
        Self {
            replay,
            cursor: 0,
            decisions: DecisionLog::new(),
        }
    }

    /// Values left over once generation finished.
    pub fn remaining(&self) -> usize {
        self.replay.len() - self.cursor
    }

    fn pop(
        &mut self,
        min: usize,
        max: usize,
    ) -> Result<usize> {
        let value = *self
            .replay
            .get(self.cursor)
            .ok_or(RandexpError::ExhaustedReplayLog {
                consumed: self.cursor,
            })?;
        if value < min || value > max {
            return Err(RandexpError::InvalidReplayValue {
                position: self.cursor,
                value,
                min,
                max,
            });
        }
        self.cursor += 1;
        self.decisions.push(value);
        Ok(value)
    }
}

impl DecisionChannel for ReplayChannel<'_> {
    fn choose_index(
        &mut self,
        domain_size: usize,
    ) -> Result<usize> {
        self.pop(0, domain_size.saturating_sub(1))
    }

    fn choose_value_from_range(
        &mut self,
        range: &CharRange,
        _next: Option<char>,
    ) -> Result<ClassChoice> {
        let k = self.pop(0, range.len().saturating_sub(1))?;
        Ok(ClassChoice {
            value: nth_char(range, k),
            from_target: false,
        })
    }

    fn choose_repeat_count(
        &mut self,
        min: usize,
        max: usize,
    ) -> Result<usize> {
        self.pop(min, max)
    }

    fn choose_realized_count(
        &mut self,
        _sampled: usize,
        max: usize,
    ) -> Result<usize> {
        self.pop(0, max)
    }

    fn choose_case(
        &mut self,
        _forced: Option<bool>,
    ) -> Result<bool> {
        Ok(self.pop(0, 1)? == 1)
    }

    fn decisions_mut(&mut self) -> &mut DecisionLog {
        &mut self.decisions
    }

    fn into_decisions(self) -> DecisionLog {
        self.decisions
    }
}
