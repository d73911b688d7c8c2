use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::generate::channel::DecisionChannel;
use crate::generate::expand::{CharacterRangeExpander, to_other_case};
use crate::generate::groups::GroupTable;
use crate::regex::ast::{Body, CharClass, Group, Token};

/// Text produced by one token, and how many target chars it accounts for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Produced {
    pub text: String,
    pub consumed: usize,
}

impl Produced {
    fn unconsumed(text: String) -> Self {
        Self { text, consumed: 0 }
    }
}

/// State saved before a trial evaluation that may be thrown away.
struct Checkpoint {
    decisions: usize,
    groups: GroupTable,
}

/// Side effects of a finished trial, detached so they can be re-applied.
struct Trial {
    produced: Produced,
    decisions: Vec<usize>,
    groups: GroupTable,
}

/// Skips the first `n` chars of `target`.
fn advance(
    target: &str,
    n: usize,
) -> &str {
    match target.char_indices().nth(n) {
        Some((offset, _)) => &target[offset..],
        None => "",
    }
}

/// Recursive walk over a token tree.
///
/// Choice points are delegated to the channel. Captures land in the group
/// table, which the walk owns exclusively for one generation.
pub struct Evaluator<'a, C> {
    config: &'a GeneratorConfig,
    expander: CharacterRangeExpander<'a>,
    channel: C,
    groups: GroupTable,
}

impl<'a, C: DecisionChannel> Evaluator<'a, C> {
    pub fn new(
        config: &'a GeneratorConfig,
        channel: C,
        group_count: usize,
    ) -> Self {
        Self {
            config,
            expander: CharacterRangeExpander::new(config),
            channel,
            groups: GroupTable::with_groups(group_count),
        }
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Produces text for `token`, steered by `target` when the channel allows it.
    pub fn eval(
        &mut self,
        token: &Token,
        target: &str,
    ) -> Result<Produced> {
        match token {
            Token::Root(group) | Token::Group(group) => self.eval_group(group, target),
            Token::Position(_) => Ok(Produced::default()),
            Token::Class(class) => self.eval_class(class, target),
            Token::Repetition { token, min, max } => {
                self.eval_repetition(token, *min, *max, target)
            }
            // Backreferences never consume target text.
            Token::Reference(index) => Ok(Produced::unconsumed(
                self.groups.resolve(*index).to_string(),
            )),
            Token::Literal(c) => self.eval_literal(*c, target),
        }
    }

    fn eval_group(
        &mut self,
        group: &Group,
        target: &str,
    ) -> Result<Produced> {
        // Lookarounds are assertions, and assertions are not generated.
        if group.lookaround.is_some() {
            return Ok(Produced::default());
        }

        let produced = match &group.body {
            Body::Sequence(stack) => self.eval_stack(stack, target)?,
            Body::Alternation(branches) => self.eval_alternation(branches, target)?,
        };

        if let Some(index) = group.capture {
            self.groups.set(index, produced.text.clone());
        }
        Ok(produced)
    }

    fn eval_stack(
        &mut self,
        stack: &[Token],
        target: &str,
    ) -> Result<Produced> {
        let mut out = Produced::default();
        let mut rest = target;
        for token in stack {
            let produced = self.eval(token, rest)?;
            out.text.push_str(&produced.text);
            out.consumed += produced.consumed;
            rest = advance(rest, produced.consumed);
        }
        Ok(out)
    }

    fn eval_alternation(
        &mut self,
        branches: &[Vec<Token>],
        target: &str,
    ) -> Result<Produced> {
        if !self.channel.is_steered() || target.is_empty() {
            let chosen = self.channel.choose_index(branches.len())?;
            return self.eval_stack(&branches[chosen], target);
        }

        // Score every branch against the target, keeping each one's side effects aside.
        let mut trials = Vec::with_capacity(branches.len());
        for stack in branches {
            let checkpoint = self.checkpoint();
            let produced = self.eval_stack(stack, target)?;
            trials.push(self.detach(checkpoint, produced));
        }

        let scores: Vec<usize> = trials.iter().map(|t| t.produced.consumed).collect();
        let chosen = self.channel.choose_branch(&scores)?;
        let trial = trials.swap_remove(chosen);
        self.channel.decisions_mut().extend(trial.decisions);
        self.groups = trial.groups;
        Ok(trial.produced)
    }

    fn eval_class(
        &mut self,
        class: &CharClass,
        target: &str,
    ) -> Result<Produced> {
        let range = self.expander.expand(class);
        if range.is_empty() {
            return Ok(Produced::default());
        }
        let choice = self
            .channel
            .choose_value_from_range(&range, target.chars().next())?;
        Ok(Produced {
            text: choice.value.to_string(),
            consumed: usize::from(choice.from_target),
        })
    }

    fn eval_repetition(
        &mut self,
        token: &Token,
        min: usize,
        max: Option<usize>,
        target: &str,
    ) -> Result<Produced> {
        let max = max.unwrap_or(min.saturating_add(self.config.repeat_cap));
        let sampled = self.channel.choose_repeat_count(min, max)?;

        let mut out = Produced::default();
        let realized = if self.channel.is_steered() && !target.is_empty() {
            // Realized count is only known after matching; its slot keeps pre-order.
            let slot = self.channel.decisions_mut().reserve();
            let mut rest = target;
            let mut count = 0;
            while count < max {
                let checkpoint = self.checkpoint();
                let produced = self.eval(token, rest)?;
                if produced.consumed == 0 {
                    self.rollback(checkpoint);
                    break;
                }
                out.text.push_str(&produced.text);
                out.consumed += produced.consumed;
                rest = advance(rest, produced.consumed);
                count += 1;
            }
            self.channel.decisions_mut().fill(slot, count);
            count
        } else {
            let count = self.channel.choose_realized_count(sampled, max)?;
            for _ in 0..count {
                let produced = self.eval(token, "")?;
                out.text.push_str(&produced.text);
            }
            count
        };

        // Too few matched: pad with free iterations up to the sampled count.
        if realized < min {
            for _ in realized..sampled {
                let produced = self.eval(token, "")?;
                out.text.push_str(&produced.text);
            }
        }
        Ok(out)
    }

    /// Emits `c`, consuming the first target char equal to it (or to its other
    /// case when case-insensitive).
    ///
    /// Target chars before that one are treated as extra text the pattern
    /// cannot produce and are skipped. This is a greedy approximation, not an
    /// alignment: it never backs up to try a later occurrence.
    fn eval_literal(
        &mut self,
        c: char,
        target: &str,
    ) -> Result<Produced> {
        let other = if self.config.case_insensitive {
            to_other_case(c)
        } else {
            c
        };

        let mut consumed = 0;
        let mut forced = None;
        if let Some((skipped, next)) = target
            .chars()
            .enumerate()
            .find(|&(_, next)| next == c || next == other)
        {
            consumed = skipped + 1;
            forced = Some(next != c);
        }

        let emitted = if other != c && self.channel.choose_case(forced)? {
            other
        } else {
            c
        };
        Ok(Produced {
            text: emitted.to_string(),
            consumed,
        })
    }

    fn checkpoint(&mut self) -> Checkpoint {
        Checkpoint {
            decisions: self.channel.decisions_mut().len(),
            groups: self.groups.clone(),
        }
    }

    fn rollback(
        &mut self,
        checkpoint: Checkpoint,
    ) {
        self.channel.decisions_mut().truncate(checkpoint.decisions);
        self.groups = checkpoint.groups;
    }

    fn detach(
        &mut self,
        checkpoint: Checkpoint,
        produced: Produced,
    ) -> Trial {
        let decisions = self.channel.decisions_mut().split_off(checkpoint.decisions);
        let groups = std::mem::replace(&mut self.groups, checkpoint.groups);
        Trial {
            produced,
            decisions,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::generate::channel::{MatchChannel, RandomChannel, ReplayChannel};
    use crate::regex::parse_regex;

    fn lowest(
        lo: usize,
        _hi: usize,
    ) -> usize {
        lo
    }

    #[test]
    fn advance_counts_chars_not_bytes() {
        assert_eq!(advance("héllo", 2), "llo");
        assert_eq!(advance("ab", 5), "");
    }

    #[test]
    fn references_never_consume() {
        let pattern = parse_regex(r"(ab)\1").unwrap();
        let config = GeneratorConfig::default();
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, MatchChannel::new(&mut rng), pattern.group_count);

        let produced = evaluator.eval(&pattern.root, "ab").unwrap();
        assert_eq!(produced.text, "abab");
        assert_eq!(produced.consumed, 2);

        let reference = Token::Reference(1);
        let produced = evaluator.eval(&reference, "ab").unwrap();
        assert_eq!(
            produced,
            Produced {
                text: "ab".to_string(),
                consumed: 0
            }
        );
    }

    #[test]
    fn unset_reference_is_empty() {
        let pattern = parse_regex(r"\2(a)").unwrap();
        let config = GeneratorConfig::default();
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, RandomChannel::new(&mut rng), pattern.group_count);
        assert_eq!(evaluator.eval(&pattern.root, "").unwrap().text, "a");
    }

    #[test]
    fn lookarounds_and_anchors_produce_nothing() {
        let pattern = parse_regex(r"^a(?=b)\b$").unwrap();
        let config = GeneratorConfig::default();
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, RandomChannel::new(&mut rng), pattern.group_count);
        assert_eq!(evaluator.eval(&pattern.root, "").unwrap().text, "a");
        assert!(evaluator.into_channel().into_decisions().is_empty());
    }

    #[test]
    fn empty_class_produces_nothing_and_records_nothing() {
        let pattern = parse_regex("a[]b").unwrap();
        let config = GeneratorConfig::default();
        let log: [usize; 0] = [];
        let mut evaluator = Evaluator::new(&config, ReplayChannel::new(&log), pattern.group_count);
        assert_eq!(evaluator.eval(&pattern.root, "").unwrap().text, "ab");
    }

    #[test]
    fn literal_skips_unmatched_target_chars() {
        let pattern = parse_regex("a").unwrap();
        let config = GeneratorConfig::default();
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, MatchChannel::new(&mut rng), pattern.group_count);

        assert_eq!(evaluator.eval(&pattern.root, "qqa").unwrap().consumed, 3);
        assert_eq!(evaluator.eval(&pattern.root, "qqq").unwrap().consumed, 0);
    }

    #[test]
    fn case_insensitive_literal_follows_target_case() {
        let pattern = parse_regex("ab1").unwrap();
        let config = GeneratorConfig::default().with_case_insensitive(true);
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, MatchChannel::new(&mut rng), pattern.group_count);

        let produced = evaluator.eval(&pattern.root, "Ab1").unwrap();
        assert_eq!(produced.text, "Ab1");
        assert_eq!(produced.consumed, 3);
        // '1' has no other case and is not a choice point.
        assert_eq!(evaluator.into_channel().into_decisions().as_slice(), &[1, 0]);
    }

    #[test]
    fn failed_iteration_is_rolled_back() {
        // The iteration that stops the loop draws a class value; it must not be logged.
        let pattern = parse_regex("(a[xy])*").unwrap();
        let config = GeneratorConfig::default();
        let mut rng = lowest;
        let mut evaluator = Evaluator::new(&config, MatchChannel::new(&mut rng), pattern.group_count);

        let produced = evaluator.eval(&pattern.root, "ay").unwrap();
        assert_eq!(produced.text, "ay");
        // sampled, realized, then one class rank.
        assert_eq!(evaluator.into_channel().into_decisions().as_slice(), &[0, 1, 1]);
    }
}
