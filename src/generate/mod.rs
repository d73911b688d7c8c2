//! # Generation
//!
//! An [`Engine`] holds a tokenized pattern and its [`GeneratorConfig`], and
//! produces strings from it in three modes:
//!
//! * free random generation, [`Engine::generate`] with no target;
//! * generation steered toward a target string, [`Engine::generate`] with a
//!   target, which reproduces the target when the pattern allows and
//!   otherwise approximates it greedily;
//! * replay of a recorded [`DecisionLog`], [`Engine::generate_from_log`].
//!
//! Every generation returns the log of decisions it made, so any output can
//! be reproduced later from the same pattern and configuration.

mod channel;
mod decisions;
mod evaluator;
mod expand;
mod groups;

use std::fmt;

use parking_lot::Mutex;

pub use channel::{ClassChoice, DecisionChannel, MatchChannel, RandomChannel, ReplayChannel};
pub use decisions::DecisionLog;
pub use evaluator::{Evaluator, Produced};
pub use expand::{CharacterRangeExpander, to_other_case};
pub use groups::GroupTable;

use crate::config::{Flags, GeneratorConfig, RandomSource, ThreadRandom};
use crate::error::Result;
use crate::regex::{Pattern, Syntax, parse_with_syntax};

/// Anything an [`Engine`] can be compiled from.
#[derive(Debug, Clone)]
pub enum PatternSource {
    Source(String),
    /// A compiled regex; its flags come from a leading `(?i)` style group.
    Regex(::regex::Regex),
}

impl PatternSource {
    pub fn as_str(&self) -> &str {
        match self {
            PatternSource::Source(source) => source,
            PatternSource::Regex(regex) => regex.as_str(),
        }
    }

    /// The dialect the source text is written in.
    pub fn syntax(&self) -> Syntax {
        match self {
            PatternSource::Source(_) => Syntax::JavaScript,
            PatternSource::Regex(_) => Syntax::Rust,
        }
    }
}

impl From<&str> for PatternSource {
    fn from(source: &str) -> Self {
        PatternSource::Source(source.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(source: String) -> Self {
        PatternSource::Source(source)
    }
}

impl From<::regex::Regex> for PatternSource {
    fn from(regex: ::regex::Regex) -> Self {
        PatternSource::Regex(regex)
    }
}

impl From<&::regex::Regex> for PatternSource {
    fn from(regex: &::regex::Regex) -> Self {
        PatternSource::Regex(regex.clone())
    }
}

/// The result of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub output: String,

    /// Replaying these through [`Engine::generate_from_log`] reproduces `output`.
    pub decisions: DecisionLog,

    /// How many target chars the output accounts for; zero outside match mode.
    pub consumed: usize,
}

/// A compiled pattern ready to generate strings.
pub struct Engine {
    pattern: Pattern,
    config: GeneratorConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    last_decisions: Mutex<DecisionLog>,
}

impl fmt::Debug for Engine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Engine")
            .field("pattern", &self.pattern)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Tokenizes `pattern` and builds its configuration from `flags`.
    ///
    /// `flags` are JavaScript-style (`"i"`, `"m"`, `"im"`). They are merged
    /// with any inline flags the pattern starts with. Text is read as a
    /// JavaScript pattern; a compiled `regex::Regex` is read as Rust syntax.
    pub fn compile(
        pattern: impl Into<PatternSource>,
        flags: &str,
    ) -> Result<Self> {
        let flags = Flags::parse(flags)?;
        let source = pattern.into();
        let pattern = parse_with_syntax(source.as_str(), source.syntax())?;
        let config = GeneratorConfig::from_flags(flags.union(pattern.inline_flags));
        Ok(Self::from_pattern(pattern, config))
    }

    pub fn from_pattern(
        pattern: Pattern,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            pattern,
            config,
            rng: Mutex::new(Box::new(ThreadRandom)),
            last_decisions: Mutex::new(DecisionLog::new()),
        }
    }

    /// Replaces the random source used by [`generate`](Self::generate).
    pub fn with_rng(
        self,
        rng: impl RandomSource + 'static,
    ) -> Self {
        *self.rng.lock() = Box::new(rng);
        self
    }

    /// Replaces the configuration.
    ///
    /// Flags the engine was compiled with stay set; `config` can add flags
    /// but not clear them.
    pub fn with_config(
        mut self,
        config: GeneratorConfig,
    ) -> Self {
        let flags = config.flags().union(self.config.flags());
        self.config = config.with_flags(flags);
        self
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Decisions recorded by the most recent generation.
    pub fn last_decisions(&self) -> DecisionLog {
        self.last_decisions.lock().clone()
    }

    /// Generates a random string.
    pub fn sample(&self) -> Result<String> {
        self.generate(None).map(|generation| generation.output)
    }

    /// Generates a string, steered toward `target` when one is given.
    pub fn generate(
        &self,
        target: Option<&str>,
    ) -> Result<Generation> {
        let mut rng = self.rng.lock();
        self.generate_with_rng(rng.as_mut(), target)
    }

    /// Like [`generate`](Self::generate), drawing from the caller's random source.
    #[tracing::instrument(level = "debug", skip(self, rng))]
    pub fn generate_with_rng(
        &self,
        rng: &mut dyn RandomSource,
        target: Option<&str>,
    ) -> Result<Generation> {
        match target {
            Some(target) => {
                let (produced, channel) = self.walk(MatchChannel::new(rng), target)?;
                Ok(self.finish(produced, channel.into_decisions()))
            }
            None => {
                let (produced, channel) = self.walk(RandomChannel::new(rng), "")?;
                Ok(self.finish(produced, channel.into_decisions()))
            }
        }
    }

    /// Reproduces the string that was generated together with `log`.
    ///
    /// The log must come from this pattern and configuration. Values left
    /// over after generation are ignored.
    #[tracing::instrument(level = "debug", skip_all, fields(len = log.len()))]
    pub fn generate_from_log(
        &self,
        log: &[usize],
    ) -> Result<Generation> {
        let (produced, channel) = self.walk(ReplayChannel::new(log), "")?;
        if channel.remaining() > 0 {
            tracing::debug!(remaining = channel.remaining(), "unused replay decisions");
        }
        Ok(self.finish(produced, channel.into_decisions()))
    }

    fn walk<C: DecisionChannel>(
        &self,
        channel: C,
        target: &str,
    ) -> Result<(Produced, C)> {
        let mut evaluator = Evaluator::new(&self.config, channel, self.pattern.group_count);
        let produced = evaluator.eval(&self.pattern.root, target)?;
        Ok((produced, evaluator.into_channel()))
    }

    fn finish(
        &self,
        produced: Produced,
        decisions: DecisionLog,
    ) -> Generation {
        tracing::debug!(
            chars = produced.text.chars().count(),
            consumed = produced.consumed,
            decisions = decisions.len(),
            "generated"
        );
        *self.last_decisions.lock() = decisions.clone();
        Generation {
            output: produced.text,
            decisions,
            consumed: produced.consumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::charset::CharRange;
    use crate::error::RandexpError;

    /// Always picks the middle of the interval, rounding up.
    fn midpoint(
        lo: usize,
        hi: usize,
    ) -> usize {
        lo + (hi - lo + 1) / 2
    }

    fn engine(pattern: &str) -> Engine {
        Engine::compile(pattern, "").unwrap().with_rng(midpoint)
    }

    fn gen_match(
        pattern: &str,
        target: &str,
    ) -> Generation {
        let engine = engine(pattern);
        let generation = engine.generate(Some(target)).unwrap();
        let replayed = engine.generate_from_log(generation.decisions.as_slice()).unwrap();
        assert_eq!(replayed.output, generation.output, "replay of {pattern:?} on {target:?}");
        assert_eq!(replayed.decisions, generation.decisions);
        generation
    }

    #[rstest]
    #[case(".", "a", "a")]
    #[case(".", "b", "b")]
    #[case("..", "ab", "ab")]
    #[case("..", "nz", "nz")]
    fn matches_simple(
        #[case] pattern: &str,
        #[case] target: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(gen_match(pattern, target).output, expected);
    }

    #[rstest]
    #[case("(a|b)c", "ac", "ac", &[0])]
    #[case("(a|b)c", "bc", "bc", &[1])]
    #[case("(ab|cd)e", "abe", "abe", &[0])]
    #[case("(ab|cd)e", "cde", "cde", &[1])]
    #[case("(ab|cd)e", "abf", "abe", &[0])]
    #[case("^a((b|c)|(d|e))$", "ad", "ad", &[1, 0])]
    fn matches_alternation(
        #[case] pattern: &str,
        #[case] target: &str,
        #[case] expected: &str,
        #[case] decisions: &[usize],
    ) {
        let generation = gen_match(pattern, target);
        assert_eq!(generation.output, expected);
        assert_eq!(generation.decisions.as_slice(), decisions);
    }

    #[rstest]
    #[case("ca?b", "cab", "cab")]
    #[case("ca?b", "cb", "cb")]
    #[case("ca?b", "caab", "cab")]
    #[case("a{3,5}", "aaa", "aaa")]
    #[case("a{3,5}", "aaaa", "aaaa")]
    #[case("a{3,5}", "aaaaa", "aaaaa")]
    #[case("a{3,5}", "aaaaaa", "aaaaa")]
    #[case("a+", "aaaaaa", "aaaaaa")]
    #[case("a+", "aaaaa", "aaaaa")]
    #[case("ab+c", "abbc", "abbc")]
    #[case("ab+c", "abc", "abc")]
    #[case("ab*c", "ac", "ac")]
    #[case("ab*c", "abbbbc", "abbbbc")]
    #[case("ab*c", "abc", "abc")]
    fn matches_repetition(
        #[case] pattern: &str,
        #[case] target: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(gen_match(pattern, target).output, expected);
    }

    #[rstest]
    #[case("aaa", 3)]
    #[case("aaaa", 4)]
    #[case("aaaaa", 5)]
    #[case("aaaaaa", 5)]
    fn repetition_logs_sampled_then_realized(
        #[case] target: &str,
        #[case] realized: usize,
    ) {
        let generation = gen_match("a{3,5}", target);
        assert_eq!(generation.decisions.as_slice(), &[4, realized]);
        assert_eq!(generation.consumed, realized);
    }

    #[rstest]
    #[case("qqqac", "ac")]
    #[case("qqqab", "ab")]
    #[case("aqqqc", "ac")]
    #[case("aqqqb", "ab")]
    #[case("acqqq", "ac")]
    #[case("abqqq", "ab")]
    fn matches_partial_targets(
        #[case] target: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(gen_match("^a(b|c)$", target).output, expected);
    }

    #[test]
    fn short_match_is_padded_to_the_sampled_count() {
        // One 'a' matches, the sampled count is 4, so three more are generated freely.
        let generation = gen_match("a{3,5}", "a");
        assert_eq!(generation.output, "aaaa");
        assert_eq!(generation.consumed, 1);
        assert_eq!(generation.decisions.as_slice(), &[4, 1]);
    }

    #[test]
    fn free_generation_records_every_choice() {
        let engine = engine("[a-c]{2}(x|y|z)");
        let generation = engine.generate(None).unwrap();
        assert_eq!(generation.output, "bby");
        assert_eq!(generation.decisions.as_slice(), &[2, 2, 1, 1, 1]);
        assert_eq!(generation.consumed, 0);
        assert_eq!(engine.last_decisions(), generation.decisions);
    }

    #[test]
    fn replay_steers_every_choice() {
        let engine = engine("[a-c]{1,3}(x|y|z)");
        let generation = engine.generate_from_log(&[3, 3, 0, 2, 1, 2]).unwrap();
        assert_eq!(generation.output, "acbz");
        assert_eq!(generation.decisions.as_slice(), &[3, 3, 0, 2, 1, 2]);
    }

    #[test]
    fn replay_ignores_leftover_values() {
        let engine = engine("a|b");
        let generation = engine.generate_from_log(&[1, 7, 7]).unwrap();
        assert_eq!(generation.output, "b");
        assert_eq!(generation.decisions.as_slice(), &[1]);
    }

    #[test]
    fn replay_fails_when_the_log_runs_out() {
        let engine = engine("(a|b)[xy]");
        assert_eq!(
            engine.generate_from_log(&[0]),
            Err(RandexpError::ExhaustedReplayLog { consumed: 1 })
        );
    }

    #[test]
    fn replay_rejects_out_of_domain_values() {
        let engine = engine("a|b");
        assert!(matches!(
            engine.generate_from_log(&[2]),
            Err(RandexpError::InvalidReplayValue { value: 2, .. })
        ));
    }

    #[test]
    fn case_insensitive_literals_are_choice_points() {
        let engine = Engine::compile("ab-", "i").unwrap().with_rng(midpoint);
        let generation = engine.generate(None).unwrap();
        assert_eq!(generation.output, "AB-");
        assert_eq!(generation.decisions.as_slice(), &[1, 1]);

        assert_eq!(engine.generate_from_log(&[0, 1]).unwrap().output, "aB-");
    }

    #[test]
    fn compiles_from_regex_with_inline_flags() {
        let regex = ::regex::Regex::new("(?i)ab").unwrap();
        let engine = Engine::compile(&regex, "m").unwrap();
        assert!(engine.config().case_insensitive);
        assert!(engine.config().multiline);
        let output = engine.sample().unwrap();
        assert!(regex.is_match(&output), "{output:?}");
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(matches!(
            Engine::compile("a", "iz"),
            Err(RandexpError::InvalidFlag('z'))
        ));
    }

    #[test]
    fn repeat_cap_bounds_unbounded_repetition() {
        let highest = |_lo: usize, hi: usize| hi;
        let config = GeneratorConfig::default().with_repeat_cap(3);
        let engine = Engine::compile("a*b+", "")
            .unwrap()
            .with_config(config)
            .with_rng(highest);
        assert_eq!(engine.sample().unwrap(), "aaabbbb");
    }

    #[test]
    fn replacing_the_config_keeps_compiled_flags() {
        let engine = Engine::compile("ab", "i")
            .unwrap()
            .with_config(GeneratorConfig::default().with_repeat_cap(3));
        assert!(engine.config().case_insensitive);
        assert_eq!(engine.config().repeat_cap, 3);
        assert_eq!(engine.generate_from_log(&[1, 0]).unwrap().output, "Ab");

        let engine = Engine::compile("ab", "")
            .unwrap()
            .with_config(GeneratorConfig::default().with_case_insensitive(true));
        assert!(engine.config().case_insensitive);
    }

    #[test]
    fn alphabet_past_the_last_code_point_yields_nothing() {
        let config = GeneratorConfig::default().with_default_alphabet(CharRange::span(0x110000, 0x110005));
        let engine = Engine::compile("[^a]x", "").unwrap().with_config(config);
        let generation = engine.generate(None).unwrap();
        assert_eq!(generation.output, "x");
        assert!(generation.decisions.is_empty());
    }

    #[test]
    fn default_alphabet_bounds_classes() {
        let config = GeneratorConfig::default().with_default_alphabet(CharRange::span('0' as u32, '1' as u32));
        let engine = Engine::compile("[^x]{8}", "")
            .unwrap()
            .with_config(config)
            .with_rng(crate::config::SeededRandom::new(3));
        let output = engine.sample().unwrap();
        assert_eq!(output.len(), 8);
        assert!(output.chars().all(|c| c == '0' || c == '1'), "{output:?}");
    }

    #[test]
    fn backreference_repeats_the_capture() {
        let engine = Engine::compile(r"(\w{4})-\1", "").unwrap();
        for _ in 0..20 {
            let output = engine.sample().unwrap();
            let (left, right) = output.split_once('-').unwrap();
            assert_eq!(left, right);
        }
    }

    mod round_trip {
        use proptest::prelude::*;

        use crate::config::SeededRandom;
        use crate::generate::Engine;

        const PATTERNS: &[&str] = &[
            "(a|b)c",
            "(ab|cd)e",
            "a{3,5}",
            "^a((b|c)|(d|e))$",
            r"[a-z]{2,6}@[a-z]+\.(com|org)",
            r"(\d{1,3}\.){3}\d{1,3}",
            r"[^aeiou]*z?",
            "(?:foo|bar|baz)+qux",
            r"\w+\s\W",
            r"(x|y)+\1",
            "(?=a)b(?!c)",
        ];

        const TARGETS: &[&str] = &[
            "", "abc", "aaaa", "bc", "cde", "ad", "foo@bar.com", "1.22.3.44", "xyyx", "barbazqux",
            "AbC", "hello world!",
        ];

        const FLAGS: &[&str] = &["", "i"];

        // The regex crate has neither backreferences nor lookarounds.
        fn checkable(pattern: &str) -> bool {
            !pattern.contains(r"\1") && !pattern.contains("(?=")
        }

        proptest! {
            #[test]
            fn replay_reproduces_any_generation(
                pattern in proptest::sample::select(PATTERNS),
                target in proptest::option::of(proptest::sample::select(TARGETS)),
                flags in proptest::sample::select(FLAGS),
                seed in any::<u64>(),
            ) {
                let engine = Engine::compile(pattern, flags).unwrap().with_rng(SeededRandom::new(seed));
                let generation = engine.generate(target).unwrap();
                let replayed = engine.generate_from_log(generation.decisions.as_slice()).unwrap();
                prop_assert_eq!(&replayed.output, &generation.output);
                prop_assert_eq!(&replayed.decisions, &generation.decisions);
            }

            #[test]
            fn generated_strings_match_the_pattern(
                pattern in proptest::sample::select(PATTERNS),
                target in proptest::option::of(proptest::sample::select(TARGETS)),
                flags in proptest::sample::select(FLAGS),
                seed in any::<u64>(),
            ) {
                prop_assume!(checkable(pattern));
                let engine = Engine::compile(pattern, flags).unwrap().with_rng(SeededRandom::new(seed));
                let output = engine.generate(target).unwrap().output;
                let prefix = if flags.is_empty() { "" } else { "(?i)" };
                let checker = ::regex::Regex::new(&format!("{prefix}^(?:{pattern})$")).unwrap();
                prop_assert!(checker.is_match(&output), "{:?} does not match {:?}", output, pattern);
            }
        }
    }
}
