use crate::charset::CharRange;
use crate::config::GeneratorConfig;
use crate::regex::ast::{CharClass, ClassItem};

const SURROGATES: (u32, u32) = (0xD800, 0xDFFF);
const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Resolves character classes to the set of code points they may produce.
#[derive(Debug, Clone, Copy)]
pub struct CharacterRangeExpander<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> CharacterRangeExpander<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Expands `class`, bounded by the default alphabet.
    ///
    /// The union of the class items is intersected with the alphabet, or
    /// subtracted from it when the class is negated, so nothing outside the
    /// alphabet is ever produced.
    pub fn expand(
        &self,
        class: &CharClass,
    ) -> CharRange {
        let mut union = CharRange::new();
        for item in &class.items {
            union.add(&self.expand_item(item));
        }
        if self.config.case_insensitive {
            let folded = other_case_range(&union);
            union.add(&folded);
        }

        let mut expanded = self.config.default_alphabet.clone();
        if class.negate {
            expanded.subtract(&union);
        } else {
            expanded.intersect(&union);
        }
        // Only Unicode scalar values can be emitted as chars.
        expanded.intersect(&CharRange::span(0, MAX_CODE_POINT));
        expanded.subtract(&CharRange::span(SURROGATES.0, SURROGATES.1));
        expanded
    }

    fn expand_item(
        &self,
        item: &ClassItem,
    ) -> CharRange {
        match item {
            ClassItem::Char(c) => CharRange::single(*c as u32),
            ClassItem::Range(lo, hi) => CharRange::span(*lo as u32, *hi as u32),
            ClassItem::Class(nested) => self.expand(nested),
        }
    }
}

/// Swaps ASCII letter case; every other char is its own other case.
pub fn to_other_case(c: char) -> char {
    if c.is_ascii_lowercase() {
        c.to_ascii_uppercase()
    } else if c.is_ascii_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c
    }
}

fn other_case_range(range: &CharRange) -> CharRange {
    let mut folded = CharRange::new();
    for (from, to, shift_up) in [('a', 'z', false), ('A', 'Z', true)] {
        let mut letters = range.clone();
        letters.intersect(&CharRange::span(from as u32, to as u32));
        for (lo, hi) in letters.spans() {
            if shift_up {
                folded.add_span(lo + 32, hi + 32);
            } else {
                folded.add_span(lo - 32, hi - 32);
            }
        }
    }
    folded
}
