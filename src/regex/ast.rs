use crate::config::Flags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,           // ^
    End,             // $
    WordBoundary,    // \b
    NonWordBoundary, // \B
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookaround {
    FollowedBy,       // (?=...)
    NotFollowedBy,    // (?!...)
    PrecededBy,       // (?<=...)
    NotPrecededBy,    // (?<!...)
}

/// Contents of a root or group token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Sequence(Vec<Token>),
    Alternation(Vec<Vec<Token>>), // always two or more branches
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub body: Body,
    /// 1-based capture index, `None` for non-capturing groups.
    pub capture: Option<usize>,
    pub lookaround: Option<Lookaround>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Char(char),
    Range(char, char), // inclusive
    Class(CharClass),  // \d, \w, \s and their negations inside [...]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negate: bool,
    pub items: Vec<ClassItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Root(Group),
    Group(Group),
    Position(Anchor),
    Class(CharClass),
    Repetition {
        token: Box<Token>,
        min: usize,
        max: Option<usize>, // None is unbounded: {n,}, *, +
    },
    Reference(usize), // \1, \2, etc.
    Literal(char),
}

/// A tokenized pattern, ready for generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Always a [`Token::Root`].
    pub root: Token,
    pub group_count: usize,
    /// Flags from a leading `(?i)` style group.
    pub inline_flags: Flags,
}
