use std::iter::Peekable;
use std::str::CharIndices;

use crate::config::Flags;
use crate::error::{RandexpError, Result};
use crate::regex::ast::{
    Anchor, Body, CharClass, ClassItem, Group, Lookaround, Pattern, Token,
};

/// Pattern dialects the tokenizer reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Syntax {
    /// ECMAScript patterns.
    #[default]
    JavaScript,
    /// The source text of a compiled `regex::Regex`.
    Rust,
}

/// Tokenizes a JavaScript-flavoured pattern into a token tree rooted at [`Token::Root`].
pub fn parse_regex(pattern: &str) -> Result<Pattern> {
    parse_with_syntax(pattern, Syntax::JavaScript)
}

/// Tokenizes `pattern` as written in `syntax`.
///
/// Constructs whose meaning differs between the dialects are either read the
/// dialect's way or rejected with [`RandexpError::UnsupportedSyntax`], never
/// guessed at.
pub fn parse_with_syntax(
    pattern: &str,
    syntax: Syntax,
) -> Result<Pattern> {
    let mut parser = Parser::new(pattern, syntax);
    let inline_flags = parser.parse_inline_flags()?;
    let body = parser.parse_body(false)?;
    Ok(Pattern {
        root: Token::Root(Group {
            body,
            capture: None,
            lookaround: None,
        }),
        group_count: parser.group_counter,
        inline_flags,
    })
}

/// Result of an escape that may stand either for one char or for a whole class.
enum Escaped {
    Char(char),
    Class(CharClass),
}

struct Parser<'a> {
    source: &'a str,
    syntax: Syntax,
    chars: Peekable<CharIndices<'a>>,
    group_counter: usize,
}

impl<'a> Parser<'a> {
    fn new(
        source: &'a str,
        syntax: Syntax,
    ) -> Self {
        Self {
            source,
            syntax,
            chars: source.char_indices().peekable(),
            group_counter: 0,
        }
    }

    fn invalid<T>(
        &self,
        offset: usize,
        reason: &str,
    ) -> Result<T> {
        Err(RandexpError::InvalidPattern {
            offset,
            reason: reason.to_string(),
        })
    }

    fn unsupported<T>(
        &self,
        offset: usize,
        construct: String,
    ) -> Result<T> {
        Err(RandexpError::UnsupportedSyntax { offset, construct })
    }

    // A leading (?i), (?m), (?im)... group, as regex sources carry their flags inline.
    fn parse_inline_flags(&mut self) -> Result<Flags> {
        let mut flags = Flags::default();
        let Some(rest) = self.source.strip_prefix("(?") else {
            return Ok(flags);
        };
        let letters = rest.chars().take_while(|c| "imsux".contains(*c)).count();
        if letters == 0 || !rest[letters..].starts_with(')') {
            return Ok(flags);
        }
        for c in rest[..letters].chars() {
            match c {
                'i' => flags.case_insensitive = true,
                'm' => flags.multiline = true,
                // Verbose mode makes whitespace and '#' insignificant.
                'x' => return self.unsupported(0, "(?x)".to_string()),
                _ => {}
            }
        }
        for _ in 0..letters + 3 {
            self.chars.next();
        }
        Ok(flags)
    }

    fn parse_body(
        &mut self,
        nested: bool,
    ) -> Result<Body> {
        let mut branches = Vec::new();
        let mut stack = Vec::new();

        while let Some(&(offset, c)) = self.chars.peek() {
            match c {
                ')' if nested => break,
                ')' => return self.invalid(offset, "unmatched ')'"),
                '|' => {
                    self.chars.next();
                    branches.push(std::mem::take(&mut stack));
                }
                _ => self.parse_atom(&mut stack)?,
            }
        }

        if branches.is_empty() {
            Ok(Body::Sequence(stack))
        } else {
            branches.push(stack);
            Ok(Body::Alternation(branches))
        }
    }

    fn parse_atom(
        &mut self,
        tokens: &mut Vec<Token>,
    ) -> Result<()> {
        let Some((offset, c)) = self.chars.next() else {
            return Ok(());
        };
        match c {
            '\\' => {
                let token = self.parse_escape(offset)?;
                tokens.push(token);
            }
            '^' => tokens.push(Token::Position(Anchor::Start)),
            '$' => tokens.push(Token::Position(Anchor::End)),
            '.' => tokens.push(Token::Class(any_char())),
            '[' => {
                let class = self.parse_class(offset)?;
                tokens.push(Token::Class(class));
            }
            '(' => {
                let group = self.parse_group(offset)?;
                tokens.push(group);
            }
            '*' => self.push_repetition(tokens, offset, 0, None)?,
            '+' => self.push_repetition(tokens, offset, 1, None)?,
            '?' => self.push_repetition(tokens, offset, 0, Some(1))?,
            '{' => match self.parse_braces() {
                Some((min, Some(max))) if max < min => {
                    return self.invalid(offset, "numbers out of order in {} quantifier");
                }
                Some((min, max)) => self.push_repetition(tokens, offset, min, max)?,
                // Not a quantifier, so the brace is just a character.
                None => tokens.push(Token::Literal('{')),
            },
            _ => tokens.push(Token::Literal(c)),
        }
        Ok(())
    }

    fn push_repetition(
        &mut self,
        tokens: &mut Vec<Token>,
        offset: usize,
        min: usize,
        max: Option<usize>,
    ) -> Result<()> {
        let Some(prev) = tokens.pop() else {
            return self.invalid(offset, "nothing to repeat");
        };
        if matches!(prev, Token::Position(_) | Token::Repetition { .. }) {
            return self.invalid(offset, "nothing to repeat");
        }
        // Laziness changes matching, not the language, so a trailing '?' is dropped.
        self.chars.next_if(|&(_, c)| c == '?');
        tokens.push(Token::Repetition {
            token: Box::new(prev),
            min,
            max,
        });
        Ok(())
    }

    // {n}, {n,} or {n,m}; anything else leaves the iterator untouched.
    fn parse_braces(&mut self) -> Option<(usize, Option<usize>)> {
        let mut probe = self.chars.clone();
        let min = take_number(&mut probe)?;
        let max = match probe.next()? {
            (_, '}') => Some(min),
            (_, ',') => {
                if probe.next_if(|&(_, c)| c == '}').is_some() {
                    None
                } else {
                    let max = take_number(&mut probe)?;
                    probe.next_if(|&(_, c)| c == '}')?;
                    Some(max)
                }
            }
            _ => return None,
        };
        self.chars = probe;
        Some((min, max))
    }

    fn parse_escape(
        &mut self,
        offset: usize,
    ) -> Result<Token> {
        let Some((_, c)) = self.chars.next() else {
            return self.invalid(offset, "trailing backslash");
        };
        let rust = self.syntax == Syntax::Rust;
        let token = match c {
            'b' => {
                // \b{start}, \b{end}, \b{start-half}, \b{end-half}
                if rust
                    && self.chars.next_if(|&(_, c)| c == '{').is_some()
                    && !self.chars.any(|(_, c)| c == '}')
                {
                    return self.invalid(offset, "unterminated word boundary");
                }
                Token::Position(Anchor::WordBoundary)
            }
            'B' => Token::Position(Anchor::NonWordBoundary),
            'A' if rust => Token::Position(Anchor::Start),
            'z' if rust => Token::Position(Anchor::End),
            '<' | '>' if rust => Token::Position(Anchor::WordBoundary),
            '1'..='9' if !rust => {
                let mut digits = String::from(c);
                while let Some((_, d)) = self.chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                match digits.parse() {
                    Ok(index) => Token::Reference(index),
                    Err(_) => return self.invalid(offset, "backreference out of range"),
                }
            }
            _ => match self.parse_escaped(offset, c)? {
                Escaped::Char(ch) => Token::Literal(ch),
                Escaped::Class(class) => Token::Class(class),
            },
        };
        Ok(token)
    }

    fn parse_escaped(
        &mut self,
        offset: usize,
        c: char,
    ) -> Result<Escaped> {
        if self.syntax == Syntax::Rust {
            return self.parse_rust_escaped(offset, c);
        }
        let escaped = match c {
            'd' => Escaped::Class(digits(false)),
            'D' => Escaped::Class(digits(true)),
            'w' => Escaped::Class(words(false)),
            'W' => Escaped::Class(words(true)),
            's' => Escaped::Class(whitespace(false, self.syntax)),
            'S' => Escaped::Class(whitespace(true, self.syntax)),
            'n' => Escaped::Char('\n'),
            'r' => Escaped::Char('\r'),
            't' => Escaped::Char('\t'),
            'f' => Escaped::Char('\x0c'),
            'v' => Escaped::Char('\x0b'),
            '0' => Escaped::Char('\0'),
            'x' => Escaped::Char(self.take_hex(2).unwrap_or('x')),
            'u' => Escaped::Char(self.take_hex(4).unwrap_or('u')),
            'c' => Escaped::Char(self.take_control().unwrap_or('c')),
            'p' | 'P' | 'k' => return self.unsupported(offset, format!("\\{c}")),
            _ => Escaped::Char(c),
        };
        Ok(escaped)
    }

    // Rust accepts no identity escapes for letters or digits, so any it does
    // not define are rejected rather than read as the bare character.
    fn parse_rust_escaped(
        &mut self,
        offset: usize,
        c: char,
    ) -> Result<Escaped> {
        let escaped = match c {
            'd' => Escaped::Class(digits(false)),
            'D' => Escaped::Class(digits(true)),
            'w' => Escaped::Class(words(false)),
            'W' => Escaped::Class(words(true)),
            's' => Escaped::Class(whitespace(false, self.syntax)),
            'S' => Escaped::Class(whitespace(true, self.syntax)),
            'a' => Escaped::Char('\x07'),
            'n' => Escaped::Char('\n'),
            'r' => Escaped::Char('\r'),
            't' => Escaped::Char('\t'),
            'f' => Escaped::Char('\x0c'),
            'v' => Escaped::Char('\x0b'),
            'x' | 'u' | 'U' => {
                let width = match c {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                match self.take_braced_hex().or_else(|| self.take_hex(width)) {
                    Some(ch) => Escaped::Char(ch),
                    None => return self.invalid(offset, "invalid hexadecimal escape"),
                }
            }
            c if c.is_ascii_alphanumeric() => {
                return self.unsupported(offset, format!("\\{c}"));
            }
            _ => Escaped::Char(c),
        };
        Ok(escaped)
    }

    fn take_braced_hex(&mut self) -> Option<char> {
        let mut probe = self.chars.clone();
        probe.next_if(|&(_, c)| c == '{')?;
        let mut digits = String::new();
        while let Some((_, d)) = probe.next_if(|&(_, d)| d.is_ascii_hexdigit()) {
            digits.push(d);
        }
        probe.next_if(|&(_, c)| c == '}')?;
        let ch = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
        self.chars = probe;
        Some(ch)
    }

    fn take_hex(
        &mut self,
        width: usize,
    ) -> Option<char> {
        let mut probe = self.chars.clone();
        let mut digits = String::with_capacity(width);
        for _ in 0..width {
            let (_, d) = probe.next_if(|&(_, d)| d.is_ascii_hexdigit())?;
            digits.push(d);
        }
        let ch = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)?;
        self.chars = probe;
        Some(ch)
    }

    fn take_control(&mut self) -> Option<char> {
        let (_, letter) = self.chars.next_if(|&(_, c)| c.is_ascii_alphabetic())?;
        char::from_u32(letter as u32 % 32)
    }

    fn parse_class(
        &mut self,
        open: usize,
    ) -> Result<CharClass> {
        let rust = self.syntax == Syntax::Rust;
        let negate = self.chars.next_if(|&(_, c)| c == '^').is_some();
        let mut items = Vec::new();

        // In Rust a leading ']' is a member; in JavaScript "[]" is the empty class.
        if rust && self.chars.next_if(|&(_, c)| c == ']').is_some() {
            items.push(ClassItem::Char(']'));
        }

        loop {
            let Some((offset, c)) = self.chars.next() else {
                return self.invalid(open, "unterminated character class");
            };
            if rust {
                self.reject_rust_class_syntax(offset, c)?;
            }
            let item = match c {
                ']' => break,
                '\\' => self.parse_class_escape(offset)?,
                _ => ClassItem::Char(c),
            };
            let ClassItem::Char(lo) = item else {
                items.push(item);
                continue;
            };

            // A '-' only forms a range when something other than ']' follows it.
            let mut probe = self.chars.clone();
            let is_range = matches!(probe.next(), Some((_, '-')))
                && !matches!(probe.peek(), None | Some((_, ']')))
                && !(rust && matches!(probe.peek(), Some((_, '-'))));
            if !is_range {
                items.push(item);
                continue;
            }

            self.chars.next();
            let Some((hi_offset, hi)) = self.chars.next() else {
                return self.invalid(open, "unterminated character class");
            };
            let hi_item = if hi == '\\' {
                self.parse_class_escape(hi_offset)?
            } else {
                ClassItem::Char(hi)
            };
            match hi_item {
                ClassItem::Char(hi) if hi < lo => {
                    return self.invalid(offset, "range out of order in character class");
                }
                ClassItem::Char(hi) => items.push(ClassItem::Range(lo, hi)),
                other => {
                    items.push(ClassItem::Char(lo));
                    items.push(ClassItem::Char('-'));
                    items.push(other);
                }
            }
        }

        Ok(CharClass { negate, items })
    }

    // Nested classes, POSIX classes and set operations have no JavaScript
    // counterpart and are not generated.
    fn reject_rust_class_syntax(
        &mut self,
        offset: usize,
        c: char,
    ) -> Result<()> {
        match (c, self.chars.peek().map(|&(_, next)| next)) {
            ('[', Some(':')) => self.unsupported(offset, "[[:name:]]".to_string()),
            ('[', _) => self.unsupported(offset, "nested class".to_string()),
            ('&', Some('&')) | ('-', Some('-')) | ('~', Some('~')) => {
                self.unsupported(offset, format!("{c}{c}"))
            }
            _ => Ok(()),
        }
    }

    fn parse_class_escape(
        &mut self,
        offset: usize,
    ) -> Result<ClassItem> {
        let Some((_, c)) = self.chars.next() else {
            return self.invalid(offset, "trailing backslash");
        };
        if c == 'b' {
            return Ok(ClassItem::Char('\x08'));
        }
        Ok(match self.parse_escaped(offset, c)? {
            Escaped::Char(ch) => ClassItem::Char(ch),
            Escaped::Class(class) => ClassItem::Class(class),
        })
    }

    fn parse_group(
        &mut self,
        open: usize,
    ) -> Result<Token> {
        let mut capture = None;
        let mut lookaround = None;

        let rust = self.syntax == Syntax::Rust;
        if self.chars.next_if(|&(_, c)| c == '?').is_some() {
            match self.chars.next() {
                Some((_, ':')) => {}
                Some((_, '=')) => lookaround = Some(Lookaround::FollowedBy),
                Some((_, '!')) => lookaround = Some(Lookaround::NotFollowedBy),
                Some((_, '<')) => match self.chars.peek().map(|&(_, c)| c) {
                    Some('=') => {
                        self.chars.next();
                        lookaround = Some(Lookaround::PrecededBy);
                    }
                    Some('!') => {
                        self.chars.next();
                        lookaround = Some(Lookaround::NotPrecededBy);
                    }
                    _ if rust => capture = Some(self.parse_group_name(open)?),
                    _ => return self.unsupported(open, "(?<name>".to_string()),
                },
                Some((_, 'P')) if rust && self.chars.next_if(|&(_, c)| c == '<').is_some() => {
                    capture = Some(self.parse_group_name(open)?);
                }
                Some((_, other)) => return self.unsupported(open, format!("(?{other}")),
                None => return self.invalid(open, "unterminated group"),
            }
        } else {
            self.group_counter += 1;
            capture = Some(self.group_counter);
        }

        let body = self.parse_body(true)?;
        if self.chars.next_if(|&(_, c)| c == ')').is_none() {
            return self.invalid(open, "unterminated group");
        }

        Ok(Token::Group(Group {
            body,
            capture,
            lookaround,
        }))
    }

    // Named groups are numbered like any other capture; the name is dropped.
    fn parse_group_name(
        &mut self,
        open: usize,
    ) -> Result<usize> {
        let mut name = String::new();
        while let Some((_, c)) = self.chars.next_if(|&(_, c)| c != '>') {
            name.push(c);
        }
        if name.is_empty() || self.chars.next_if(|&(_, c)| c == '>').is_none() {
            return self.invalid(open, "invalid group name");
        }
        self.group_counter += 1;
        Ok(self.group_counter)
    }
}

fn take_number(chars: &mut Peekable<CharIndices<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
        digits.push(d);
    }
    digits.parse().ok()
}

/// `.`: anything but a line terminator.
fn any_char() -> CharClass {
    CharClass {
        negate: true,
        items: vec![
            ClassItem::Char('\n'),
            ClassItem::Char('\r'),
            ClassItem::Char('\u{2028}'),
            ClassItem::Char('\u{2029}'),
        ],
    }
}

fn digits(negate: bool) -> CharClass {
    CharClass {
        negate,
        items: vec![ClassItem::Range('0', '9')],
    }
}

fn words(negate: bool) -> CharClass {
    CharClass {
        negate,
        items: vec![
            ClassItem::Char('_'),
            ClassItem::Range('a', 'z'),
            ClassItem::Range('A', 'Z'),
            ClassItem::Range('0', '9'),
        ],
    }
}

// JavaScript counts U+FEFF as whitespace, Rust counts U+0085 instead.
fn whitespace(
    negate: bool,
    syntax: Syntax,
) -> CharClass {
    let dialect = match syntax {
        Syntax::JavaScript => '\u{feff}',
        Syntax::Rust => '\u{85}',
    };
    let items = [
        '\t', '\n', '\x0b', '\x0c', '\r', ' ', '\u{a0}', '\u{1680}', '\u{2028}', '\u{2029}',
        '\u{202f}', '\u{205f}', '\u{3000}', dialect,
    ]
    .into_iter()
    .map(ClassItem::Char)
    .chain([ClassItem::Range('\u{2000}', '\u{200a}')])
    .collect();
    CharClass { negate, items }
}
