use std::fmt;
use std::str::FromStr;

use crate::error::RandexpError;

/// The resolved value of every choice point, in pre-order traversal order.
///
/// A log is not self-describing: it only replays against the token tree and
/// configuration that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecisionLog {
    values: Vec<usize>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        value: usize,
    ) {
        self.values.push(value);
    }

    /// Appends a placeholder to be written later with [`fill`](Self::fill).
    pub fn reserve(&mut self) -> usize {
        self.values.push(0);
        self.values.len() - 1
    }

    pub fn fill(
        &mut self,
        slot: usize,
        value: usize,
    ) {
        self.values[slot] = value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes and returns everything recorded from `at` onwards.
    pub fn split_off(
        &mut self,
        at: usize,
    ) -> Vec<usize> {
        self.values.split_off(at)
    }

    pub fn truncate(
        &mut self,
        len: usize,
    ) {
        self.values.truncate(len);
    }

    pub fn extend(
        &mut self,
        values: Vec<usize>,
    ) {
        self.values.extend(values);
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.values
    }
}

impl From<Vec<usize>> for DecisionLog {
    fn from(values: Vec<usize>) -> Self {
        Self { values }
    }
}

impl AsRef<[usize]> for DecisionLog {
    fn as_ref(&self) -> &[usize] {
        &self.values
    }
}

impl fmt::Display for DecisionLog {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(usize::to_string).collect();
        write!(f, "{}", values.join(","))
    }
}

/// Parses the comma-separated form written by `Display`, e.g. `"1,0,4"`.
impl FromStr for DecisionLog {
    type Err = RandexpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('[').trim_end_matches(']');
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        s.split(',')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .map_err(|e| RandexpError::InvalidDecisionLog(format!("{part:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::from)
    }
}
