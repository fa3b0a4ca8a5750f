use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Begin/end markers for a run of seasons or episodes.
///
/// A lone `begin` is a single unit, not an open range. Both bounds are
/// inclusive and callers must keep `begin <= end` when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub begin: Option<u32>,
    pub end: Option<u32>,
}

impl Span {
    pub fn new(begin: Option<u32>, end: Option<u32>) -> Self {
        Self { begin, end }
    }

    pub fn single(unit: u32) -> Self {
        Self {
            begin: Some(unit),
            end: None,
        }
    }

    pub fn range(begin: u32, end: u32) -> Self {
        Self {
            begin: Some(begin),
            end: Some(end),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.begin.is_none()
    }

    /// Every unit covered, ascending.
    pub fn units(&self) -> Vec<u32> {
        match (self.begin, self.end) {
            (None, _) => Vec::new(),
            (Some(begin), Some(end)) => (begin..=end).collect(),
            (Some(begin), None) => vec![begin],
        }
    }

    /// `S01`, `S01-S03` style label; empty when unset.
    pub fn label(&self, prefix: char) -> String {
        match (self.begin, self.end) {
            (None, _) => String::new(),
            (Some(begin), None) => format!("{prefix}{begin:02}"),
            (Some(begin), Some(end)) => format!("{prefix}{begin:02}-{prefix}{end:02}"),
        }
    }

    /// First unit only, e.g. `S02` for `S02-S04`.
    pub fn first_label(&self, prefix: char) -> String {
        self.begin
            .map(|begin| format!("{prefix}{begin:02}"))
            .unwrap_or_default()
    }

    /// Every unit spelled out back to back: `E03E04E05`.
    pub fn items(&self, prefix: char) -> String {
        self.units()
            .into_iter()
            .map(|unit| format!("{prefix}{unit:02}"))
            .collect()
    }

    pub fn contains(&self, unit: u32) -> bool {
        match (self.begin, self.end) {
            (None, _) => false,
            (Some(begin), Some(end)) => (begin..=end).contains(&unit),
            (Some(begin), None) => unit == begin,
        }
    }

    /// True when every queried unit falls inside the span.
    pub fn contains_all(&self, units: &[u32]) -> bool {
        let covered: HashSet<u32> = self.units().into_iter().collect();
        units.iter().all(|unit| covered.contains(unit))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.begin, self.end) {
            (None, _) => Ok(()),
            (Some(begin), None) => write!(f, "{begin}"),
            (Some(begin), Some(end)) => write!(f, "{begin}-{end}"),
        }
    }
}

/// Parses `"3"` or `"3-5"`.
impl FromStr for Span {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once('-') {
            Some((begin, end)) => {
                let begin: u32 = begin.trim().parse().context("range start must be a number")?;
                let end: u32 = end.trim().parse().context("range end must be a number")?;
                if end < begin {
                    return Err(anyhow!("range end {} is before start {}", end, begin));
                }
                Ok(Span::range(begin, end))
            }
            None => Ok(Span::single(s.parse().context("expected a number or a range")?)),
        }
    }
}
