//! Sorted set storage
//!
//! Member -> score map; ordered views are built on demand. Ordering is by
//! score ascending, ties broken by member bytes.

use crate::error::{CacheError, Result};
use crate::protocol::parse_float;
use bytes::Bytes;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Score-ordered set of unique members
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    scores: HashMap<Bytes, f64>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score of a member
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Insert or update a member, returning its previous score
    pub fn insert(&mut self, member: Bytes, score: f64) -> Option<f64> {
        self.scores.insert(member, score)
    }

    /// Remove a member, returning its score
    pub fn remove(&mut self, member: &[u8]) -> Option<f64> {
        self.scores.remove(member)
    }

    /// Unordered iteration over (member, score)
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.scores.iter().map(|(m, s)| (m, *s))
    }

    /// All (member, score) pairs in ascending order
    pub fn sorted(&self) -> Vec<(Bytes, f64)> {
        let mut pairs: Vec<(Bytes, f64)> =
            self.scores.iter().map(|(m, s)| (m.clone(), *s)).collect();
        pairs.sort_by(|(m1, s1), (m2, s2)| cmp_score_member(*s1, m1, *s2, m2));
        pairs
    }

    /// Zero-based ascending rank of a member
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        Some(
            self.scores
                .iter()
                .filter(|(m, s)| cmp_score_member(**s, m, score, member) == Ordering::Less)
                .count(),
        )
    }

    /// Members whose score lies within `range`, ascending
    pub fn range_by_score(&self, range: &ScoreRange) -> Vec<(Bytes, f64)> {
        self.sorted()
            .into_iter()
            .filter(|(_, s)| range.contains(*s))
            .collect()
    }

    /// Members within a lexicographic range, ascending
    pub fn range_by_lex(&self, range: &LexRange) -> Vec<(Bytes, f64)> {
        self.sorted()
            .into_iter()
            .filter(|(m, _)| range.contains(m))
            .collect()
    }

    pub fn memory_usage(&self) -> usize {
        self.scores.keys().map(|m| m.len() + 8).sum::<usize>()
            + std::mem::size_of::<HashMap<Bytes, f64>>()
    }
}

/// Compare (score, member) pairs in sorted set order
fn cmp_score_member(s1: f64, m1: &[u8], s2: f64, m2: &[u8]) -> Ordering {
    s1.total_cmp(&s2).then_with(|| m1.cmp(m2))
}

/// One end of a score interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBound {
    pub value: f64,
    pub exclusive: bool,
}

impl ScoreBound {
    /// Parse `1.5`, `(1.5`, `-inf` or `+inf`
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let (exclusive, digits) = match raw.first() {
            Some(b'(') => (true, &raw[1..]),
            _ => (false, raw),
        };
        let value = parse_float(digits).ok_or(CacheError::NotAFloat)?;
        Ok(ScoreBound { value, exclusive })
    }
}

/// Closed, open or half-open score interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl ScoreRange {
    pub fn parse(min: &[u8], max: &[u8]) -> Result<Self> {
        Ok(ScoreRange {
            min: ScoreBound::parse(min)?,
            max: ScoreBound::parse(max)?,
        })
    }

    pub fn contains(&self, score: f64) -> bool {
        let above = if self.min.exclusive {
            score > self.min.value
        } else {
            score >= self.min.value
        };
        let below = if self.max.exclusive {
            score < self.max.value
        } else {
            score <= self.max.value
        };
        above && below
    }
}

/// One end of a lexicographic interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexBound {
    NegInf,
    PosInf,
    Inclusive(Bytes),
    Exclusive(Bytes),
}

impl LexBound {
    /// Parse `-`, `+`, `[member` or `(member`
    pub fn parse(raw: &Bytes) -> Result<Self> {
        match raw.first() {
            Some(b'-') if raw.len() == 1 => Ok(LexBound::NegInf),
            Some(b'+') if raw.len() == 1 => Ok(LexBound::PosInf),
            Some(b'[') => Ok(LexBound::Inclusive(raw.slice(1..))),
            Some(b'(') => Ok(LexBound::Exclusive(raw.slice(1..))),
            _ => Err(CacheError::syntax("min or max not valid string range item")),
        }
    }
}

/// Lexicographic member interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexRange {
    pub min: LexBound,
    pub max: LexBound,
}

impl LexRange {
    pub fn parse(min: &Bytes, max: &Bytes) -> Result<Self> {
        Ok(LexRange {
            min: LexBound::parse(min)?,
            max: LexBound::parse(max)?,
        })
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        let above = match &self.min {
            LexBound::NegInf => true,
            LexBound::PosInf => false,
            LexBound::Inclusive(b) => member >= &b[..],
            LexBound::Exclusive(b) => member > &b[..],
        };
        let below = match &self.max {
            LexBound::NegInf => false,
            LexBound::PosInf => true,
            LexBound::Inclusive(b) => member <= &b[..],
            LexBound::Exclusive(b) => member < &b[..],
        };
        above && below
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SortedSet {
        let mut zset = SortedSet::new();
        zset.insert(Bytes::from("b"), 2.0);
        zset.insert(Bytes::from("a"), 1.0);
        zset.insert(Bytes::from("c"), 2.0);
        zset
    }

    #[test]
    fn test_sorted_order_breaks_ties_by_member() {
        let members: Vec<Bytes> = sample().sorted().into_iter().map(|(m, _)| m).collect();
        assert_eq!(members, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
    }

    #[test]
    fn test_rank() {
        let zset = sample();
        assert_eq!(zset.rank(b"a"), Some(0));
        assert_eq!(zset.rank(b"c"), Some(2));
        assert_eq!(zset.rank(b"zz"), None);
    }

    #[test]
    fn test_score_range_exclusive() {
        let range = ScoreRange::parse(b"(1", b"+inf").unwrap();
        assert!(!range.contains(1.0));
        assert!(range.contains(1.5));
        assert!(range.contains(f64::MAX));
        assert_eq!(sample().range_by_score(&range).len(), 2);
        assert!(ScoreRange::parse(b"abc", b"1").is_err());
    }

    #[test]
    fn test_lex_range() {
        let range = LexRange::parse(&Bytes::from("[a"), &Bytes::from("(c")).unwrap();
        assert!(range.contains(b"a"));
        assert!(range.contains(b"b"));
        assert!(!range.contains(b"c"));
        assert!(LexRange::parse(&Bytes::from("a"), &Bytes::from("+")).is_err());
    }
}
