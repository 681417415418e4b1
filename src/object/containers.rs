//! Typed containers backing each value kind
//!
//! These are deliberately small: the keyspace only needs construction, a
//! length/cardinality query and read accessors. Mutating commands build a
//! new container and rebind the key.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use bytes::Bytes;

use super::Encoding;

// =============================================================================
// Encoding Thresholds
// =============================================================================

/// Longest string stored with the embedded encoding
pub const EMBSTR_MAX_LEN: usize = 44;

/// Max entries for an aggregate to keep its compact encoding
pub const COMPACT_MAX_ENTRIES: usize = 128;

/// Max element size (bytes) for an aggregate to keep its compact encoding
pub const COMPACT_MAX_VALUE: usize = 64;

/// Max members for an all-integer set to use the intset encoding
pub const INTSET_MAX_ENTRIES: usize = 512;

/// Capability surface shared by every container
pub trait Container {
    /// Length in bytes (strings) or cardinality (aggregates)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Representation hint reported by OBJECT ENCODING-style diagnostics
    fn encoding(&self) -> Encoding;
}

fn is_compact<'a>(len: usize, mut elements: impl Iterator<Item = &'a Bytes>) -> bool {
    len <= COMPACT_MAX_ENTRIES && elements.all(|e| e.len() <= COMPACT_MAX_VALUE)
}

fn parse_i64(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

/// Resolve Redis-style `[start, stop]` indexes (negative counts from the
/// tail) into a half-open range, or None when it selects nothing.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize + 1))
}

// =============================================================================
// String
// =============================================================================

/// Binary-safe string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue(Bytes);

impl StringValue {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// Interpret as a base-10 integer, if it is one
    pub fn as_i64(&self) -> Option<i64> {
        parse_i64(&self.0)
    }
}

impl Container for StringValue {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn encoding(&self) -> Encoding {
        if self.as_i64().is_some() {
            Encoding::Int
        } else if self.0.len() <= EMBSTR_MAX_LEN {
            Encoding::Embstr
        } else {
            Encoding::Raw
        }
    }
}

// =============================================================================
// List
// =============================================================================

/// Ordered list of elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListValue(VecDeque<Bytes>);

impl ListValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element at `index`; negative indexes count from the tail
    pub fn index(&self, index: i64) -> Option<&Bytes> {
        let len = self.0.len() as i64;
        let index = if index < 0 { len + index } else { index };
        if index < 0 {
            return None;
        }
        self.0.get(index as usize)
    }

    /// Elements in `[start, stop]`, both inclusive
    pub fn range(&self, start: i64, stop: i64) -> Vec<&Bytes> {
        match resolve_range(self.0.len(), start, stop) {
            Some((from, to)) => self.0.range(from..to).collect(),
            None => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.0.iter()
    }
}

impl<B: Into<Bytes>> FromIterator<B> for ListValue {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Container for ListValue {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn encoding(&self) -> Encoding {
        if is_compact(self.0.len(), self.0.iter()) {
            Encoding::Listpack
        } else {
            Encoding::Quicklist
        }
    }
}

// =============================================================================
// Set
// =============================================================================

/// Unordered set of unique members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetValue(HashSet<Bytes>);

impl SetValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.0.contains(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.0.iter()
    }
}

impl<B: Into<Bytes>> FromIterator<B> for SetValue {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Container for SetValue {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn encoding(&self) -> Encoding {
        if self.0.len() <= INTSET_MAX_ENTRIES && self.0.iter().all(|m| parse_i64(m).is_some()) {
            Encoding::Intset
        } else if is_compact(self.0.len(), self.0.iter()) {
            Encoding::Listpack
        } else {
            Encoding::Hashtable
        }
    }
}

// =============================================================================
// Sorted Set
// =============================================================================

/// Members with a score, ordered by `(score, member)`
///
/// NaN scores are dropped at construction; every stored score is
/// therefore totally ordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSetValue {
    /// Kept sorted by `(score, member)` at all times
    ordered: Vec<(f64, Bytes)>,
    scores: HashMap<Bytes, f64>,
}

fn by_score_then_member(a: &(f64, Bytes), b: &(f64, Bytes)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

impl SortedSetValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(member, score)` pairs; a repeated member keeps its last score
    pub fn from_pairs<B: Into<Bytes>>(pairs: impl IntoIterator<Item = (B, f64)>) -> Self {
        let mut scores = HashMap::new();
        for (member, score) in pairs {
            if score.is_nan() {
                continue;
            }
            scores.insert(member.into(), score);
        }

        let mut ordered: Vec<(f64, Bytes)> = scores
            .iter()
            .map(|(member, score)| (*score, member.clone()))
            .collect();
        ordered.sort_by(by_score_then_member);

        Self { ordered, scores }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// 0-based position, lowest score first
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        let probe = (score, Bytes::copy_from_slice(member));
        self.ordered
            .binary_search_by(|entry| by_score_then_member(entry, &probe))
            .ok()
    }

    /// Members with rank in `[start, stop]`, both inclusive
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&Bytes, f64)> {
        match resolve_range(self.ordered.len(), start, stop) {
            Some((from, to)) => self.ordered[from..to]
                .iter()
                .map(|(score, member)| (member, *score))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, f64)> {
        self.ordered.iter().map(|(score, member)| (member, *score))
    }
}

impl Container for SortedSetValue {
    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn encoding(&self) -> Encoding {
        if is_compact(self.ordered.len(), self.ordered.iter().map(|(_, m)| m)) {
            Encoding::Listpack
        } else {
            Encoding::Skiplist
        }
    }
}

// =============================================================================
// Hash
// =============================================================================

/// Field → value map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashValue(HashMap<Bytes, Bytes>);

impl HashValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &[u8]) -> Option<&Bytes> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &[u8]) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Bytes)> {
        self.0.iter()
    }
}

impl<F: Into<Bytes>, V: Into<Bytes>> FromIterator<(F, V)> for HashValue {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

impl Container for HashValue {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn encoding(&self) -> Encoding {
        let compact = self.0.len() <= COMPACT_MAX_ENTRIES
            && self
                .0
                .iter()
                .all(|(f, v)| f.len() <= COMPACT_MAX_VALUE && v.len() <= COMPACT_MAX_VALUE);
        if compact {
            Encoding::Listpack
        } else {
            Encoding::Hashtable
        }
    }
}
