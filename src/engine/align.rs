//! Token alignment.
//!
//! `SequenceMatcher` implements the greedy longest-matching-block diff:
//! find the longest common contiguous block, recurse on what lies to its
//! left and right, then turn the matching blocks into opcodes. A gap that
//! is non-empty on both sides becomes one `Replace` span.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Hypothesis sequences at least this long get the popular-element heuristic.
const POPULAR_MIN_LEN: usize = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
  Equal,
  Insert,
  Delete,
  Replace,
}

/// One contiguous alignment region. Ranges are half-open indices into the
/// reference and hypothesis token sequences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSpan {
  pub kind: EditKind,
  pub ref_range: Range<usize>,
  pub hyp_range: Range<usize>,
}

impl EditSpan {
  fn new(kind: EditKind, i1: usize, i2: usize, j1: usize, j2: usize) -> Self {
    Self { kind, ref_range: i1..i2, hyp_range: j1..j2 }
  }

  pub fn ref_len(&self) -> usize { self.ref_range.len() }
  pub fn hyp_len(&self) -> usize { self.hyp_range.len() }
}

/// `a[a..a+size] == b[b..b+size]`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
  pub a: usize,
  pub b: usize,
  pub size: usize,
}

pub struct SequenceMatcher<'a, T> {
  a: &'a [T],
  b: &'a [T],
  /// Positions of each element in `b`, ascending. Popular elements are absent.
  b2j: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
  pub fn new(a: &'a [T], b: &'a [T]) -> Self {
    let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
    for (j, elt) in b.iter().enumerate() {
      b2j.entry(elt).or_default().push(j);
    }
    if b.len() >= POPULAR_MIN_LEN {
      let limit = b.len() / 100 + 1;
      b2j.retain(|_, positions| positions.len() <= limit);
    }
    Self { a, b, b2j }
  }

  /// Longest block common to `a[alo..ahi]` and `b[blo..bhi]`.
  ///
  /// Among equally long blocks the one starting earliest in `a` wins, and
  /// among those the one starting earliest in `b`. A zero-size match is
  /// returned as `(alo, blo, 0)`.
  pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

    // run length of the match ending at (i-1, j), keyed by j
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
      let mut next: HashMap<usize, usize> = HashMap::new();
      if let Some(positions) = self.b2j.get(&self.a[i]) {
        for &j in positions {
          if j < blo { continue; }
          if j >= bhi { break; }
          let prev = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0);
          let k = prev + 1;
          next.insert(j, k);
          if k > best_size {
            best_i = i + 1 - k;
            best_j = j + 1 - k;
            best_size = k;
          }
        }
      }
      j2len = next;
    }

    // Popular elements never seed a match but may still extend one.
    while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
      best_i -= 1;
      best_j -= 1;
      best_size += 1;
    }
    while best_i + best_size < ahi
      && best_j + best_size < bhi
      && self.a[best_i + best_size] == self.b[best_j + best_size]
    {
      best_size += 1;
    }

    Match { a: best_i, b: best_j, size: best_size }
  }

  /// Non-adjacent matching blocks in order, terminated by `(len_a, len_b, 0)`.
  pub fn matching_blocks(&self) -> Vec<Match> {
    let (la, lb) = (self.a.len(), self.b.len());
    let mut queue = vec![(0, la, 0, lb)];
    let mut blocks = Vec::new();

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
      let m = self.find_longest_match(alo, ahi, blo, bhi);
      if m.size == 0 { continue; }
      blocks.push(m);
      if alo < m.a && blo < m.b {
        queue.push((alo, m.a, blo, m.b));
      }
      if m.a + m.size < ahi && m.b + m.size < bhi {
        queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
      }
    }
    blocks.sort_by_key(|m| (m.a, m.b, m.size));

    let mut collapsed = Vec::with_capacity(blocks.len() + 1);
    let mut cur = Match { a: 0, b: 0, size: 0 };
    for m in blocks {
      if cur.a + cur.size == m.a && cur.b + cur.size == m.b {
        cur.size += m.size;
      } else {
        if cur.size > 0 { collapsed.push(cur); }
        cur = m;
      }
    }
    if cur.size > 0 { collapsed.push(cur); }
    collapsed.push(Match { a: la, b: lb, size: 0 });
    collapsed
  }

  /// Edit spans turning `a` into `b`. Empty when both sides are empty.
  pub fn opcodes(&self) -> Vec<EditSpan> {
    let (mut i, mut j) = (0, 0);
    let mut spans = Vec::new();
    for m in self.matching_blocks() {
      let kind = match (i < m.a, j < m.b) {
        (true, true) => Some(EditKind::Replace),
        (true, false) => Some(EditKind::Delete),
        (false, true) => Some(EditKind::Insert),
        (false, false) => None,
      };
      if let Some(kind) = kind {
        spans.push(EditSpan::new(kind, i, m.a, j, m.b));
      }
      i = m.a + m.size;
      j = m.b + m.size;
      if m.size > 0 {
        spans.push(EditSpan::new(EditKind::Equal, m.a, i, m.b, j));
      }
    }
    spans
  }

  /// `2 * matched / (len_a + len_b)`, 1.0 when both sequences are empty.
  pub fn ratio(&self) -> f64 {
    let total = self.a.len() + self.b.len();
    if total == 0 {
      return 1.0;
    }
    let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
    2.0 * matched as f64 / total as f64
  }
}

/// Align reference tokens against hypothesis tokens.
pub fn align<T: Eq + Hash>(reference: &[T], hypothesis: &[T]) -> Vec<EditSpan> {
  SequenceMatcher::new(reference, hypothesis).opcodes()
}
