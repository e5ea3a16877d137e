//! Occurrence intervals and the quantifier algebra.
//!
//! Every quantifier is one node shape: an inner pattern plus an occurrence
//! [`Interval`]. `?`, `*`, `+`, `{n}`, `{i,j}` and `{i,}` are rendering
//! choices over the same model, and a plain pattern participates in the
//! algebra as an implicit `[1,1]`. Union rules, in order:
//!
//! - Same inner pattern: intervals that intersect or sit adjacent merge to
//!   their hull (`a{2,4}|a{5,7}` is `a{2,7}`). Disjoint with a gap stays an
//!   alternation, since the union is not expressible as one interval.
//! - Different inners, zero-or-one shapes (`?` against `?` or a plain
//!   pattern): the inners union and the result is optional.
//! - Different inners, identical intervals: the oracle checks containment
//!   both ways and the superset inner absorbs the other.
//! - Different inners, both unbounded above: containment again, keeping the
//!   smaller lower bound.
//!
//! Extension inners are opaque to the oracle and never containment-merge.

use std::cmp::Ordering;

use crate::pattern::{Kind, Pattern};
use crate::{Error, Result, chars, oracle};

/// An inclusive occurrence interval. `high == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    pub(crate) low: u32,
    pub(crate) high: Option<u32>,
}

impl Interval {
    /// Reversed bounds are a programmer error.
    pub(crate) fn new(low: u32, high: Option<u32>) -> Interval {
        if let Some(high) = high {
            assert!(low <= high, "occurrence interval reversed: {low} > {high}");
        }
        Interval { low, high }
    }

    /// The rendered quantifier suffix, preferring the shorthand forms.
    pub(crate) fn suffix(&self) -> String {
        match (self.low, self.high) {
            (0, Some(1)) => "?".to_string(),
            (0, None) => "*".to_string(),
            (1, None) => "+".to_string(),
            (n, Some(m)) if n == m => format!("{{{n}}}"),
            (n, None) => format!("{{{n},}}"),
            (n, Some(m)) => format!("{{{n},{m}}}"),
        }
    }

    /// Whether the two intervals intersect or sit directly adjacent, so
    /// their union is itself an interval.
    pub(crate) fn touches(&self, other: &Interval) -> bool {
        let above = |high: Option<u32>, low: u32| match high {
            None => true,
            Some(high) => low <= high.saturating_add(1),
        };
        above(self.high, other.low) && above(other.high, self.low)
    }

    /// Smallest interval containing both. Only meaningful when they touch.
    pub(crate) fn hull(&self, other: &Interval) -> Interval {
        let high = self.high.zip(other.high).map(|(a, b)| a.max(b));
        Interval::new(self.low.min(other.low), high)
    }
}

/// Builds a quantifier node, first normalizing the inner pattern: a
/// character set that is really a canonical class or a contiguous range
/// quantifies as that smaller form.
pub(crate) fn occur(inner: Pattern, span: Interval, greedy: bool) -> Pattern {
    let inner = chars::canonical_char(&inner).unwrap_or(inner);
    Pattern::from_kind(Kind::Occur { inner: Box::new(inner), span, greedy })
}

/// A pattern viewed as occurrences of an inner pattern. Plain patterns
/// occur exactly once.
pub(crate) fn occurrence_of(p: &Pattern) -> (&Pattern, Interval) {
    match p.kind() {
        Kind::Occur { inner, span, .. } => (inner.as_ref(), *span),
        _ => (p, Interval::new(1, Some(1))),
    }
}

fn is_greedy(p: &Pattern) -> bool {
    match p.kind() {
        Kind::Occur { greedy, .. } => *greedy,
        _ => true,
    }
}

const OPTIONAL: Interval = Interval { low: 0, high: Some(1) };
const ONCE: Interval = Interval { low: 1, high: Some(1) };

/// Union of two patterns where at least one is a quantifier. `Ok(None)`
/// means no single-node merge exists and the caller should alternate.
pub(crate) fn union_merged(a: &Pattern, b: &Pattern) -> Result<Option<Pattern>> {
    // Laziness changes the matched text, not the language, but merging a
    // lazy quantifier would silently discard the flag.
    if !is_greedy(a) || !is_greedy(b) {
        return Ok(None);
    }
    let (inner_a, span_a) = occurrence_of(a);
    let (inner_b, span_b) = occurrence_of(b);

    if inner_a == inner_b {
        if span_a.touches(&span_b) {
            return Ok(Some(occur(inner_a.clone(), span_a.hull(&span_b), true)));
        }
        return Ok(None);
    }

    // Containment questions below go through the oracle, which cannot see
    // into extension nodes.
    if matches!(inner_a.kind(), Kind::Ext(_)) || matches!(inner_b.kind(), Kind::Ext(_)) {
        return Ok(None);
    }

    let zero_or_one =
        |s: Interval| s == OPTIONAL || s == ONCE;
    if (span_a == OPTIONAL || span_b == OPTIONAL) && zero_or_one(span_a) && zero_or_one(span_b) {
        return Ok(Some(Pattern::optional(crate::merge::union(inner_a, inner_b)?)));
    }

    if span_a == span_b {
        if oracle::is_subset(inner_a, inner_b)? {
            return Ok(Some(occur(inner_b.clone(), span_b, true)));
        }
        if oracle::is_subset(inner_b, inner_a)? {
            return Ok(Some(occur(inner_a.clone(), span_a, true)));
        }
        // A count-of-one quantifier over a union of inners beats an
        // alternation of two count-of-one quantifiers.
        if span_a == ONCE {
            return Ok(Some(occur(crate::merge::union(inner_a, inner_b)?, ONCE, true)));
        }
        return Ok(None);
    }

    if span_a.high.is_none() && span_b.high.is_none() {
        let low = span_a.low.min(span_b.low);
        if oracle::is_subset(inner_a, inner_b)? {
            return Ok(Some(occur(inner_b.clone(), Interval::new(low, None), true)));
        }
        if oracle::is_subset(inner_b, inner_a)? {
            return Ok(Some(occur(inner_a.clone(), Interval::new(low, None), true)));
        }
    }

    Ok(None)
}

/// Sort key ranking quantifiers from fewest to most required occurrences:
/// optional shapes first, then counted amounts, then the open repetitions.
/// Within a shape, lower bound first, bounded before unbounded.
pub(crate) fn rank(span: &Interval) -> (u8, u32, u8, u32) {
    let shape = match (span.low, span.high) {
        (0, Some(1)) => 0,
        (0 | 1, None) => 2,
        _ => 1,
    };
    (shape, span.low, u8::from(span.high.is_none()), span.high.unwrap_or(0))
}

/// Ranks two quantifiers over the same inner pattern. Different inners (or
/// non-quantifiers) are invalid input.
pub(crate) fn occurrence_cmp(a: &Pattern, b: &Pattern) -> Result<Ordering> {
    let (Kind::Occur { inner: inner_a, span: span_a, .. }, Kind::Occur { inner: inner_b, span: span_b, .. }) =
        (a.kind(), b.kind())
    else {
        return Err(Error::invalid(format!(
            "occurrence comparison requires two quantifiers, got `{a}` and `{b}`"
        )));
    };
    if inner_a != inner_b {
        return Err(Error::invalid(format!(
            "occurrence comparison across different inner patterns: `{inner_a}` vs `{inner_b}`"
        )));
    }
    Ok(rank(span_a).cmp(&rank(span_b)))
}
