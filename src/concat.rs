//! The concatenation normalizer.
//!
//! Concatenating occurrences of the same inner pattern is interval
//! addition: `\d` + `\d*` requires one-plus-zero through one-plus-many
//! digits, so the result is `\d+`. The normalizer first tries to count the
//! two operands as wholes (which turns `ab + ab` into `(?:ab){2}`), then
//! flattens both sides into sequence elements and re-merges only at the
//! splice point, cascading leftward so the result is independent of how a
//! chain was grouped.
//!
//! The empty literal is the identity. Anchors and extension nodes never
//! count; `^^` stays two anchors.

use crate::pattern::{Kind, Pattern};
use crate::quantify::{Interval, occurrence_of};
use crate::chars;

pub(crate) fn concat(x: &Pattern, y: &Pattern) -> Pattern {
    if x.is_empty_literal() {
        return y.clone();
    }
    if y.is_empty_literal() {
        return x.clone();
    }
    if let Some(merged) = concat_merged(x, y) {
        return merged;
    }
    let mut elements = parts(x);
    for part in parts(y) {
        push_merged(&mut elements, part);
    }
    match elements.len() {
        1 => elements.pop().expect("one element"),
        _ => Pattern::from_kind(Kind::Seq(elements)),
    }
}

/// Two adjacent patterns counted as one quantifier, when both are
/// occurrences of the same countable inner.
fn concat_merged(a: &Pattern, b: &Pattern) -> Option<Pattern> {
    if !greedy(a) || !greedy(b) {
        return None;
    }
    let (inner_a, span_a) = occurrence_of(a);
    let (inner_b, span_b) = occurrence_of(b);
    if inner_a != inner_b || !countable(inner_a) {
        return None;
    }
    let low = span_a.low.saturating_add(span_b.low);
    let high = span_a.high.zip(span_b.high).map(|(x, y)| x.saturating_add(y));
    Some(crate::quantify::occur(inner_a.clone(), Interval::new(low, high), true))
}

/// Appends `next`, repeatedly folding it into the preceding element while
/// the boundary still merges.
fn push_merged(elements: &mut Vec<Pattern>, mut next: Pattern) {
    while let Some(last) = elements.last() {
        match concat_merged(last, &next) {
            Some(merged) => {
                elements.pop();
                next = merged;
            }
            None => break,
        }
    }
    elements.push(next);
}

fn parts(p: &Pattern) -> Vec<Pattern> {
    match p.kind() {
        Kind::Seq(elements) => elements.clone(),
        _ => vec![p.clone()],
    }
}

fn greedy(p: &Pattern) -> bool {
    match p.kind() {
        Kind::Occur { greedy, .. } => *greedy,
        _ => true,
    }
}

/// Whether repeating this inner has counting semantics. Anchors consume no
/// input and extension nodes are opaque.
fn countable(inner: &Pattern) -> bool {
    match inner.kind() {
        Kind::Ext(_) => false,
        Kind::Char(_) => chars::is_char_matching(inner),
        _ => true,
    }
}
