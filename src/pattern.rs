//! The core pattern node.
//!
//! A [`Pattern`] pairs a structural [`Kind`] with its rendered regex
//! fragment. Rendering happens exactly once, at construction, and the cached
//! text doubles as the node's identity: equality and hashing compare rendered
//! forms. That works because rendering is canonical (alternation members are
//! sorted before joining, and concatenation construction fully merges its
//! boundaries), so two nodes that render identically accept the same
//! language under the rules this crate maintains.
//!
//! Merging lives elsewhere: `|` dispatches through [`crate::merge`], `+`
//! through [`crate::concat`]. This module only knows how to build and render
//! nodes.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitOr, Mul};

use regex::Regex;

use crate::chars::{CharKind, ClassKind};
use crate::extension::ExtKind;
use crate::quantify::Interval;
use crate::{Error, Result, chars, concat, merge, oracle};

/// Characters that must be escaped to appear in a fragment without their
/// special meanings. Mirrors what [`Pattern::escape`] rewrites.
pub const ESCAPED_CHARACTERS: &str = "()[]{}?*+-|^$\\.&~#";

/// An immutable regular-expression fragment.
///
/// Constructed through the associated functions below (or the extension
/// constructors in `extension.rs`), combined with `|` and `+`, and rendered
/// with [`Display`](fmt::Display) / [`Pattern::as_str`].
#[derive(Debug, Clone)]
pub struct Pattern {
    repr: String,
    kind: Kind,
}

/// Structural shape of a node. The engine dispatches merge rules on this;
/// everything else goes through the rendered form.
#[derive(Debug, Clone)]
pub(crate) enum Kind {
    /// An arbitrary textual fragment; the rendered form *is* the payload.
    Lit,
    /// A fragment guaranteed to consume exactly one input character
    /// (anchors excepted; they ride along as special classes).
    Char(CharKind),
    /// Unordered alternation. Invariants: at least two members, members are
    /// deduplicated, sorted by rendered form, and never themselves `Or`.
    Or(Vec<Pattern>),
    /// An occurrence quantifier: `inner` repeated `span` times.
    Occur { inner: Box<Pattern>, span: Interval, greedy: bool },
    /// Ordered concatenation. Invariants: at least two elements, no two
    /// adjacent elements mergeable, elements never themselves `Seq`.
    Seq(Vec<Pattern>),
    /// Opaque extension templating; never merged.
    Ext(ExtKind),
}

impl Pattern {
    /// Builds a node from a kind whose rendering is derived structurally.
    /// `Lit` and `Ext` carry their own text and go through [`Self::with_repr`].
    pub(crate) fn from_kind(kind: Kind) -> Pattern {
        let repr = render(&kind);
        Pattern { repr, kind }
    }

    pub(crate) fn with_repr(repr: String, kind: Kind) -> Pattern {
        Pattern { repr, kind }
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.kind
    }

    /// The rendered regex fragment.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    // --- Leaf constructors --------------------------------------------------

    /// Wraps an arbitrary textual fragment verbatim. No validation happens
    /// here; a malformed fragment surfaces later as a generation or compile
    /// failure carrying this text.
    pub fn literal(text: impl Into<String>) -> Pattern {
        Pattern::with_repr(text.into(), Kind::Lit)
    }

    /// Escapes every special character in `text` and wraps the result.
    pub fn escape(text: &str) -> Pattern {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if ESCAPED_CHARACTERS.contains(c) {
                out.push('\\');
            }
            out.push(c);
        }
        Pattern::literal(out)
    }

    /// Matches exactly the character `c`.
    pub fn single(c: char) -> Pattern {
        Pattern::from_kind(Kind::Char(CharKind::Single(c)))
    }

    /// Matches any character between `lo` and `hi` inclusive, in code-point
    /// order. A reversed range is accepted verbatim; the engine does not
    /// second-guess what the host engine makes of `[r-q]`.
    pub fn range(lo: char, hi: char) -> Pattern {
        Pattern::from_kind(Kind::Char(CharKind::Range(lo, hi)))
    }

    /// Matches any single character from `members`.
    pub fn set(members: impl IntoIterator<Item = char>) -> Pattern {
        let members: BTreeSet<char> = members.into_iter().collect();
        Pattern::from_kind(Kind::Char(CharKind::Set(members.into_iter().collect())))
    }

    /// Matches any single character *not* in `members`.
    pub fn not_set(members: impl IntoIterator<Item = char>) -> Pattern {
        let members: BTreeSet<char> = members.into_iter().collect();
        Pattern::from_kind(Kind::Char(CharKind::NotSet(members.into_iter().collect())))
    }

    pub(crate) fn class(kind: ClassKind) -> Pattern {
        Pattern::from_kind(Kind::Char(CharKind::Class(kind)))
    }

    // --- Compound constructors ---------------------------------------------

    /// Plain alternation over `members` (no merging; use `|` for that).
    /// A single member collapses to itself; zero members is invalid input.
    pub fn any_of(members: impl IntoIterator<Item = Pattern>) -> Result<Pattern> {
        let members: Vec<Pattern> = members.into_iter().collect();
        if members.is_empty() {
            return Err(Error::invalid("alternation requires at least one member"));
        }
        Ok(merge::or_from(members))
    }

    /// Concatenation sequence over `elements`, left to right, fully
    /// normalizing each boundary as it folds. Fewer than two elements is
    /// invalid input.
    pub fn sequence(elements: impl IntoIterator<Item = Pattern>) -> Result<Pattern> {
        let mut elements = elements.into_iter();
        let (Some(first), Some(second)) = (elements.next(), elements.next()) else {
            return Err(Error::invalid("concatenation sequence requires at least two patterns"));
        };
        let mut out = concat::concat(&first, &second);
        for next in elements {
            out = concat::concat(&out, &next);
        }
        Ok(out)
    }

    /// Folds any number of patterns together with `+`. An empty iterator
    /// yields the empty fragment.
    pub fn join(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
        patterns.into_iter().fold(Pattern::literal(""), |acc, p| concat::concat(&acc, &p))
    }

    /// Matches `inner` zero or one times (`?`).
    pub fn optional(inner: Pattern) -> Pattern {
        crate::quantify::occur(inner, Interval::new(0, Some(1)), true)
    }

    /// Matches `inner` one or more times (`+`), or zero or more (`*`) when
    /// `match_zero` is set.
    pub fn multi(inner: Pattern, match_zero: bool) -> Pattern {
        crate::quantify::occur(inner, Interval::new(if match_zero { 0 } else { 1 }, None), true)
    }

    /// Matches `inner` exactly `n` times (`{n}`).
    pub fn exactly(inner: Pattern, n: u32) -> Pattern {
        crate::quantify::occur(inner, Interval::new(n, Some(n)), true)
    }

    /// Matches `inner` between `low` and `high` times inclusive (`{i,j}`).
    pub fn between(inner: Pattern, low: u32, high: u32) -> Pattern {
        crate::quantify::occur(inner, Interval::new(low, Some(high)), true)
    }

    /// Matches `inner` at least `low` times (`{i,}`).
    pub fn at_least(inner: Pattern, low: u32) -> Pattern {
        crate::quantify::occur(inner, Interval::new(low, None), true)
    }

    /// Re-renders a quantifier as non-greedy (trailing `?`). Invalid input
    /// on anything that is not an occurrence quantifier.
    pub fn lazy(self) -> Result<Pattern> {
        match self.kind {
            Kind::Occur { inner, span, .. } => {
                Ok(Pattern::from_kind(Kind::Occur { inner, span, greedy: false }))
            }
            _ => Err(Error::invalid(format!("`{}` is not an occurrence quantifier", self.repr))),
        }
    }

    // --- Engine entry points -----------------------------------------------

    /// Union with `other`, simplified. Equivalent to `self | other`.
    pub fn union(&self, other: &Pattern) -> Result<Pattern> {
        merge::union(self, other)
    }

    /// Concatenation with `other`, normalized. Equivalent to `self + other`.
    pub fn concat(&self, other: &Pattern) -> Pattern {
        concat::concat(self, other)
    }

    /// Finite, deduplicated set of strings this fragment fully matches,
    /// enumerated over the oracle's fixed alphabet. Unbounded repetitions
    /// are capped at [`crate::REPEAT_SAMPLE_LIMIT`] extra repetitions.
    pub fn examples(&self) -> Result<BTreeSet<String>> {
        oracle::examples(self)
    }

    /// Whether every example of `self` fully matches `other`.
    pub fn is_subset_of(&self, other: &Pattern) -> Result<bool> {
        oracle::is_subset(self, other)
    }

    /// Ranks two quantifiers over the same inner pattern by how few
    /// occurrences they require. Comparing quantifiers over different inner
    /// patterns is invalid input: the question is meaningless across
    /// inners.
    pub fn cmp_occurrences(&self, other: &Pattern) -> Result<std::cmp::Ordering> {
        crate::quantify::occurrence_cmp(self, other)
    }

    /// Hands the rendered fragment to the host engine.
    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&self.repr).map_err(|e| Error::generation(&self.repr, e))
    }

    /// Whether quantifying this node requires a non-capturing group.
    pub(crate) fn needs_group(&self) -> bool {
        match &self.kind {
            Kind::Char(CharKind::Class(ClassKind::LineStart | ClassKind::LineEnd)) => true,
            Kind::Char(_) => false,
            Kind::Ext(_) => false,
            Kind::Lit => self.repr.chars().count() != 1,
            Kind::Or(_) | Kind::Occur { .. } | Kind::Seq(_) => true,
        }
    }

    pub(crate) fn is_empty_literal(&self) -> bool {
        matches!(self.kind, Kind::Lit) && self.repr.is_empty()
    }
}

fn render(kind: &Kind) -> String {
    match kind {
        // Lit and Ext carry their own text and never get here.
        Kind::Lit | Kind::Ext(_) => unreachable!("literal and extension nodes render at construction"),
        Kind::Char(c) => chars::render_char(c),
        Kind::Or(members) => {
            let grouped: Vec<String> = members.iter().map(|m| format!("(?:{m})")).collect();
            grouped.join("|")
        }
        Kind::Occur { inner, span, greedy } => {
            let mut out = if inner.needs_group() {
                format!("(?:{inner})")
            } else {
                inner.repr.clone()
            };
            out.push_str(&span.suffix());
            if !greedy {
                out.push('?');
            }
            out
        }
        Kind::Seq(elements) => {
            let mut out = String::new();
            for e in elements {
                // Bare alternations would bleed into their neighbors.
                if matches!(e.kind, Kind::Or(_)) {
                    out.push_str(&format!("(?:{e})"));
                } else {
                    out.push_str(&e.repr);
                }
            }
            out
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Pattern) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr.hash(state);
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Pattern {
        Pattern::literal(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Pattern {
        Pattern::literal(text)
    }
}

impl From<char> for Pattern {
    fn from(c: char) -> Pattern {
        Pattern::single(c)
    }
}

impl From<&Regex> for Pattern {
    fn from(re: &Regex) -> Pattern {
        Pattern::literal(re.as_str())
    }
}

impl BitOr for Pattern {
    type Output = Result<Pattern>;

    fn bitor(self, rhs: Pattern) -> Result<Pattern> {
        merge::union(&self, &rhs)
    }
}

impl BitOr<Pattern> for Result<Pattern> {
    type Output = Result<Pattern>;

    fn bitor(self, rhs: Pattern) -> Result<Pattern> {
        self.and_then(|lhs| merge::union(&lhs, &rhs))
    }
}

impl Add for Pattern {
    type Output = Pattern;

    fn add(self, rhs: Pattern) -> Pattern {
        concat::concat(&self, &rhs)
    }
}

impl Add<Pattern> for Result<Pattern> {
    type Output = Result<Pattern>;

    fn add(self, rhs: Pattern) -> Result<Pattern> {
        self.map(|lhs| concat::concat(&lhs, &rhs))
    }
}

impl Mul<u32> for Pattern {
    type Output = Pattern;

    /// `p * n` is `p{n}`. A zero multiplier is a programmer error.
    fn mul(self, n: u32) -> Pattern {
        assert!(n >= 1, "pattern multiplier must be at least 1");
        if n == 1 { self } else { Pattern::exactly(self, n) }
    }
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::DIGIT;

    #[test]
    fn single_chars_escape_special_characters() {
        assert_eq!(Pattern::single('a').as_str(), "a");
        assert_eq!(Pattern::single('.').as_str(), "\\.");
        assert_eq!(Pattern::single('+').as_str(), "\\+");
    }

    #[test]
    fn escape_rewrites_every_special_character() {
        assert_eq!(Pattern::escape("a.b+c").as_str(), "a\\.b\\+c");
        assert_eq!(Pattern::escape("plain").as_str(), "plain");
    }

    #[test]
    fn equality_is_rendered_form_equality_across_kinds() {
        assert_eq!(Pattern::literal("a"), Pattern::single('a'));
        assert_eq!(Pattern::literal("[0-9]"), Pattern::range('0', '9'));
        assert_ne!(Pattern::single('a'), Pattern::single('b'));
    }

    #[test]
    fn alternation_renders_members_in_stable_sorted_order() {
        let a = Pattern::any_of([Pattern::single('b'), Pattern::single('a')]).unwrap();
        let b = Pattern::any_of([Pattern::single('a'), Pattern::single('b')]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "(?:a)|(?:b)");
    }

    #[test]
    fn any_of_collapses_single_member_and_rejects_empty() {
        let single = Pattern::any_of([Pattern::single('a')]).unwrap();
        assert_eq!(single, Pattern::single('a'));
        assert!(Pattern::any_of([]).is_err());
    }

    #[test]
    fn sequence_requires_two_elements() {
        assert!(Pattern::sequence([Pattern::single('a')]).is_err());
        assert!(Pattern::sequence([]).is_err());
        let ab = Pattern::sequence([Pattern::single('a'), Pattern::single('b')]).unwrap();
        assert_eq!(ab.as_str(), "ab");
    }

    #[test]
    fn quantifier_rendering() {
        let a = Pattern::single('a');
        assert_eq!(Pattern::optional(a.clone()).as_str(), "a?");
        assert_eq!(Pattern::multi(a.clone(), false).as_str(), "a+");
        assert_eq!(Pattern::multi(a.clone(), true).as_str(), "a*");
        assert_eq!(Pattern::exactly(a.clone(), 3).as_str(), "a{3}");
        assert_eq!(Pattern::between(a.clone(), 2, 5).as_str(), "a{2,5}");
        assert_eq!(Pattern::at_least(a.clone(), 2).as_str(), "a{2,}");
        assert_eq!(Pattern::exactly(DIGIT.clone(), 2).as_str(), "\\d{2}");
    }

    #[test]
    fn compound_inners_are_grouped_when_quantified() {
        let ab = Pattern::sequence([Pattern::single('a'), Pattern::single('b')]).unwrap();
        assert_eq!(Pattern::exactly(ab, 2).as_str(), "(?:ab){2}");
        let nested = Pattern::optional(Pattern::optional(Pattern::single('a')));
        assert_eq!(nested.as_str(), "(?:a?)?");
    }

    #[test]
    fn lazy_toggles_greediness_and_rejects_plain_nodes() {
        let lazy = Pattern::optional(Pattern::single('a')).lazy().unwrap();
        assert_eq!(lazy.as_str(), "a??");
        assert!(Pattern::single('a').lazy().is_err());
    }

    #[test]
    fn multiplying_wraps_in_an_exact_count() {
        let p = Pattern::single('a');
        assert_eq!(p.clone() * 1, p);
        assert_eq!(Pattern::single('a') * 3, Pattern::exactly(Pattern::single('a'), 3));
    }

    #[test]
    #[should_panic(expected = "multiplier")]
    fn zero_multiplier_panics() {
        let _ = Pattern::single('a') * 0;
    }

    #[test]
    fn join_folds_with_concatenation() {
        let joined =
            Pattern::join([Pattern::single('a'), Pattern::single('b'), Pattern::single('c')]);
        assert_eq!(joined.as_str(), "abc");
        assert_eq!(Pattern::join([]).as_str(), "");
    }

    #[test]
    fn compile_bridges_to_the_host_engine() {
        let re = Pattern::exactly(DIGIT.clone(), 2).compile().unwrap();
        assert!(re.is_match("42"));
        assert!(Pattern::literal("(").compile().is_err());
    }
}
