//! Character-level fragments and the character-class canonicalizer.
//!
//! Everything here deals with fragments that consume exactly one input
//! character: single characters, ranges, sets, negated sets, and the
//! engine's built-in special classes. The interesting part is
//! [`char_union_set`], which computes the union of two character-level
//! fragments as the smallest canonical fragment accepting exactly their
//! combined character set:
//!
//! 1. If the combined set *is* a canonical class (`.`/`\d`/`\w`/`\s`),
//!    return that class; this check wins over everything below.
//! 2. Otherwise partition the set into maximal runs of consecutive code
//!    points; runs of three or more become ranges, shorter runs are listed
//!    in a single set.
//! 3. Search sub-collections of those fragments (largest first, see
//!    [`crate::merge`]) for groups whose combined characters equal a
//!    canonical class, and substitute the class for the group.
//!
//! The two anchors ride along as special classes so the full constant table
//! from the original surface survives, but they consume no character and are
//! excluded from union merging.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

use crate::pattern::{ESCAPED_CHARACTERS, Kind, Pattern};
use crate::{merge, oracle};

/// One-character structural kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CharKind {
    Single(char),
    /// Inclusive code-point range, accepted verbatim even when reversed.
    Range(char, char),
    /// Individually listed characters.
    Set(Vec<char>),
    /// Complement of a listed set.
    NotSet(Vec<char>),
    Class(ClassKind),
}

/// The built-in special classes and anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClassKind {
    Any,
    Digit,
    Word,
    Whitespace,
    NotDigit,
    NotWord,
    NotWhitespace,
    LineStart,
    LineEnd,
}

/// Matches any character (`.`). The oracle enumerates and matches it with
/// dot-matches-newline semantics, so its accepted set is the full alphabet.
pub static ANY: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::Any));

/// Matches a decimal digit (`\d`).
pub static DIGIT: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::Digit));

/// Matches a word character (`\w`): letters, digits and the underscore.
pub static WORD: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::Word));

/// Matches a whitespace character (`\s`).
pub static WHITESPACE: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::Whitespace));

/// Matches any character that is not a decimal digit (`\D`).
pub static NOT_DIGIT: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::NotDigit));

/// Matches any character that is not a word character (`\W`).
pub static NOT_WORD: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::NotWord));

/// Matches any character that is not whitespace (`\S`).
pub static NOT_WHITESPACE: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::NotWhitespace));

/// Matches at the start of the input (`^`).
pub static ANCHOR_START: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::LineStart));

/// Matches at the end of the input (`$`).
pub static ANCHOR_END: Lazy<Pattern> = Lazy::new(|| Pattern::class(ClassKind::LineEnd));

/// The canonical classes a character union may collapse into, paired with
/// their accepted sets. Process-wide immutable table, initialized once.
static CANONICAL_CLASSES: Lazy<Vec<(Pattern, BTreeSet<char>)>> = Lazy::new(|| {
    [ClassKind::Any, ClassKind::Digit, ClassKind::Word, ClassKind::Whitespace]
        .into_iter()
        .map(|kind| (Pattern::class(kind), class_chars(kind)))
        .collect()
});

/// Accepted character set of a class, over the oracle's alphabet.
pub(crate) fn class_chars(kind: ClassKind) -> BTreeSet<char> {
    match kind {
        ClassKind::Any => oracle::alphabet().clone(),
        ClassKind::Digit => ('0'..='9').collect(),
        ClassKind::Word => ('0'..='9')
            .chain('A'..='Z')
            .chain(std::iter::once('_'))
            .chain('a'..='z')
            .collect(),
        ClassKind::Whitespace => ['\t', '\n', '\x0B', '\x0C', '\r', ' '].into_iter().collect(),
        ClassKind::NotDigit => complement(&class_chars(ClassKind::Digit)),
        ClassKind::NotWord => complement(&class_chars(ClassKind::Word)),
        ClassKind::NotWhitespace => complement(&class_chars(ClassKind::Whitespace)),
        // Anchors consume no character.
        ClassKind::LineStart | ClassKind::LineEnd => BTreeSet::new(),
    }
}

fn complement(chars: &BTreeSet<char>) -> BTreeSet<char> {
    oracle::alphabet().difference(chars).copied().collect()
}

/// Accepted character set of a character-level kind.
pub(crate) fn char_kind_set(kind: &CharKind) -> BTreeSet<char> {
    match kind {
        CharKind::Single(c) => std::iter::once(*c).collect(),
        // A reversed range yields the empty set, matching nothing.
        CharKind::Range(lo, hi) => (*lo..=*hi).collect(),
        CharKind::Set(members) => members.iter().copied().collect(),
        CharKind::NotSet(members) => {
            let members: BTreeSet<char> = members.iter().copied().collect();
            complement(&members)
        }
        CharKind::Class(class) => class_chars(*class),
    }
}

/// Whether `p` is a character-level fragment that actually consumes one
/// character (anchors are excluded from union merging).
pub(crate) fn is_char_matching(p: &Pattern) -> bool {
    match p.kind() {
        Kind::Char(CharKind::Class(ClassKind::LineStart | ClassKind::LineEnd)) => false,
        Kind::Char(_) => true,
        _ => false,
    }
}

/// Characters a fragment accepts, for the combination search. Fragments
/// that are not character-level contribute nothing.
pub(crate) fn accepted_chars(p: &Pattern) -> BTreeSet<char> {
    match p.kind() {
        Kind::Char(kind) => char_kind_set(kind),
        _ => BTreeSet::new(),
    }
}

/// The canonical class whose accepted set equals `chars` exactly, if any.
pub(crate) fn match_class(chars: &BTreeSet<char>) -> Option<Pattern> {
    CANONICAL_CLASSES
        .iter()
        .find(|(_, accepted)| accepted == chars)
        .map(|(class, _)| class.clone())
}

/// Union of two character-level fragments, canonicalized.
pub(crate) fn char_union(a: &Pattern, b: &Pattern) -> Pattern {
    let mut combined = accepted_chars(a);
    combined.extend(accepted_chars(b));
    char_union_set(combined)
}

/// Canonical fragment accepting exactly `chars`.
pub(crate) fn char_union_set(chars: BTreeSet<char>) -> Pattern {
    if let Some(class) = match_class(&chars) {
        return class;
    }
    let mut fragments: Vec<Pattern> = Vec::new();
    let mut listed: Vec<char> = Vec::new();
    for run in consecutive_runs(&chars) {
        if run.len() >= 3 {
            fragments.push(Pattern::range(run[0], run[run.len() - 1]));
        } else {
            listed.extend(run);
        }
    }
    if !listed.is_empty() {
        fragments.push(Pattern::set(listed));
    }
    if fragments.len() > 1 {
        let mapping = merge::find_class_merges(&fragments);
        fragments = merge::reduce_fragments(fragments, mapping);
    }
    match fragments.len() {
        0 => Pattern::set(chars),
        1 => fragments.pop().expect("one fragment"),
        _ => merge::or_from(fragments),
    }
}

/// Partitions a sorted character set into maximal runs of consecutive code
/// points.
pub(crate) fn consecutive_runs(chars: &BTreeSet<char>) -> Vec<Vec<char>> {
    let mut runs: Vec<Vec<char>> = Vec::new();
    for &c in chars {
        match runs.last_mut() {
            Some(run) if run.last().map(|&p| p as u32 + 1) == Some(c as u32) => run.push(c),
            _ => runs.push(vec![c]),
        }
    }
    runs
}

/// Canonical single-fragment replacement for a character-level node (or an
/// alternation of them), used to normalize quantifier inners: a set that
/// equals a canonical class becomes the class, a full consecutive run
/// becomes a range. Returns `None` when no single fragment improves on `p`.
pub(crate) fn canonical_char(p: &Pattern) -> Option<Pattern> {
    let chars = match p.kind() {
        Kind::Char(_) if is_char_matching(p) => accepted_chars(p),
        Kind::Or(members) => {
            if !members.iter().all(is_char_matching) {
                return None;
            }
            let mut combined = BTreeSet::new();
            for m in members {
                combined.extend(accepted_chars(m));
            }
            combined
        }
        _ => return None,
    };
    if chars.is_empty() {
        return None;
    }
    let collapsed = collapse(&chars)?;
    if &collapsed == p { None } else { Some(collapsed) }
}

fn collapse(chars: &BTreeSet<char>) -> Option<Pattern> {
    if let Some(class) = match_class(chars) {
        return Some(class);
    }
    if chars.len() == 1 {
        return chars.iter().next().copied().map(Pattern::single);
    }
    let runs = consecutive_runs(chars);
    if runs.len() == 1 && runs[0].len() >= 3 {
        let run = &runs[0];
        return Some(Pattern::range(run[0], run[run.len() - 1]));
    }
    if runs.iter().all(|run| run.len() <= 2) {
        return Some(Pattern::set(chars.iter().copied()));
    }
    None
}

pub(crate) fn render_char(kind: &CharKind) -> String {
    match kind {
        CharKind::Single(c) => {
            if ESCAPED_CHARACTERS.contains(*c) {
                format!("\\{c}")
            } else {
                c.to_string()
            }
        }
        CharKind::Range(lo, hi) => format!("[{}-{}]", class_escape(*lo), class_escape(*hi)),
        CharKind::Set(members) => {
            let body: String = members.iter().map(|&c| class_escape(c)).collect();
            format!("[{body}]")
        }
        CharKind::NotSet(members) => {
            let body: String = members.iter().map(|&c| class_escape(c)).collect();
            format!("[^{body}]")
        }
        CharKind::Class(class) => match class {
            ClassKind::Any => ".",
            ClassKind::Digit => "\\d",
            ClassKind::Word => "\\w",
            ClassKind::Whitespace => "\\s",
            ClassKind::NotDigit => "\\D",
            ClassKind::NotWord => "\\W",
            ClassKind::NotWhitespace => "\\S",
            ClassKind::LineStart => "^",
            ClassKind::LineEnd => "$",
        }
        .to_string(),
    }
}

/// Escapes a character for use inside `[...]`.
fn class_escape(c: char) -> String {
    match c {
        '\\' | ']' | '[' | '^' | '-' => format!("\\{c}"),
        _ => c.to_string(),
    }
}
