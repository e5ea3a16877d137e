//! The bounded example oracle.
//!
//! [`examples`] enumerates a finite, deduplicated set of strings a fragment
//! fully matches, over a fixed 100-character alphabet (printable ASCII plus
//! the common whitespace controls). It walks the engine's own node
//! structure where one exists and falls back to parsing the rendered text
//! for literal fragments, so a hand-written `[0-9]` literal and the
//! structural range produce the same set.
//!
//! [`is_subset`] answers containment the blunt way: every example of the
//! candidate subset must fully match the superset. Unbounded repetitions
//! are capped at [`REPEAT_SAMPLE_LIMIT`] repetitions past the lower bound,
//! which makes the check an approximation: it can only be wrong by
//! refusing a merge, never by inventing one, because callers merge solely
//! on a positive answer. Dot and full-match semantics are pinned down
//! explicitly: `.` matches newlines here, and matching is anchored on both
//! ends.
//!
//! Extension nodes are opaque except for groups (transparent wrappers) and
//! the zero-width kinds; asking for examples of a backreference or
//! conditional is an error carrying the rendered fragment.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind};

use crate::extension::ExtKind;
use crate::pattern::{Kind, Pattern};
use crate::{Error, Result, chars};

/// How many repetitions past an unbounded quantifier's lower bound the
/// oracle enumerates. Finite bounds are enumerated fully.
pub const REPEAT_SAMPLE_LIMIT: u32 = 2;

/// The enumeration alphabet: `\t`, `\n`, `\x0B`, `\x0C`, `\r` and the
/// printable ASCII range.
static ALPHABET: Lazy<BTreeSet<char>> = Lazy::new(|| {
    ['\t', '\n', '\x0B', '\x0C', '\r'].into_iter().chain(' '..='~').collect()
});

pub(crate) fn alphabet() -> &'static BTreeSet<char> {
    &ALPHABET
}

pub(crate) fn examples(p: &Pattern) -> Result<BTreeSet<String>> {
    match p.kind() {
        Kind::Lit => literal_examples(p.as_str()),
        Kind::Char(kind) => {
            // Anchors consume nothing and exemplify as the empty string.
            if chars::is_char_matching(p) {
                Ok(chars::char_kind_set(kind).into_iter().map(String::from).collect())
            } else {
                Ok(empty_string())
            }
        }
        Kind::Or(members) => {
            let mut out = BTreeSet::new();
            for m in members {
                out.extend(examples(m)?);
            }
            Ok(out)
        }
        Kind::Occur { inner, span, .. } => {
            Ok(repeat_set(&examples(inner)?, span.low, span.high))
        }
        Kind::Seq(elements) => {
            let mut out = empty_string();
            for e in elements {
                out = product(&out, &examples(e)?);
            }
            Ok(out)
        }
        Kind::Ext(ext) => match ext {
            ExtKind::Group(inner) => examples(inner),
            ExtKind::Look | ExtKind::Comment => Ok(empty_string()),
            ExtKind::Opaque => {
                Err(Error::generation(p.as_str(), "fragment is opaque to example generation"))
            }
        },
    }
}

/// Whether every example of `a` fully matches `b`.
pub(crate) fn is_subset(a: &Pattern, b: &Pattern) -> Result<bool> {
    let matcher = Regex::new(&format!(r"\A(?s:{b})\z")).map_err(|e| Error::generation(b.as_str(), e))?;
    for example in examples(a)? {
        if !matcher.is_match(&example) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn empty_string() -> BTreeSet<String> {
    std::iter::once(String::new()).collect()
}

/// Parses a textual fragment and enumerates its syntax tree.
fn literal_examples(text: &str) -> Result<BTreeSet<String>> {
    let hir = regex_syntax::ParserBuilder::new()
        .dot_matches_new_line(true)
        .build()
        .parse(text)
        .map_err(|e| Error::generation(text, e))?;
    hir_examples(&hir, text)
}

fn hir_examples(hir: &Hir, text: &str) -> Result<BTreeSet<String>> {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => Ok(empty_string()),
        HirKind::Literal(lit) => {
            let s = std::str::from_utf8(&lit.0)
                .map_err(|e| Error::generation(text, e))?
                .to_string();
            Ok(std::iter::once(s).collect())
        }
        HirKind::Class(class) => Ok(class_examples(class)),
        HirKind::Repetition(rep) => {
            let base = hir_examples(&rep.sub, text)?;
            Ok(repeat_set(&base, rep.min, rep.max))
        }
        HirKind::Capture(cap) => hir_examples(&cap.sub, text),
        HirKind::Concat(parts) => {
            let mut out = empty_string();
            for part in parts {
                out = product(&out, &hir_examples(part, text)?);
            }
            Ok(out)
        }
        HirKind::Alternation(parts) => {
            let mut out = BTreeSet::new();
            for part in parts {
                out.extend(hir_examples(part, text)?);
            }
            Ok(out)
        }
    }
}

/// Alphabet characters the parsed class accepts.
fn class_examples(class: &Class) -> BTreeSet<String> {
    let accepts = |c: char| match class {
        Class::Unicode(cls) => cls.ranges().iter().any(|r| r.start() <= c && c <= r.end()),
        Class::Bytes(cls) => {
            u8::try_from(c).is_ok_and(|b| cls.ranges().iter().any(|r| r.start() <= b && b <= r.end()))
        }
    };
    ALPHABET.iter().filter(|&&c| accepts(c)).map(|&c| String::from(c)).collect()
}

/// Concatenations of `low` through `high` picks from `base`; an unbounded
/// `high` is capped at `low + REPEAT_SAMPLE_LIMIT`.
fn repeat_set(base: &BTreeSet<String>, low: u32, high: Option<u32>) -> BTreeSet<String> {
    let high = high.unwrap_or(low + REPEAT_SAMPLE_LIMIT);
    let mut out = BTreeSet::new();
    let mut acc = empty_string();
    for n in 0..=high {
        if n >= low {
            out.extend(acc.iter().cloned());
        }
        if n < high {
            acc = product(&acc, base);
        }
    }
    out
}

fn product(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for x in a {
        for y in b {
            out.insert(format!("{x}{y}"));
        }
    }
    out
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::extension;
    use crate::{ANCHOR_END, ANY, DIGIT, WHITESPACE};

    fn strings(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn alphabet_has_a_hundred_characters() {
        assert_eq!(ALPHABET.len(), 100);
        assert!(ALPHABET.contains(&'\t'));
        assert!(ALPHABET.contains(&'~'));
        assert!(!ALPHABET.contains(&'\x7F'));
    }

    #[test]
    fn anchors_exemplify_as_the_empty_string() {
        assert_eq!(ANCHOR_END.examples().unwrap(), strings(&[""]));
    }

    #[test]
    fn digit_examples_are_the_ten_digits() {
        let expected: BTreeSet<String> = ('0'..='9').map(String::from).collect();
        assert_eq!(DIGIT.examples().unwrap(), expected);
    }

    #[test]
    fn bounded_repetition_enumerates_fully() {
        let p = Pattern::between(Pattern::single('a'), 1, 3);
        assert_eq!(p.examples().unwrap(), strings(&["a", "aa", "aaa"]));
    }

    #[test]
    fn optional_includes_the_empty_string() {
        let p = Pattern::optional(Pattern::single('a'));
        assert_eq!(p.examples().unwrap(), strings(&["", "a"]));
    }

    #[test]
    fn unbounded_repetition_is_capped_past_its_lower_bound() {
        let star = Pattern::multi(Pattern::single('a'), true);
        assert_eq!(star.examples().unwrap(), strings(&["", "a", "aa"]));
        let plus = Pattern::multi(Pattern::single('a'), false);
        assert_eq!(plus.examples().unwrap(), strings(&["a", "aa", "aaa"]));
    }

    #[test]
    fn whitespace_covers_space_and_newline() {
        let ws = WHITESPACE.examples().unwrap();
        assert!(ws.contains(" "));
        assert!(ws.contains("\n"));
        assert_eq!(ws.len(), 6);
    }

    #[test]
    fn alternation_unions_member_examples() {
        let p = Pattern::any_of([Pattern::literal("foo"), Pattern::literal("bar")]).unwrap();
        assert_eq!(p.examples().unwrap(), strings(&["foo", "bar"]));
    }

    #[test]
    fn sequences_concatenate_member_examples() {
        let p = DIGIT.clone() + Pattern::literal("x");
        let expected: BTreeSet<String> = ('0'..='9').map(|c| format!("{c}x")).collect();
        assert_eq!(p.examples().unwrap(), expected);
    }

    #[test]
    fn literal_fragments_parse_with_dot_matching_newline() {
        assert_eq!(Pattern::literal(".").examples().unwrap(), ANY.examples().unwrap());
        assert_eq!(Pattern::literal("[0-9]").examples().unwrap(), DIGIT.examples().unwrap());
        assert_eq!(Pattern::literal("ab|cd").examples().unwrap(), strings(&["ab", "cd"]));
    }

    #[test]
    fn comments_and_lookarounds_exemplify_as_empty() {
        assert_eq!(extension::comment("note").examples().unwrap(), strings(&[""]));
        let ahead = extension::if_ahead(Pattern::single('a'));
        assert_eq!(ahead.examples().unwrap(), strings(&[""]));
    }

    #[test]
    fn groups_are_transparent_wrappers() {
        let g = extension::group(Pattern::between(Pattern::single('a'), 1, 2), true);
        assert_eq!(g.examples().unwrap(), strings(&["a", "aa"]));
    }

    #[test]
    fn backreferences_are_opaque() {
        let backref = extension::numbered_reference(1);
        let err = backref.examples().unwrap_err();
        assert!(matches!(err, Error::Generation { ref pattern, .. } if pattern == "\\1"));
    }

    #[test]
    fn malformed_literals_report_generation_failures() {
        let err = Pattern::literal("(").examples().unwrap_err();
        assert!(matches!(err, Error::Generation { ref pattern, .. } if pattern == "("));
    }

    #[test]
    fn subset_checks_match_every_example_anchored() {
        assert!(DIGIT.is_subset_of(&ANY).unwrap());
        assert!(!ANY.is_subset_of(&DIGIT).unwrap());
        let aa = Pattern::exactly(Pattern::single('a'), 2);
        assert!(aa.is_subset_of(&Pattern::multi(Pattern::single('a'), false)).unwrap());
        // Anchored matching: a digit is not a subset of `\d\d`.
        assert!(!DIGIT.is_subset_of(&Pattern::literal("\\d\\d")).unwrap());
    }
}
