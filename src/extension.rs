//! Extension constructors: groups, references, lookarounds, comments and
//! conditionals.
//!
//! These render engine-extension syntax by template. The engine treats them
//! as opaque at merge time (they alternate and concatenate but never
//! combine with anything), and the oracle sees through exactly three
//! shapes: groups are transparent wrappers, lookarounds and comments are
//! zero-width, everything else refuses example generation.

use std::fmt;

use crate::pattern::{Kind, Pattern};

/// How far the oracle can see into an extension node.
#[derive(Debug, Clone)]
pub(crate) enum ExtKind {
    /// A transparent wrapper around an inner pattern.
    Group(Box<Pattern>),
    /// Zero-width assertion; matches the empty string.
    Look,
    /// Zero-width annotation; matches the empty string.
    Comment,
    /// Backreferences and conditionals; no finite example set exists
    /// without knowing the groups they refer to.
    Opaque,
}

fn ext(repr: String, kind: ExtKind) -> Pattern {
    Pattern::with_repr(repr, Kind::Ext(kind))
}

/// Wraps `inner` in a group, capturing (`(...)`) or not (`(?:...)`).
pub fn group(inner: Pattern, capturing: bool) -> Pattern {
    let repr = if capturing { format!("({inner})") } else { format!("(?:{inner})") };
    ext(repr, ExtKind::Group(Box::new(inner)))
}

/// Wraps `inner` in a named capturing group (`(?P<name>...)`).
pub fn named_group(name: &str, inner: Pattern) -> Pattern {
    let repr = format!("(?P<{name}>{inner})");
    ext(repr, ExtKind::Group(Box::new(inner)))
}

/// Matches whatever the named group matched (`(?P=name)`).
pub fn named_reference(name: &str) -> Pattern {
    ext(format!("(?P={name})"), ExtKind::Opaque)
}

/// Matches whatever group number `n` matched (`\n`).
pub fn numbered_reference(n: u32) -> Pattern {
    ext(format!("\\{n}"), ExtKind::Opaque)
}

/// Succeeds when `p` matches ahead, consuming nothing (`(?=...)`).
pub fn if_ahead(p: Pattern) -> Pattern {
    ext(format!("(?={p})"), ExtKind::Look)
}

/// Succeeds when `p` does not match ahead (`(?!...)`).
pub fn if_not_ahead(p: Pattern) -> Pattern {
    ext(format!("(?!{p})"), ExtKind::Look)
}

/// Succeeds when `p` matches ending here (`(?<=...)`).
pub fn if_behind(p: Pattern) -> Pattern {
    ext(format!("(?<={p})"), ExtKind::Look)
}

/// Succeeds when `p` does not match ending here (`(?<!...)`).
pub fn if_not_behind(p: Pattern) -> Pattern {
    ext(format!("(?<!{p})"), ExtKind::Look)
}

/// An inline comment (`(?#...)`); matches the empty string.
pub fn comment(text: &str) -> Pattern {
    ext(format!("(?#{text})"), ExtKind::Comment)
}

/// Matches `yes` when the referenced group participated in the match and
/// `no` otherwise (`(?(name)yes|no)`). The branches are grouped so
/// alternations inside them cannot bleed out.
pub fn if_group(name: impl fmt::Display, yes: Pattern, no: Pattern) -> Pattern {
    ext(format!("(?({name})(?:{yes})|(?:{no}))"), ExtKind::Opaque)
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::DIGIT;

    #[test]
    fn extension_rendering() {
        let d = || DIGIT.clone();
        assert_eq!(group(d(), true).as_str(), "(\\d)");
        assert_eq!(group(d(), false).as_str(), "(?:\\d)");
        assert_eq!(named_group("year", Pattern::exactly(d(), 4)).as_str(), "(?P<year>\\d{4})");
        assert_eq!(named_reference("year").as_str(), "(?P=year)");
        assert_eq!(numbered_reference(2).as_str(), "\\2");
        assert_eq!(if_ahead(d()).as_str(), "(?=\\d)");
        assert_eq!(if_not_ahead(d()).as_str(), "(?!\\d)");
        assert_eq!(if_behind(d()).as_str(), "(?<=\\d)");
        assert_eq!(if_not_behind(d()).as_str(), "(?<!\\d)");
        assert_eq!(comment("note").as_str(), "(?#note)");
        assert_eq!(
            if_group("tag", Pattern::single('a'), Pattern::single('b')).as_str(),
            "(?(tag)(?:a)|(?:b))"
        );
    }

    #[test]
    fn groups_quantify_without_an_extra_wrapper() {
        let g = group(Pattern::single('a'), true);
        assert_eq!(Pattern::exactly(g, 2).as_str(), "(a){2}");
    }

    #[test]
    fn extension_nodes_alternate_but_never_merge() {
        let merged = (if_ahead(Pattern::single('a')) | if_ahead(Pattern::single('b'))).unwrap();
        assert_eq!(merged.as_str(), "(?:(?=a))|(?:(?=b))");
        let opt = (Pattern::optional(group(Pattern::single('a'), true))
            | Pattern::optional(group(Pattern::single('b'), true)))
        .unwrap();
        assert_eq!(opt.as_str(), "(?:(a)?)|(?:(b)?)");
    }
}
