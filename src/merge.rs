//! The combination search and the union dispatcher.
//!
//! [`union`] is the single entry point behind `|`. Character-level operands
//! take the set-union fast path in [`crate::chars`]; everything else is
//! flattened into alternation members and re-simplified:
//!
//! 1. Quantifiers sharing an inner pattern are sorted by occurrence rank and
//!    folded into interval hulls until no pair merges. The fold keeps a list
//!    of irreducible results, so three pairwise-unmergeable quantifiers
//!    terminate instead of recursing.
//! 2. Remaining member pairs are offered to [`merged_single`]; each pair the
//!    engine can collapse into one non-alternation node is recorded, and the
//!    recorded groups are substituted largest-first.
//!
//! [`find_class_merges`] is the subset search used by the character
//! canonicalizer: it walks sub-collections of fragments from largest to
//! smallest (lexicographic within a size) and records every group whose
//! combined character set is exactly a canonical class, skipping groups
//! already covered by an earlier find.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::pattern::{Kind, Pattern};
use crate::{Result, chars, quantify};

/// Index subsets of `0..n`, sizes `n-1` down to `1`, lexicographic within
/// each size.
pub(crate) fn combination_indices(n: usize) -> impl Iterator<Item = Vec<usize>> {
    (1..n).rev().flat_map(move |k| (0..n).combinations(k))
}

/// Groups of fragments whose combined character sets form canonical
/// classes. A group whose characters are already covered by an earlier,
/// larger find is skipped.
pub(crate) fn find_class_merges(fragments: &[Pattern]) -> Vec<(Vec<Pattern>, Pattern)> {
    let sets: Vec<BTreeSet<char>> = fragments.iter().map(chars::accepted_chars).collect();
    let mut found: Vec<(Vec<Pattern>, Pattern, BTreeSet<char>)> = Vec::new();
    for indices in combination_indices(fragments.len()) {
        let mut union: BTreeSet<char> = BTreeSet::new();
        for &i in &indices {
            union.extend(sets[i].iter().copied());
        }
        if found.iter().any(|(_, _, covered)| union.is_subset(covered)) {
            continue;
        }
        if let Some(class) = chars::match_class(&union) {
            let group = indices.iter().map(|&i| fragments[i].clone()).collect();
            found.push((group, class, union));
        }
    }
    found.into_iter().map(|(group, class, _)| (group, class)).collect()
}

/// Substitutes recorded merge groups into `fragments`, largest group first.
/// A group applies only while all of its members are still present.
pub(crate) fn reduce_fragments(
    mut fragments: Vec<Pattern>,
    mut mapping: Vec<(Vec<Pattern>, Pattern)>,
) -> Vec<Pattern> {
    mapping.sort_by_key(|(group, _)| std::cmp::Reverse(group.len()));
    for (group, merged) in mapping {
        if group.iter().all(|g| fragments.contains(g)) {
            fragments.retain(|f| !group.contains(f));
            fragments.push(merged);
        }
    }
    fragments
}

/// Builds an alternation node without merging: flattens nested
/// alternations, deduplicates, sorts by rendered form. A single surviving
/// member collapses to itself; an empty member set is a programmer error.
pub(crate) fn or_from(members: impl IntoIterator<Item = Pattern>) -> Pattern {
    let mut flat: Vec<Pattern> = Vec::new();
    for m in members {
        match m.kind() {
            Kind::Or(inner) => flat.extend(inner.iter().cloned()),
            _ => flat.push(m),
        }
    }
    flat.sort_by(|x, y| x.as_str().cmp(y.as_str()));
    flat.dedup();
    assert!(!flat.is_empty(), "alternation requires at least one member");
    match flat.len() {
        1 => flat.pop().expect("one member"),
        _ => Pattern::from_kind(Kind::Or(flat)),
    }
}

/// Union of two patterns, simplified.
pub(crate) fn union(a: &Pattern, b: &Pattern) -> Result<Pattern> {
    if a == b {
        return Ok(a.clone());
    }
    if chars::is_char_matching(a) && chars::is_char_matching(b) {
        return Ok(chars::char_union(a, b));
    }
    match (a.kind(), b.kind()) {
        (Kind::Or(_) | Kind::Occur { .. }, _) | (_, Kind::Or(_) | Kind::Occur { .. }) => {
            union_into_or(a, b)
        }
        _ => Ok(or_from([a.clone(), b.clone()])),
    }
}

fn union_into_or(a: &Pattern, b: &Pattern) -> Result<Pattern> {
    let mut members: Vec<Pattern> = Vec::new();
    for p in [a, b] {
        match p.kind() {
            Kind::Or(inner) => members.extend(inner.iter().cloned()),
            _ => members.push(p.clone()),
        }
    }
    members.sort_by(|x, y| x.as_str().cmp(y.as_str()));
    members.dedup();

    // All character-level: one set union does the whole job.
    if members.iter().all(chars::is_char_matching) {
        let mut set = BTreeSet::new();
        for m in &members {
            set.extend(chars::accepted_chars(m));
        }
        return Ok(chars::char_union_set(set));
    }

    members = fold_occurrences(members)?;
    let mapping = find_pair_merges(&members)?;
    members = reduce_fragments(members, mapping);
    Ok(or_from(members))
}

/// Merges greedy quantifiers sharing an inner pattern until no pair of
/// them still merges.
fn fold_occurrences(members: Vec<Pattern>) -> Result<Vec<Pattern>> {
    let mut out: Vec<Pattern> = Vec::new();
    let mut groups: Vec<(String, Vec<Pattern>)> = Vec::new();
    for m in members {
        if let Kind::Occur { inner, greedy: true, .. } = m.kind() {
            let key = inner.as_str().to_string();
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, group)) => group.push(m),
                None => groups.push((key, vec![m])),
            }
        } else {
            out.push(m);
        }
    }
    for (_, mut group) in groups {
        group.sort_by_key(|p| match p.kind() {
            Kind::Occur { span, .. } => quantify::rank(span),
            _ => unreachable!("grouped member is a quantifier"),
        });
        loop {
            let mut merged_any = false;
            'search: for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    if let Some(merged) = merged_single(&group[i], &group[j])? {
                        group[i] = merged;
                        group.remove(j);
                        merged_any = true;
                        break 'search;
                    }
                }
            }
            if !merged_any {
                break;
            }
        }
        out.extend(group);
    }
    Ok(out)
}

/// Member pairs the engine can collapse into one node.
fn find_pair_merges(members: &[Pattern]) -> Result<Vec<(Vec<Pattern>, Pattern)>> {
    let mut mapping = Vec::new();
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            if let Some(merged) = merged_single(&members[i], &members[j])? {
                mapping.push((vec![members[i].clone(), members[j].clone()], merged));
            }
        }
    }
    Ok(mapping)
}

/// Union of two patterns when it fits in a single non-alternation node.
fn merged_single(a: &Pattern, b: &Pattern) -> Result<Option<Pattern>> {
    if a == b {
        return Ok(Some(a.clone()));
    }
    let merged = match (a.kind(), b.kind()) {
        (Kind::Occur { .. }, _) | (_, Kind::Occur { .. }) => quantify::union_merged(a, b)?,
        (Kind::Char(_), Kind::Char(_))
            if chars::is_char_matching(a) && chars::is_char_matching(b) =>
        {
            Some(chars::char_union(a, b))
        }
        _ => None,
    };
    Ok(merged.filter(|m| !matches!(m.kind(), Kind::Or(_))))
}

#[cfg(test)]
mod unit {
    use super::*;
    use crate::{DIGIT, WORD};

    #[test]
    fn combinations_walk_largest_first_lexicographic() {
        let all: Vec<Vec<usize>> = combination_indices(3).collect();
        assert_eq!(all, vec![vec![0, 1], vec![0, 2], vec![1, 2], vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn class_merge_search_finds_the_digit_class() {
        let fragments = [Pattern::range('0', '4'), Pattern::range('3', '9'), Pattern::set(['a'])];
        let mapping = find_class_merges(&fragments);
        assert_eq!(
            mapping,
            vec![(vec![fragments[0].clone(), fragments[1].clone()], DIGIT.clone())]
        );
    }

    #[test]
    fn class_merge_search_skips_groups_covered_by_earlier_finds() {
        let fragments = [
            Pattern::range('0', '5'),
            Pattern::range('4', '9'),
            Pattern::range('3', '7'),
            WORD.clone(),
            Pattern::set(['\n']),
        ];
        let mapping = find_class_merges(&fragments);
        assert_eq!(
            mapping,
            vec![(
                vec![
                    fragments[0].clone(),
                    fragments[1].clone(),
                    fragments[2].clone(),
                    fragments[3].clone(),
                ],
                WORD.clone()
            )]
        );
    }

    #[test]
    fn class_merge_search_finds_nothing_in_unrelated_fragments() {
        let fragments = [Pattern::range('0', '4'), Pattern::set(['x', 'z'])];
        assert_eq!(find_class_merges(&fragments), vec![]);
    }

    #[test]
    fn reduce_substitutes_largest_groups_first() {
        let r04 = Pattern::range('0', '4');
        let r59 = Pattern::range('5', '9');
        let extra = Pattern::set(['\n']);
        let fragments = vec![r04.clone(), r59.clone(), extra.clone()];
        let mapping = vec![
            (vec![r04.clone()], Pattern::set(['0'])),
            (vec![r04.clone(), r59.clone()], DIGIT.clone()),
        ];
        let reduced = reduce_fragments(fragments, mapping);
        assert_eq!(reduced, vec![extra, DIGIT.clone()]);
    }

    #[test]
    fn or_from_flattens_dedups_and_sorts() {
        let inner = or_from([Pattern::single('b'), Pattern::single('c')]);
        let flat = or_from([inner, Pattern::single('a'), Pattern::single('b')]);
        assert_eq!(flat.as_str(), "(?:a)|(?:b)|(?:c)");
        assert_eq!(or_from([Pattern::single('a'), Pattern::single('a')]), Pattern::single('a'));
    }

    #[test]
    #[should_panic(expected = "at least one member")]
    fn or_from_rejects_an_empty_member_set() {
        let _ = or_from([]);
    }

    #[test]
    fn union_folds_quantifier_chains_without_recursing_forever() {
        let a = Pattern::single('a');
        let chain = (Pattern::between(a.clone(), 2, 3)
            | Pattern::between(a.clone(), 10, 11))
        .and_then(|p| p | Pattern::between(a.clone(), 20, 21))
        .unwrap();
        assert_eq!(chain.as_str(), "(?:a{10,11})|(?:a{2,3})|(?:a{20,21})");
    }

    #[test]
    fn union_bridges_gaps_once_intervals_touch() {
        let a = Pattern::single('a');
        let merged = (Pattern::between(a.clone(), 2, 3) | Pattern::between(a.clone(), 6, 7))
            .and_then(|p| p | Pattern::between(a.clone(), 4, 5))
            .unwrap();
        assert_eq!(merged.as_str(), "a{2,7}");
    }

    #[test]
    fn union_collapses_mixed_members_pairwise() {
        let merged = (Pattern::multi(Pattern::single('a'), false) | Pattern::literal("foo"))
            .and_then(|p| p | Pattern::at_least(Pattern::set(['a', 'b']), 1))
            .unwrap();
        assert_eq!(merged.as_str(), "(?:[ab]+)|(?:foo)");
    }

    #[test]
    fn union_of_alternations_re_simplifies_characters() {
        let left = or_from([Pattern::single('a'), Pattern::single('b')]);
        let right = or_from([Pattern::single('c'), Pattern::single('x')]);
        let merged = union(&left, &right).unwrap();
        // The leftover singleton run is listed in a set, not a bare char.
        let expected =
            Pattern::any_of([Pattern::range('a', 'c'), Pattern::set(['x'])]).unwrap();
        assert_eq!(merged, expected);
        assert_eq!(merged.as_str(), "(?:[a-c])|(?:[x])");
    }
}
