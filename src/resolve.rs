//! Duplicate-name resolution.
//!
//! [`NameResolver`] turns a batch of proposed names into a conflict-free set
//! before the names are staged on a document. Resolution is a pure function
//! of its inputs: it keeps no state between calls, and feeding a resolved
//! batch back in returns it unchanged.
//!
//! # Example
//!
//! ```rust
//! use mscz_rename::NameResolver;
//!
//! let current = [Some("Violin"), Some("Violin"), Some("Cello")];
//! let resolved = NameResolver::new().resolve(&current, &[]);
//! assert_eq!(resolved, vec![(1, "Violin 2".to_string())]);
//! ```

use std::collections::{HashMap, HashSet};

/// Suffix number given to the second occurrence of a name.
pub const FIRST_SUFFIX: usize = 2;

/// Deterministic auto-numbering of duplicate names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver {
    _private: (),
}

impl NameResolver {
    /// Creates a resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `proposed` against the full current name sequence.
    ///
    /// `current[i]` is the current name of track `i`, or `None` if the track
    /// has no such field (those tracks are skipped). `proposed` holds
    /// `(index, name)` pairs; a later pair for the same index wins and
    /// indexes without a current field are ignored.
    ///
    /// Every track is visited in document order. Its candidate is the
    /// proposed name if there is one, otherwise its current name. A free
    /// candidate is kept as is; a taken one receives the smallest free
    /// suffix ` 2`, ` 3`, … so earlier tracks keep the unsuffixed name.
    ///
    /// Returns `(index, final_name)` in document order for every proposed
    /// track plus every unchanged track that had to be renumbered.
    pub fn resolve<S: AsRef<str>>(
        &self,
        current: &[Option<S>],
        proposed: &[(usize, String)],
    ) -> Vec<(usize, String)> {
        let proposals: HashMap<usize, &str> = proposed
            .iter()
            .filter(|(index, _)| matches!(current.get(*index), Some(Some(_))))
            .map(|(index, name)| (*index, name.as_str()))
            .collect();

        let mut assigned: HashSet<String> = HashSet::with_capacity(current.len());
        let mut resolved = Vec::new();

        for (index, name) in current.iter().enumerate() {
            let Some(name) = name else { continue };
            let proposal = proposals.get(&index).copied();
            let candidate = proposal.unwrap_or(name.as_ref());

            let final_name = if assigned.contains(candidate) {
                next_free(candidate, &assigned)
            } else {
                candidate.to_string()
            };

            if proposal.is_some() || final_name != name.as_ref() {
                resolved.push((index, final_name.clone()));
            }
            assigned.insert(final_name);
        }

        resolved
    }

    /// Numbers every repeated name from 1 in document order.
    ///
    /// `Violin, Violin, Cello` becomes `Violin 1, Violin 2, Cello`. Unique
    /// names are left alone. Returns `(index, new_name)` for every track
    /// whose name changes.
    pub fn number_duplicates<S: AsRef<str>>(&self, current: &[Option<S>]) -> Vec<(usize, String)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for name in current.iter().flatten() {
            *counts.entry(name.as_ref()).or_default() += 1;
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut numbered = Vec::new();
        for (index, name) in current.iter().enumerate() {
            let Some(name) = name else { continue };
            let name = name.as_ref();
            if counts.get(name).copied().unwrap_or(0) < 2 {
                continue;
            }
            let position = seen.entry(name).or_default();
            *position += 1;
            numbered.push((index, format!("{name} {position}")));
        }
        numbered
    }
}

/// Returns the trimmed name, or `None` if nothing is left after trimming.
pub fn validate_name(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Returns the first character of `name` that XML 1.0 cannot represent.
///
/// Escaping does not help for these: control characters other than tab,
/// line feed and carriage return, and the non-characters U+FFFE and U+FFFF.
pub fn invalid_character(name: &str) -> Option<char> {
    name.chars().find(|&c| !is_xml_char(c))
}

/// Whether `c` matches the XML 1.0 `Char` production.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{fffd}' | '\u{10000}'..='\u{10ffff}')
}

fn next_free(base: &str, assigned: &HashSet<String>) -> String {
    (FIRST_SUFFIX..)
        .map(|n| format!("{base} {n}"))
        .find(|candidate| !assigned.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&'static str]) -> Vec<Option<&'static str>> {
        list.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_unchanged_duplicates_are_suffixed() {
        let current = names(&["Violin", "Violin", "Cello"]);
        let proposed = vec![
            (0, "Violin".to_string()),
            (1, "Violin".to_string()),
            (2, "Cello".to_string()),
        ];
        let resolved = NameResolver::new().resolve(&current, &proposed);
        assert_eq!(
            resolved,
            vec![
                (0, "Violin".to_string()),
                (1, "Violin 2".to_string()),
                (2, "Cello".to_string()),
            ]
        );
    }

    #[test]
    fn test_smallest_free_suffix_is_used() {
        let current = names(&["Horn", "Horn 2", "Horn", "Horn"]);
        let resolved = NameResolver::new().resolve(&current, &[]);
        assert_eq!(
            resolved,
            vec![(2, "Horn 3".to_string()), (3, "Horn 4".to_string())]
        );
    }

    #[test]
    fn test_proposal_colliding_with_earlier_track() {
        let current = names(&["Flute", "Oboe"]);
        let proposed = vec![(1, "Flute".to_string())];
        let resolved = NameResolver::new().resolve(&current, &proposed);
        assert_eq!(resolved, vec![(1, "Flute 2".to_string())]);
    }

    #[test]
    fn test_earlier_proposal_pushes_later_unchanged_track() {
        let current = names(&["Oboe", "Flute"]);
        let proposed = vec![(0, "Flute".to_string())];
        let resolved = NameResolver::new().resolve(&current, &proposed);
        assert_eq!(
            resolved,
            vec![(0, "Flute".to_string()), (1, "Flute 2".to_string())]
        );
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let current = vec![Some("Tuba"), None, Some("Tuba")];
        let proposed = vec![(1, "Tuba".to_string())];
        let resolved = NameResolver::new().resolve(&current, &proposed);
        assert_eq!(resolved, vec![(2, "Tuba 2".to_string())]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let current = names(&["Violin", "Violin", "Cello"]);
        let resolver = NameResolver::new();
        let first = resolver.resolve(&current, &[(1, "Violin".to_string())]);

        let mut after = current.iter().map(|n| n.map(str::to_string)).collect::<Vec<_>>();
        for (index, name) in &first {
            after[*index] = Some(name.clone());
        }
        let second = resolver.resolve(&after, &first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_number_duplicates() {
        let current = names(&["Violin", "Cello", "Violin", "Violin"]);
        let numbered = NameResolver::new().number_duplicates(&current);
        assert_eq!(
            numbered,
            vec![
                (0, "Violin 1".to_string()),
                (2, "Violin 2".to_string()),
                (3, "Violin 3".to_string()),
            ]
        );
    }

    #[test]
    fn test_number_duplicates_without_duplicates() {
        let current = names(&["Violin", "Cello"]);
        assert!(NameResolver::new().number_duplicates(&current).is_empty());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Viola "), Some("Viola"));
        assert_eq!(validate_name(" \t\n"), None);
        assert_eq!(validate_name(""), None);
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(invalid_character("Violin\tI"), None);
        assert_eq!(invalid_character("Fl\u{fc}gelhorn \u{266d}"), None);
        assert_eq!(invalid_character("\u{1f3bb} Strings"), None);
        assert_eq!(invalid_character("Vln\u{1}I"), Some('\u{1}'));
        assert_eq!(invalid_character("A\u{b}B\u{0}"), Some('\u{b}'));
        assert_eq!(invalid_character("Oboe\u{ffff}"), Some('\u{ffff}'));
        assert_eq!(invalid_character("Oboe\u{fffe}"), Some('\u{fffe}'));
    }
}
