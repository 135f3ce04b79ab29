//! Property-based tests using proptest.
//!
//! These tests verify invariants of duplicate resolution and of name
//! splicing using randomly generated inputs.

mod common;

use std::collections::HashSet;

use mscz_rename::{
    ArchiveDocument, Error, FieldKind, NameResolver, OpenOptions, invalid_character, validate_name,
};
use proptest::prelude::*;

/// Strategy for track names drawn from a small pool so duplicates are common.
fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Violin".to_string()),
        Just("Violin 2".to_string()),
        Just("Viola".to_string()),
        Just("Cello".to_string()),
        "[A-Za-z]{1,6}( [0-9])?",
    ]
}

/// Current names with some fields missing, plus proposals for some of them.
fn batch_strategy() -> impl Strategy<Value = (Vec<Option<String>>, Vec<(usize, String)>)> {
    proptest::collection::vec(proptest::option::weighted(0.9, name_strategy()), 1..12).prop_flat_map(
        |current| {
            let len = current.len();
            let proposals = proptest::collection::vec((0..len, name_strategy()), 0..len + 1);
            (Just(current), proposals)
        },
    )
}

/// Applies resolved names on top of the current ones.
fn apply(current: &[Option<String>], resolved: &[(usize, String)]) -> Vec<Option<String>> {
    let mut after = current.to_vec();
    for (index, name) in resolved {
        after[*index] = Some(name.clone());
    }
    after
}

proptest! {
    /// Resolution never leaves two tracks with the same name.
    #[test]
    fn resolved_names_are_unique((current, proposed) in batch_strategy()) {
        let resolved = NameResolver::new().resolve(&current, &proposed);
        let after = apply(&current, &resolved);

        let mut seen = HashSet::new();
        for name in after.iter().flatten() {
            prop_assert!(seen.insert(name.clone()), "duplicate name {:?} in {:?}", name, after);
        }
    }

    /// The first track asking for a name gets it unsuffixed.
    #[test]
    fn first_occurrence_keeps_its_name((current, proposed) in batch_strategy()) {
        prop_assume!(current.iter().any(Option::is_some));
        let resolved = NameResolver::new().resolve(&current, &proposed);
        let after = apply(&current, &resolved);

        let first = current.iter().position(Option::is_some).unwrap_or(0);
        let wanted = proposed
            .iter()
            .rev()
            .find(|(index, _)| *index == first)
            .map(|(_, name)| name.clone())
            .or_else(|| current[first].clone());
        prop_assert_eq!(after[first].clone(), wanted);
    }

    /// Resolving an already resolved batch returns it unchanged.
    #[test]
    fn resolution_is_idempotent((current, proposed) in batch_strategy()) {
        let resolver = NameResolver::new();
        let resolved = resolver.resolve(&current, &proposed);
        let after = apply(&current, &resolved);
        prop_assert_eq!(resolver.resolve(&after, &resolved), resolved);
    }

    /// Only tracks without a missing field are ever returned.
    #[test]
    fn missing_fields_are_never_named((current, proposed) in batch_strategy()) {
        let resolved = NameResolver::new().resolve(&current, &proposed);
        for (index, _) in &resolved {
            prop_assert!(current[*index].is_some());
        }
    }

    /// Numbering duplicates also yields unique names.
    #[test]
    fn numbered_names_are_unique(current in proptest::collection::vec(
        proptest::option::of(prop_oneof![Just("Horn".to_string()), Just("Tuba".to_string())]),
        0..10,
    )) {
        let numbered = NameResolver::new().number_duplicates(&current);
        let after = apply(&current, &numbered);
        let names: Vec<_> = after.iter().flatten().collect();
        let unique: HashSet<_> = names.iter().collect();
        prop_assert_eq!(names.len(), unique.len());
    }

    /// Any non-blank name XML can hold survives a save and a reopen exactly
    /// as trimmed; any other name is refused before anything is staged.
    #[test]
    fn spliced_names_read_back(
        name in r"[\x00-\x0c\x0e-\x7f\u{e9}\u{df}\u{266d}\u{1d11e}\u{fffe}\u{ffff}]{1,24}"
    ) {
        prop_assume!(validate_name(&name).is_some());
        let expected = validate_name(&name).unwrap_or_default().to_string();

        let mut doc = ArchiveDocument::from_bytes(common::quartet(), OpenOptions::default()).unwrap();
        if let Some(bad) = invalid_character(&expected) {
            let err = doc.rename_track(1, FieldKind::Part, &name).unwrap_err();
            prop_assert!(
                matches!(err, Error::InvalidCharacter { character, .. } if character == bad),
                "unexpected error {:?}",
                err
            );
            prop_assert!(!doc.is_modified());
            return Ok(());
        }
        doc.rename_track(1, FieldKind::Part, &name).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.mscz");
        let _ = doc.save(&path, &mscz_rename::SaveOptions::default()).unwrap();

        let reopened = ArchiveDocument::open(&path).unwrap();
        let tracks = reopened.list_tracks();
        prop_assert_eq!(tracks[1].name(FieldKind::Part), Some(expected.as_str()));
        prop_assert_eq!(tracks[0].name(FieldKind::Part), Some("Violin"));
        prop_assert_eq!(tracks[1].name(FieldKind::Mixer), Some("Violin"));
    }
}
