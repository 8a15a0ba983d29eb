//! Repairs for tokenizer artefacts.
//!
//! The tokenizer splits `name: dep # comment` into the prerequisites `dep`,
//! `#` and `comment`. [`sanitize_deps`] drops that tail: the first entry
//! starting with `#` and everything after it. A `#` inside a word, as in
//! `some#dep`, is not treated as a comment marker.

use crate::record::Record;
use tracing::warn;

/// Return `deps` truncated before the first entry that starts with `#`.
///
/// The discarded entries are logged as a warning.
///
/// # Examples
///
/// ```rust
/// use monocle::sanitize::sanitize_deps;
///
/// let deps = vec!["c".to_owned(), "#".to_owned(), "note".to_owned()];
/// assert_eq!(sanitize_deps(deps), ["c"]);
/// ```
#[must_use]
pub fn sanitize_deps(mut deps: Vec<String>) -> Vec<String> {
    if let Some(cut) = deps.iter().position(|dep| dep.starts_with('#')) {
        let discarded = deps.split_off(cut);
        warn!(
            kept = ?deps,
            discarded = ?discarded,
            "dropping inline comment parsed as dependencies"
        );
    }
    deps
}

/// Apply [`sanitize_deps`] to every target record. Variables pass through
/// untouched.
#[must_use]
pub fn sanitize_records(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .map(|record| match record {
            Record::Target(mut target) => {
                target.deps = sanitize_deps(std::mem::take(&mut target.deps));
                Record::Target(target)
            }
            variable @ Record::Variable(_) => variable,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{TargetRecord, VariableRecord};
    use proptest::prelude::*;
    use rstest::rstest;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    #[rstest]
    #[case(&[], &[])]
    #[case(&["a", "b"], &["a", "b"])]
    #[case(&["c", "#", "other", "comment"], &["c"])]
    #[case(&["#only"], &[])]
    #[case(&["a", "#x", "b", "#y"], &["a"])]
    #[case(&["some#dep", "b"], &["some#dep", "b"])]
    fn truncates_at_first_comment_marker(#[case] input: &[&str], #[case] expected: &[&str]) {
        assert_eq!(sanitize_deps(owned(input)), owned(expected));
    }

    #[rstest]
    fn records_keep_variables_and_order() {
        let records = vec![
            Record::Target(TargetRecord::new("b", ["c", "#", "note"])),
            Record::Variable(VariableRecord {
                name: "CC".into(),
                value: "cc # compiler".into(),
                comment: Vec::new(),
            }),
        ];
        let cleaned = sanitize_records(records);
        assert_eq!(
            cleaned[0].as_target().map(|t| t.deps.clone()),
            Some(owned(&["c"]))
        );
        assert!(matches!(&cleaned[1], Record::Variable(v) if v.value == "cc # compiler"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn result_is_prefix_ending_before_a_marker(
            deps in prop::collection::vec("#?[a-z#]{0,4}", 0..12)
        ) {
            let cleaned = sanitize_deps(deps.clone());
            prop_assert!(cleaned.len() <= deps.len());
            prop_assert_eq!(&deps[..cleaned.len()], cleaned.as_slice());
            prop_assert!(cleaned.iter().all(|dep| !dep.starts_with('#')));
            if let Some(next) = deps.get(cleaned.len()) {
                prop_assert!(next.starts_with('#'));
            }
        }
    }
}
