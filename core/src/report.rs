//! Deterministic markdown summary of the conflict index.
//!
//! The rendered text is byte-stable for equal input: components sort by id,
//! pull lists keep registration order, and nothing time- or run-dependent is
//! embedded. That makes "has the report changed" a string equality against
//! whatever was stored by the previous run.

use crate::index::ConflictIndex;
use crate::snapshot::RepoRef;

/// Renders the summary report.
///
/// One `| Recipe | Pull requests |` row per component with more than one
/// registered pull, followed, when illegal pulls exist, by a
/// `| Pull request | Recipes |` table listing them with their sorted
/// component sets.
pub fn render_report(index: &ConflictIndex, repo: &RepoRef) -> String {
    let mut out = String::new();

    out.push_str(
        "The following table lists all the pull requests modifying files \
         belonging to the same recipe.\n\
         It is regenerated on every run from the currently-open pull requests, \
         so a row disappears as soon as the conflict does.\n\n",
    );
    out.push_str("| Recipe | Pull requests |\n");
    out.push_str("| --- | --- |\n");
    for (component, pulls) in index.conflicts() {
        let links: Vec<String> = pulls
            .iter()
            .map(|&number| format!("[#{number}]({})", repo.pull_url(number)))
            .collect();
        out.push_str(&format!("| {component} | {} |\n", links.join(", ")));
    }

    if !index.illegal().is_empty() {
        out.push_str(
            "\n\nThe following pull requests modify several recipes, \
             so they were ignored:\n",
        );
        out.push_str("| Pull request | Recipes |\n");
        out.push_str("| --- | --- |\n");
        for pull in index.illegal() {
            let components: Vec<String> = pull
                .components
                .iter()
                .map(ToString::to_string)
                .collect();
            out.push_str(&format!("| #{} | {} |\n", pull.number, components.join(", ")));
        }
    }

    out
}

/// Change-detection predicate for the persisted report.
///
/// `stored` is the previously persisted text, `None` when nothing was stored
/// yet (which always needs a write).
pub fn report_needs_update(stored: Option<&str>, rendered: &str) -> bool {
    stored != Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifiedPull;
    use crate::component::ComponentId;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn classified(number: u64, components: &[(&str, &str)], illegal: bool) -> ClassifiedPull {
        ClassifiedPull {
            number,
            components: components
                .iter()
                .map(|(package, variant)| ComponentId::new(*package, *variant))
                .collect::<BTreeSet<_>>(),
            illegal,
        }
    }

    fn repo() -> RepoRef {
        RepoRef::new("acme", "monorepo")
    }

    #[test]
    fn conflict_rows_use_markdown_links_in_registration_order() {
        let index = ConflictIndex::build(vec![
            classified(2, &[("zlib", "1.2")], false),
            classified(1, &[("zlib", "1.2")], false),
        ]);

        let report = render_report(&index, &repo());
        assert!(report.contains(
            "| zlib/1.2 | [#2](https://github.com/acme/monorepo/pull/2), \
             [#1](https://github.com/acme/monorepo/pull/1) |"
        ));
    }

    #[test]
    fn single_pull_components_do_not_render() {
        let index = ConflictIndex::build(vec![
            classified(1, &[("zlib", "1.2")], false),
            classified(2, &[("boost", "all")], false),
        ]);

        let report = render_report(&index, &repo());
        assert!(!report.contains("zlib"));
        assert!(!report.contains("boost"));
    }

    #[test]
    fn illegal_table_renders_only_when_nonempty() {
        let legal_only = ConflictIndex::build(vec![classified(1, &[("zlib", "1.2")], false)]);
        assert!(!render_report(&legal_only, &repo()).contains("ignored"));

        let with_illegal = ConflictIndex::build(vec![classified(
            3,
            &[("libB", "1.0"), ("libA", "1.0")],
            true,
        )]);
        let report = render_report(&with_illegal, &repo());
        assert!(report.contains("| Pull request | Recipes |"));
        // Component set renders sorted regardless of touch order.
        assert!(report.contains("| #3 | libA/1.0, libB/1.0 |"));
    }

    #[test]
    fn rendering_is_byte_stable() {
        let index = ConflictIndex::build(vec![
            classified(1, &[("zlib", "1.2")], false),
            classified(2, &[("zlib", "1.2")], false),
            classified(3, &[("libA", "1.0"), ("libB", "1.0")], true),
        ]);

        assert_eq!(render_report(&index, &repo()), render_report(&index, &repo()));
    }

    #[test]
    fn needs_update_is_an_equality_check() {
        assert!(report_needs_update(None, "report"));
        assert!(report_needs_update(Some("old"), "new"));
        assert!(!report_needs_update(Some("same"), "same"));
    }
}
