//! Reconciliation passes: properties plus a file-backed correction round.

use proptest::prelude::*;
use pubmeta::links::validate_links;
use pubmeta::reconcile::{filter_incomplete, merge_keywords, AuthorNormalizer, Substitution};
use pubmeta::store::{load_dataset, save_dataset};
use pubmeta::{CandidateMatch, Dataset, PublicationRecord};
use tempfile::TempDir;

fn author_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "YS Ong",
            "Yew Soon Ong",
            "Yew-Soon Ong",
            " and ",
            ";",
            ",",
            " ",
            "J Smith",
            "A",
            "and",
        ]),
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

/// Rule sets whose replacements are strictly shorter than their patterns.
fn shrinking_rules_strategy() -> impl Strategy<Value = Vec<Substitution>> {
    prop::collection::vec(
        ("[ab,]{1,3}", "[ab,x]{0,2}").prop_map(|(from, mut to)| {
            to.truncate(from.len() - 1);
            Substitution::new(from, to)
        }),
        1..4,
    )
}

fn record_strategy() -> impl Strategy<Value = PublicationRecord> {
    ("[A-Za-z ]{0,12}", prop::option::of("[a-z, ]{0,8}")).prop_map(|(title, keywords)| {
        PublicationRecord {
            keywords: keywords.unwrap_or_default(),
            ..PublicationRecord::titled(title)
        }
    })
}

proptest! {
    #[test]
    fn normalizing_twice_changes_nothing(author in author_strategy()) {
        let normalizer = AuthorNormalizer::default();
        let once = normalizer.normalize(&author).expect("default rules settle");
        prop_assert_eq!(normalizer.normalize(&once).expect("settles"), once.clone());
        prop_assert!(!once.contains("YS Ong"));
        prop_assert!(!once.contains(" and "));
        prop_assert!(!once.contains(';'));
    }

    #[test]
    fn custom_shrinking_rules_are_idempotent(
        rules in shrinking_rules_strategy(),
        author in "[ab, x]{0,24}",
    ) {
        // Rule sets that feed themselves are rejected up front; nothing to check.
        let Ok(normalizer) = AuthorNormalizer::new(rules) else {
            return Ok(());
        };
        let once = normalizer.normalize(&author).expect("shrinking rules always settle");
        prop_assert_eq!(normalizer.normalize(&once).expect("settles"), once);
    }

    #[test]
    fn filter_keeps_order_and_only_incomplete(records in prop::collection::vec(record_strategy(), 0..20)) {
        let dataset = Dataset::new(records);
        let incomplete = filter_incomplete(&dataset);

        prop_assert!(incomplete.iter().all(|r| r.keywords.is_empty()));
        let expected: Vec<_> = dataset.iter().filter(|r| r.keywords.is_empty()).cloned().collect();
        prop_assert_eq!(incomplete.records, expected);
    }

    #[test]
    fn merge_never_changes_membership(
        target in prop::collection::vec(record_strategy(), 0..15),
        corrections in prop::collection::vec(record_strategy(), 0..15),
    ) {
        let target = Dataset::new(target);
        let (merged, report) = merge_keywords(&Dataset::new(corrections.clone()), target.clone());

        let before: Vec<_> = target.iter().map(|r| r.title.clone()).collect();
        let after: Vec<_> = merged.iter().map(|r| r.title.clone()).collect();
        prop_assert_eq!(before, after);
        prop_assert_eq!(report.applied + report.unmatched.len(), corrections.len());
    }
}

fn paper(title: &str, author: &str, keywords: &str) -> PublicationRecord {
    PublicationRecord {
        author: author.into(),
        keywords: keywords.into(),
        year: "2021".into(),
        citation_count: Some(3),
        ..PublicationRecord::titled(title)
    }
}

#[test]
fn correction_round_through_files() {
    let dir = TempDir::new().expect("tempdir");
    let meta = dir.path().join("meta.json");
    let empty = dir.path().join("meta_empty.json");
    let merged_path = dir.path().join("meta2.json");

    let original = Dataset::new(vec![
        paper("Evolutionary Multitasking", "A Gupta and YS Ong", ""),
        paper("Memetic Computing", "Yew Soon Ong; X Chen", "memetic, optimization"),
        paper("Transfer Optimization", "L Feng", ""),
    ]);
    save_dataset(&meta, &original).expect("save");

    // Extract the incomplete records for manual editing.
    let incomplete = filter_incomplete(&load_dataset(&meta).expect("load"));
    save_dataset(&empty, &incomplete).expect("save side file");
    assert_eq!(incomplete.len(), 2);

    // Simulate the edit, then merge back.
    let mut edited = load_dataset(&empty).expect("load side file");
    edited.records[0].keywords = "multitasking".into();
    edited.records[1].keywords = "transfer learning".into();
    edited.push(paper("Not In Target", "", "x"));

    let (merged, report) = merge_keywords(&edited, load_dataset(&meta).expect("load"));
    assert_eq!(report.applied, 2);
    assert_eq!(report.unmatched, vec!["Not In Target".to_string()]);
    save_dataset(&merged_path, &merged).expect("save merged");

    let mut dataset = load_dataset(&merged_path).expect("load merged");
    assert!(filter_incomplete(&dataset).is_empty());

    let changed = AuthorNormalizer::default()
        .apply(&mut dataset)
        .expect("default rules settle");
    assert_eq!(changed, 2);
    assert_eq!(dataset.records[0].author, "A Gupta,Yew-Soon Ong");
    assert_eq!(dataset.records[1].author, "Yew-Soon Ong, X Chen");
    assert_eq!(dataset.records[2].author, "L Feng");
    assert_eq!(dataset.records[2].keywords, "transfer learning");
}

#[test]
fn legacy_positional_url_validates() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("meta_paper2.json");
    std::fs::write(
        &path,
        r#"[
            {"title": "Deep Nets", "abstract": "", "year": 2019, "citation_count": "",
             "author": "A", "url": ["deep nets", "http://arxiv.org/pdf/1"], "keywords": ""},
            {"title": "Shallow Nets", "url": ["Other Paper", "http://arxiv.org/pdf/2"]}
        ]"#,
    )
    .expect("write");

    let dataset = load_dataset(&path).expect("load");
    assert_eq!(dataset.records[0].year, "2019");
    assert_eq!(dataset.records[0].citation_count, None);
    assert_eq!(
        dataset.records[1].candidate_match,
        Some(CandidateMatch {
            title: "Other Paper".into(),
            link: "http://arxiv.org/pdf/2".into()
        })
    );

    let (validated, diagnostics) = validate_links(dataset);
    assert_eq!(validated.records[0].resolved_link, "http://arxiv.org/pdf/1");
    assert_eq!(validated.records[1].resolved_link, "");
    assert_eq!(diagnostics.len(), 1);
}
