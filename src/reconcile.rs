//! Corrective passes over a dataset: filter, merge by title, normalize authors.

use crate::error::{PubmetaError, Result};
use crate::record::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Records whose keywords are missing or empty, in their original order.
pub fn filter_incomplete(dataset: &Dataset) -> Dataset {
    dataset
        .iter()
        .filter(|r| r.needs_keywords())
        .cloned()
        .collect::<Vec<_>>()
        .into()
}

/// Outcome of [`merge_keywords`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Corrections that found a target record
    pub applied: usize,
    /// Titles of corrections with no matching target record
    pub unmatched: Vec<String>,
    /// Titles that occur more than once in the target
    pub duplicate_titles: Vec<String>,
}

/// Copy `keywords` from each correction onto the first target record with an
/// equal title.
///
/// Target order and membership are preserved; corrections never add records.
/// Duplicate target titles are reported because only the first one is updated.
pub fn merge_keywords(corrections: &Dataset, mut target: Dataset) -> (Dataset, MergeReport) {
    let mut report = MergeReport {
        duplicate_titles: duplicate_titles(&target),
        ..Default::default()
    };
    for title in &report.duplicate_titles {
        warn!(title = %title, "Duplicate title in target, first match wins");
    }

    for correction in corrections.iter() {
        match target.records.iter_mut().find(|r| r.title == correction.title) {
            Some(record) => {
                record.keywords = correction.keywords.clone();
                report.applied += 1;
            }
            None => {
                debug!(title = %correction.title, "Correction has no target record");
                report.unmatched.push(correction.title.clone());
            }
        }
    }

    (target, report)
}

fn duplicate_titles(dataset: &Dataset) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for record in dataset.iter() {
        if !seen.insert(record.title.as_str()) && reported.insert(record.title.as_str()) {
            duplicates.push(record.title.clone());
        }
    }
    duplicates
}

/// A literal substitution applied to author strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

impl Substitution {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Built-in rules: canonical `,` separator, then known name variants.
pub const DEFAULT_AUTHOR_RULES: &[(&str, &str)] = &[
    (";", ","),
    (" and ", ","),
    ("YS Ong", "Yew-Soon Ong"),
    ("Yew Soon Ong", "Yew-Soon Ong"),
];

/// Passes allowed beyond the input length when driving rules to a fixpoint.
const EXTRA_PASSES: usize = 8;

/// Ordered substitution rules for author fields.
///
/// Rules are rejected if any replacement contains any pattern. [`normalize`]
/// only ever returns a fixpoint of the rule list, so applying the normalizer
/// to its own output is a no-op.
///
/// [`normalize`]: AuthorNormalizer::normalize
#[derive(Debug, Clone)]
pub struct AuthorNormalizer {
    rules: Vec<Substitution>,
}

impl Default for AuthorNormalizer {
    fn default() -> Self {
        Self {
            rules: DEFAULT_AUTHOR_RULES
                .iter()
                .map(|(from, to)| Substitution::new(*from, *to))
                .collect(),
        }
    }
}

impl AuthorNormalizer {
    pub fn new(rules: Vec<Substitution>) -> Result<Self> {
        for rule in &rules {
            if rule.from.is_empty() {
                return Err(PubmetaError::Validation(
                    "substitution pattern must not be empty".to_string(),
                ));
            }
        }
        for rule in &rules {
            if let Some(clash) = rules.iter().find(|other| rule.to.contains(&other.from)) {
                return Err(PubmetaError::Validation(format!(
                    "replacement {:?} contains pattern {:?}",
                    rule.to, clash.from
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Load rules from a JSON file of `[from, to]` pairs.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let pairs: Vec<(String, String)> = serde_json::from_str(&content)?;
        Self::new(
            pairs
                .into_iter()
                .map(|(from, to)| Substitution::new(from, to))
                .collect(),
        )
    }

    pub fn rules(&self) -> &[Substitution] {
        &self.rules
    }

    /// Apply every rule in order, repeating until the text stops changing.
    ///
    /// At most `author.len() + 8` passes are made, enough for any rule set
    /// that only shortens text. A rule set that keeps rewriting past that is
    /// reported as a [`PubmetaError::Validation`] error.
    pub fn normalize(&self, author: &str) -> Result<String> {
        let mut current = author.to_string();
        for _ in 0..author.len() + EXTRA_PASSES {
            let next = self.apply_once(&current);
            if next == current {
                return Ok(current);
            }
            current = next;
        }
        warn!(author, "Author normalization did not settle");
        Err(PubmetaError::Validation(format!(
            "author rules did not settle on {:?}",
            author
        )))
    }

    fn apply_once(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
    }

    /// Normalize every non-empty author field. Returns how many records changed.
    pub fn apply(&self, dataset: &mut Dataset) -> Result<usize> {
        let mut changed = 0;
        for record in &mut dataset.records {
            if record.author.is_empty() {
                continue;
            }
            let normalized = self.normalize(&record.author)?;
            if normalized != record.author {
                record.author = normalized;
                changed += 1;
            }
        }
        Ok(changed)
    }
}
