//! Preprint link resolution and validation.
//!
//! Resolution attaches the top title-search hit as a [`CandidateMatch`];
//! validation later promotes it to the record's link only when the titles
//! agree, since best-effort title search returns unrelated papers often.

use crate::checkpoint::Checkpointer;
use crate::error::Result;
use crate::record::{CandidateMatch, Dataset};
use crate::source::PreprintSearch;
use crate::throttle::Throttle;
use std::path::Path;
use tracing::{debug, info, warn};

/// Counters from a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub attempted: usize,
    pub found: usize,
    pub failed: usize,
}

/// Attaches preprint candidates to records that have no link yet.
///
/// Searches are paced by the injected [`Throttle`] and the growing dataset is
/// checkpointed to a separate output file.
pub struct LinkResolver<P> {
    search: P,
    throttle: Throttle,
    checkpoint_every: usize,
}

impl<P: PreprintSearch> LinkResolver<P> {
    pub fn new(search: P, throttle: Throttle, checkpoint_every: usize) -> Self {
        Self {
            search,
            throttle,
            checkpoint_every,
        }
    }

    /// Attach a candidate to every record lacking a link, snapshotting to `output`.
    pub async fn resolve(
        &mut self,
        mut dataset: Dataset,
        output: &Path,
    ) -> Result<(Dataset, ResolveSummary)> {
        let mut checkpoint = Checkpointer::new(output, self.checkpoint_every)?;
        let mut summary = ResolveSummary::default();

        for idx in 0..dataset.records.len() {
            let record = &dataset.records[idx];
            if record.title.is_empty() || !record.needs_link() {
                continue;
            }
            let title = record.title.clone();

            self.throttle.wait().await;
            summary.attempted += 1;

            match self.search.search_by_title(&title, 1).await {
                Ok(candidates) => match candidates.into_iter().next() {
                    Some(candidate) => {
                        debug!(title = %title, candidate = %candidate.title, "Candidate found");
                        summary.found += 1;
                        dataset.records[idx].candidate_match = Some(CandidateMatch {
                            title: candidate.title,
                            link: candidate.link,
                        });
                    }
                    None => debug!(title = %title, "No candidate"),
                },
                Err(e) if e.is_transient() => {
                    summary.failed += 1;
                    warn!(title = %title, error = %e, "Title search failed, skipping");
                }
                Err(e) => return Err(e),
            }

            if checkpoint.record(&dataset)? {
                println!("Searched links for {} papers", summary.attempted);
            }
        }

        checkpoint.finish(&dataset)?;
        info!(
            attempted = summary.attempted,
            found = summary.found,
            failed = summary.failed,
            "Link resolution complete"
        );
        Ok((dataset, summary))
    }
}

/// A candidate rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDiagnostic {
    pub title: String,
    pub candidate_title: String,
    pub candidate_link: String,
}

/// Collapse candidates into links: keep on case-insensitive title match,
/// otherwise clear the link and report a diagnostic.
pub fn validate_links(mut dataset: Dataset) -> (Dataset, Vec<LinkDiagnostic>) {
    let mut diagnostics = Vec::new();

    for record in &mut dataset.records {
        let Some(candidate) = record.candidate_match.take() else {
            continue;
        };

        if candidate.title.to_lowercase() == record.title.to_lowercase() {
            record.resolved_link = candidate.link;
        } else {
            warn!(
                title = %record.title,
                candidate_title = %candidate.title,
                link = %candidate.link,
                "Wrong url, discarding candidate"
            );
            record.resolved_link.clear();
            diagnostics.push(LinkDiagnostic {
                title: record.title.clone(),
                candidate_title: candidate.title,
                candidate_link: candidate.link,
            });
        }
    }

    (dataset, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PublicationRecord;

    fn with_candidate(title: &str, candidate_title: &str, link: &str) -> PublicationRecord {
        PublicationRecord {
            candidate_match: Some(CandidateMatch {
                title: candidate_title.into(),
                link: link.into(),
            }),
            ..PublicationRecord::titled(title)
        }
    }

    #[test]
    fn test_validation_keeps_matching_title() {
        let dataset = Dataset::new(vec![with_candidate("Foo", "foo", "http://x")]);
        let (out, diagnostics) = validate_links(dataset);
        assert!(diagnostics.is_empty());
        assert_eq!(out.records[0].resolved_link, "http://x");
        assert!(out.records[0].candidate_match.is_none());
    }

    #[test]
    fn test_validation_clears_mismatch() {
        let dataset = Dataset::new(vec![with_candidate("Foo", "bar", "http://x")]);
        let (out, diagnostics) = validate_links(dataset);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].candidate_title, "bar");
        assert_eq!(out.records[0].resolved_link, "");
        assert!(out.records[0].candidate_match.is_none());
    }

    #[test]
    fn test_validation_leaves_plain_records() {
        let mut linked = PublicationRecord::titled("Linked");
        linked.resolved_link = "https://doi.org/10.1/x".into();
        let dataset = Dataset::new(vec![linked.clone(), PublicationRecord::titled("Bare")]);

        let (out, diagnostics) = validate_links(dataset);
        assert!(diagnostics.is_empty());
        assert_eq!(out.records[0], linked);
        assert_eq!(out.records[1].resolved_link, "");
    }
}
